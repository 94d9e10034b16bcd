// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::completion::CompletionService;
use crate::error::ServiceError;
use crate::geocode::{GeocodeResult, Geocoder};
use crate::present::{to_cards, to_map_layers, DestinationCard, MapLayers, ViewState};
use crate::settings::MapSettings;
use log::{error, info, warn};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tripkit_extract::{
    build_prompt, parse_response, DestinationRecord, DestinationRequest, ExtractionFailure,
    SkippedDestination,
};

/// Why a plan came back empty.
#[derive(Error, Debug)]
pub enum PlanFailure {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),
}

/// Everything one render needs. Built fresh for each request.
#[derive(Debug, Serialize)]
pub struct TripPlan {
    pub title: String,
    pub destinations: Vec<DestinationRecord>,
    pub skipped: Vec<SkippedDestination>,
    pub origin: GeocodeResult,
    pub cards: Vec<DestinationCard>,
    pub layers: MapLayers,
    pub view: ViewState,
    #[serde(serialize_with = "serialize_failure")]
    pub failure: Option<PlanFailure>,
}

impl TripPlan {
    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }
}

fn serialize_failure<S: Serializer>(
    failure: &Option<PlanFailure>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match failure {
        Some(f) => serializer.serialize_some(&f.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Runs prompt → completion → extraction → geocoding → presentation for one request.
pub struct TripPlanner<C, G> {
    completion: C,
    geocoder: G,
    map: MapSettings,
}

impl<C: CompletionService, G: Geocoder> TripPlanner<C, G> {
    pub fn new(completion: C, geocoder: G, map: MapSettings) -> Self {
        Self {
            completion,
            geocoder,
            map,
        }
    }

    /// Never fails: service and extraction errors end up in `TripPlan::failure`
    /// with an empty destination list.
    pub fn plan(&self, request: &DestinationRequest) -> TripPlan {
        info!(
            "Planning trip — origin={} budget={} age={:?}",
            request.origin, request.budget, request.age
        );

        let (destinations, skipped, failure) = match self.fetch_destinations(request) {
            Ok((destinations, skipped)) => (destinations, skipped, None),
            Err(failure) => (Vec::new(), Vec::new(), Some(failure)),
        };

        // Independent of the completion result: the map still centres on the origin.
        let origin = self.geocoder.resolve(&request.origin);

        let layers = to_map_layers(&destinations, &origin);
        info!(
            "Trip planned — destinations={} skipped={} lines={} origin_resolved={}",
            destinations.len(),
            skipped.len(),
            layers.lines.len(),
            origin.is_resolved()
        );

        TripPlan {
            title: request.title(),
            cards: to_cards(&destinations),
            view: ViewState::for_origin(&origin, &self.map),
            destinations,
            skipped,
            origin,
            layers,
            failure,
        }
    }

    fn fetch_destinations(
        &self,
        request: &DestinationRequest,
    ) -> Result<(Vec<DestinationRecord>, Vec<SkippedDestination>), PlanFailure> {
        let prompt = build_prompt(request);
        let raw = self.completion.complete(&prompt).map_err(|e| {
            error!("Completion request failed — origin={} error={}", request.origin, e);
            e
        })?;

        let extraction = parse_response(&raw).map_err(|e| {
            warn!("Could not extract destinations — error={} raw={:?}", e, raw);
            e
        })?;
        Ok((extraction.destinations, extraction.skipped))
    }
}
