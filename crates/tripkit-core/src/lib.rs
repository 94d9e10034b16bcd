// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod completion;
pub mod error;
pub mod geocode;
pub mod http;
pub mod planner;
pub mod present;
pub mod settings;

pub use completion::{CompletionService, OpenAiClient};
pub use error::ServiceError;
pub use geocode::{GeocodeResult, Geocoder, NominatimGeocoder};
pub use planner::{PlanFailure, TripPlan, TripPlanner};
pub use present::{DestinationCard, MapLayers, MapLine, MapPoint, ViewState};
pub use settings::{ApiKey, Settings, SettingsError};

pub use tripkit_extract as extract;
