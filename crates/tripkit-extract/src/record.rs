// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Travel-time label used when the model gives none.
pub const UNKNOWN_TRAVEL_TIME: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    /// Returns `None` unless both values are finite and inside the WGS84 range.
    pub fn new(longitude: f64, latitude: f64) -> Option<Self> {
        let valid = longitude.is_finite()
            && latitude.is_finite()
            && (-180.0..=180.0).contains(&longitude)
            && (-90.0..=90.0).contains(&latitude);
        valid.then_some(Self {
            longitude,
            latitude,
        })
    }

    /// `[longitude, latitude]`, the order map layers and GeoJSON expect.
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// One recommended place, as extracted from a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationRecord {
    pub name: String,
    pub coordinates: Coordinates,
    pub things_to_do: Vec<String>,
    pub travel_time: String,
}

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum SkipReason {
    #[error("entry is not a JSON object")]
    NotAnObject,
    #[error("missing or empty name")]
    MissingName,
    #[error("missing {0}")]
    MissingCoordinate(&'static str),
    #[error("{field} is not a number: {value}")]
    InvalidCoordinate { field: &'static str, value: String },
    #[error("{field} {value} is outside the valid range")]
    OutOfRange { field: &'static str, value: f64 },
}

/// A destination entry dropped during extraction, kept so callers can report it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedDestination {
    /// Position in the reply's `destinations` array.
    pub index: usize,
    pub name: Option<String>,
    pub reason: SkipReason,
}
