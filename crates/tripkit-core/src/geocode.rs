// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::error::ServiceError;
use crate::settings::GeocodingSettings;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tripkit_extract::Coordinates;

const SERVICE: &str = "geocoding service";

/// Where the trip starts, if the geocoder could place it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum GeocodeResult {
    Resolved(Coordinates),
    Unresolved,
}

impl GeocodeResult {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            GeocodeResult::Resolved(c) => Some(*c),
            GeocodeResult::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, GeocodeResult::Resolved(_))
    }
}

pub trait Geocoder {
    /// One lookup. `Ok(None)` means the service had no match.
    fn lookup(&self, place: &str) -> Result<Option<Coordinates>, ServiceError>;

    /// Like `lookup`, but never fails: misses and service errors become `Unresolved`.
    fn resolve(&self, place: &str) -> GeocodeResult {
        let place = place.trim();
        if place.is_empty() {
            return GeocodeResult::Unresolved;
        }
        match self.lookup(place) {
            Ok(Some(coordinates)) => {
                debug!(
                    "Geocoded origin — place={} lon={} lat={}",
                    place, coordinates.longitude, coordinates.latitude
                );
                GeocodeResult::Resolved(coordinates)
            }
            Ok(None) => {
                info!("Origin not found by geocoder — place={}", place);
                GeocodeResult::Unresolved
            }
            Err(e) => {
                warn!("Geocoding failed; origin left unresolved — place={} error={}", place, e);
                GeocodeResult::Unresolved
            }
        }
    }
}

impl<T: Geocoder + ?Sized> Geocoder for &T {
    fn lookup(&self, place: &str) -> Result<Option<Coordinates>, ServiceError> {
        (**self).lookup(place)
    }
}

impl<T: Geocoder + ?Sized> Geocoder for Box<T> {
    fn lookup(&self, place: &str) -> Result<Option<Coordinates>, ServiceError> {
        (**self).lookup(place)
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// Free-text search against a Nominatim instance.
pub struct NominatimGeocoder {
    http: Client,
    search_url: Url,
}

impl NominatimGeocoder {
    pub fn new(settings: &GeocodingSettings) -> Result<Self> {
        let http = crate::http::build_client(settings.timeout(), &settings.user_agent)?;
        Self::with_client(http, settings)
    }

    pub fn with_client(http: Client, settings: &GeocodingSettings) -> Result<Self> {
        let search_url = search_endpoint(&settings.base_url)?;
        Ok(Self { http, search_url })
    }

    fn search_url_for(&self, place: &str) -> Url {
        let mut url = self.search_url.clone();
        url.query_pairs_mut()
            .append_pair("q", place)
            .append_pair("format", "jsonv2")
            .append_pair("limit", "1");
        url
    }
}

impl Geocoder for NominatimGeocoder {
    fn lookup(&self, place: &str) -> Result<Option<Coordinates>, ServiceError> {
        let url = self.search_url_for(place);
        debug!("Geocoding — url={}", url);

        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| ServiceError::transport(SERVICE, e))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ServiceError::transport(SERVICE, e))?;
        if !status.is_success() {
            return Err(ServiceError::from_status(SERVICE, status.as_u16(), &body));
        }
        first_match(&body)
    }
}

fn search_endpoint(base_url: &str) -> Result<Url> {
    let url = format!("{}/search", base_url.trim_end_matches('/'));
    Url::parse(&url).with_context(|| format!("invalid geocoding base URL: {:?}", base_url))
}

/// Reads the best match from a Nominatim `jsonv2` search body. Unparsable or
/// out-of-range coordinates count as no match.
fn first_match(body: &str) -> Result<Option<Coordinates>, ServiceError> {
    let places: Vec<NominatimPlace> =
        serde_json::from_str(body).map_err(|e| ServiceError::InvalidResponse {
            service: SERVICE,
            message: e.to_string(),
        })?;
    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let coordinates = match (place.lon.trim().parse::<f64>(), place.lat.trim().parse::<f64>()) {
        (Ok(lon), Ok(lat)) => Coordinates::new(lon, lat),
        _ => None,
    };
    if coordinates.is_none() {
        warn!(
            "Discarding geocoder match with bad coordinates — name={:?} lon={} lat={}",
            place.display_name, place.lon, place.lat
        );
    }
    Ok(coordinates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_first_match() {
        let body = r#"[{"place_id":1,"lat":"52.3730796","lon":"4.8924534","display_name":"Amsterdam, Noord-Holland, Nederland"}]"#;
        assert_eq!(
            first_match(body).unwrap(),
            Some(Coordinates {
                longitude: 4.8924534,
                latitude: 52.3730796
            })
        );
        assert_eq!(first_match("[]").unwrap(), None);
    }

    #[test]
    fn test_first_match_rejects_bad_coordinates() {
        assert_eq!(
            first_match(r#"[{"lat":"north","lon":"4.89"}]"#).unwrap(),
            None
        );
        assert_eq!(
            first_match(r#"[{"lat":"123.0","lon":"4.89"}]"#).unwrap(),
            None
        );
        assert!(matches!(
            first_match(r#"{"error":"Unable to geocode"}"#),
            Err(ServiceError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_search_url_encodes_place() {
        let geocoder =
            NominatimGeocoder::with_client(Client::new(), &GeocodingSettings::default()).unwrap();
        let url = geocoder.search_url_for("Den Haag & Scheveningen");
        assert_eq!(url.path(), "/search");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "Den Haag & Scheveningen".to_string()),
                ("format".to_string(), "jsonv2".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }

    struct Scripted {
        reply: fn() -> Result<Option<Coordinates>, ServiceError>,
        calls: Cell<usize>,
    }

    impl Geocoder for Scripted {
        fn lookup(&self, _place: &str) -> Result<Option<Coordinates>, ServiceError> {
            self.calls.set(self.calls.get() + 1);
            (self.reply)()
        }
    }

    #[test]
    fn test_resolve_folds_failures() {
        let failing = Scripted {
            reply: || Err(ServiceError::Timeout { service: SERVICE }),
            calls: Cell::new(0),
        };
        assert_eq!(failing.resolve("Amsterdam"), GeocodeResult::Unresolved);

        let missing = Scripted {
            reply: || Ok(None),
            calls: Cell::new(0),
        };
        assert_eq!(missing.resolve("Atlantis"), GeocodeResult::Unresolved);

        let found = Scripted {
            reply: || Ok(Coordinates::new(4.9, 52.37)),
            calls: Cell::new(0),
        };
        assert!(found.resolve("Amsterdam").is_resolved());
    }

    #[test]
    fn test_blank_place_skips_lookup() {
        let geocoder = Scripted {
            reply: || Ok(Coordinates::new(0.0, 0.0)),
            calls: Cell::new(0),
        };
        assert_eq!(geocoder.resolve("   "), GeocodeResult::Unresolved);
        assert_eq!(geocoder.calls.get(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let resolved = GeocodeResult::Resolved(Coordinates {
            longitude: 4.9,
            latitude: 52.4,
        });
        assert_eq!(
            serde_json::to_value(resolved).unwrap(),
            serde_json::json!({"status": "resolved", "longitude": 4.9, "latitude": 52.4})
        );
        assert_eq!(
            serde_json::to_value(GeocodeResult::Unresolved).unwrap(),
            serde_json::json!({"status": "unresolved"})
        );
    }
}
