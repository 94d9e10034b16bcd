// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Turns a completion reply into destination records.
//!
//! Accepted reply shapes:
//! - `longitude`/`latitude` directly on each destination, or nested under a
//!   `coordinates` object (the flat fields win when both are present);
//! - coordinates as JSON numbers or numeric strings;
//! - `things_to_do` as one string or an array of strings, split on commas;
//! - `travel_time` as a string or a number, `"unknown"` when absent;
//! - the whole reply optionally wrapped in a Markdown code fence, with or
//!   without a language tag, on one line or several.
//!
//! A bad destination is skipped and reported; it never discards its siblings.

use crate::record::{Coordinates, DestinationRecord, SkipReason, SkippedDestination, UNKNOWN_TRAVEL_TIME};
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

const LONGITUDE: &str = "longitude";
const LATITUDE: &str = "latitude";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionFailure {
    #[error("reply is not valid JSON: {0}")]
    MalformedJson(String),
    #[error("reply has no \"destinations\" array")]
    MissingDestinationsKey,
    #[error("reply contained no usable destinations ({} skipped)", .skipped.len())]
    NoValidDestinations { skipped: Vec<SkippedDestination> },
}

/// Records extracted from one reply, in reply order, plus the entries that were dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Extraction {
    pub destinations: Vec<DestinationRecord>,
    pub skipped: Vec<SkippedDestination>,
}

pub type ExtractionOutcome = Result<Extraction, ExtractionFailure>;

pub fn parse_response(raw: &str) -> ExtractionOutcome {
    let body = strip_code_fence(raw);
    let document: Value = serde_json::from_str(body).map_err(|e| {
        debug!("Completion reply is not JSON — error={}", e);
        ExtractionFailure::MalformedJson(e.to_string())
    })?;

    let Some(entries) = document.get("destinations").and_then(Value::as_array) else {
        debug!("Completion reply lacks a destinations array");
        return Err(ExtractionFailure::MissingDestinationsKey);
    };

    let mut extraction = Extraction::default();
    for (index, entry) in entries.iter().enumerate() {
        match parse_destination(entry) {
            Ok(record) => extraction.destinations.push(record),
            Err(reason) => {
                let name = entry
                    .get("name")
                    .and_then(Value::as_str)
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty());
                warn!(
                    "Skipping destination — index={} name={:?} reason={}",
                    index, name, reason
                );
                extraction.skipped.push(SkippedDestination {
                    index,
                    name,
                    reason,
                });
            }
        }
    }

    if extraction.destinations.is_empty() && !extraction.skipped.is_empty() {
        return Err(ExtractionFailure::NoValidDestinations {
            skipped: extraction.skipped,
        });
    }

    debug!(
        "Parsed completion reply — destinations={} skipped={}",
        extraction.destinations.len(),
        extraction.skipped.len()
    );
    Ok(extraction)
}

fn parse_destination(entry: &Value) -> Result<DestinationRecord, SkipReason> {
    let entry = entry.as_object().ok_or(SkipReason::NotAnObject)?;

    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SkipReason::MissingName)?
        .to_string();

    let longitude = coordinate(entry, LONGITUDE, 180.0)?;
    let latitude = coordinate(entry, LATITUDE, 90.0)?;

    Ok(DestinationRecord {
        name,
        coordinates: Coordinates {
            longitude,
            latitude,
        },
        things_to_do: activities(entry.get("things_to_do")),
        travel_time: travel_time(entry.get("travel_time")),
    })
}

fn coordinate(entry: &Map<String, Value>, field: &'static str, limit: f64) -> Result<f64, SkipReason> {
    let value = entry
        .get(field)
        .filter(|v| !v.is_null())
        .or_else(|| {
            entry
                .get("coordinates")
                .and_then(|c| c.get(field))
                .filter(|v| !v.is_null())
        })
        .ok_or(SkipReason::MissingCoordinate(field))?;

    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
    .ok_or_else(|| SkipReason::InvalidCoordinate {
        field,
        value: value.to_string(),
    })?;

    if number.abs() > limit {
        return Err(SkipReason::OutOfRange {
            field,
            value: number,
        });
    }
    Ok(number)
}

fn activities(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => split_activities(s).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.as_str()),
                other => {
                    warn!("Ignoring non-text activity — value={}", other);
                    None
                }
            })
            .flat_map(split_activities)
            .collect(),
        Some(other) => {
            warn!("Ignoring things_to_do of unexpected shape — value={}", other);
            Vec::new()
        }
    }
}

fn split_activities(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

fn travel_time(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNKNOWN_TRAVEL_TIME.to_string(),
    }
}

/// Unwraps a reply the model put inside a Markdown code fence. The language
/// tag is the run of letters and digits right after the opening fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric())
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_coordinates() {
        let raw = r#"{"destinations":[{"name":"Haarlem","longitude":4.6462,"latitude":52.3874,"things_to_do":["Teylers Museum"],"travel_time":"20 min"}]}"#;
        let ex = parse_response(raw).unwrap();
        assert_eq!(ex.destinations.len(), 1);
        let d = &ex.destinations[0];
        assert_eq!(d.name, "Haarlem");
        assert_eq!(d.coordinates.longitude, 4.6462);
        assert_eq!(d.coordinates.latitude, 52.3874);
        assert_eq!(d.travel_time, "20 min");
    }

    #[test]
    fn test_nested_coordinates_and_string_numbers() {
        let raw = r#"{"destinations":[{"name":"Utrecht","coordinates":{"longitude":"5.1214","latitude":" 52.0907 "}}]}"#;
        let ex = parse_response(raw).unwrap();
        assert_eq!(
            ex.destinations[0].coordinates,
            Coordinates {
                longitude: 5.1214,
                latitude: 52.0907
            }
        );
        assert!(ex.destinations[0].things_to_do.is_empty());
        assert_eq!(ex.destinations[0].travel_time, UNKNOWN_TRAVEL_TIME);
    }

    #[test]
    fn test_flat_fields_win_over_nested() {
        let raw = r#"{"destinations":[{"name":"Leiden","longitude":4.49,"latitude":52.16,"coordinates":{"longitude":0,"latitude":0}}]}"#;
        let ex = parse_response(raw).unwrap();
        assert_eq!(ex.destinations[0].coordinates.longitude, 4.49);
    }

    #[test]
    fn test_numeric_travel_time() {
        let raw = r#"{"destinations":[{"name":"Zandvoort","longitude":4.53,"latitude":52.37,"travel_time":35}]}"#;
        assert_eq!(parse_response(raw).unwrap().destinations[0].travel_time, "35");
    }

    #[test]
    fn test_blank_travel_time_is_unknown() {
        let raw = r#"{"destinations":[{"name":"Zandvoort","longitude":4.53,"latitude":52.37,"travel_time":"  "}]}"#;
        assert_eq!(
            parse_response(raw).unwrap().destinations[0].travel_time,
            UNKNOWN_TRAVEL_TIME
        );
    }

    #[test]
    fn test_activity_shapes() {
        assert_eq!(
            activities(Some(&serde_json::json!(["Zoo, Beach", 3, "  ", "Park"]))),
            vec!["Zoo", "Beach", "Park"]
        );
        assert!(activities(Some(&serde_json::json!({"a": 1}))).is_empty());
        assert!(activities(None).is_empty());
    }

    #[test]
    fn test_rejects_bad_coordinates() {
        let cases = [
            (r#"{"name":"A","latitude":1}"#, SkipReason::MissingCoordinate(LONGITUDE)),
            (r#"{"name":"A","longitude":1,"latitude":null}"#, SkipReason::MissingCoordinate(LATITUDE)),
            (
                r#"{"name":"A","longitude":"east","latitude":1}"#,
                SkipReason::InvalidCoordinate {
                    field: LONGITUDE,
                    value: "\"east\"".to_string(),
                },
            ),
            (
                r#"{"name":"A","longitude":"NaN","latitude":1}"#,
                SkipReason::InvalidCoordinate {
                    field: LONGITUDE,
                    value: "\"NaN\"".to_string(),
                },
            ),
            (
                r#"{"name":"A","longitude":1,"latitude":95.5}"#,
                SkipReason::OutOfRange {
                    field: LATITUDE,
                    value: 95.5,
                },
            ),
            (r#"{"longitude":1,"latitude":1}"#, SkipReason::MissingName),
            (r#"{"name":"  ","longitude":1,"latitude":1}"#, SkipReason::MissingName),
            (r#""Haarlem""#, SkipReason::NotAnObject),
        ];
        for (entry, expected) in cases {
            let value: Value = serde_json::from_str(entry).unwrap();
            assert_eq!(parse_destination(&value), Err(expected), "entry {}", entry);
        }
    }

    #[test]
    fn test_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fence("  {} "), "{}");
        assert_eq!(strip_code_fence("```json {\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```{\"a\":1}```"), "{\"a\":1}");
    }

    #[test]
    fn test_single_line_fence_with_tag() {
        let raw = r#"```json {"destinations":[{"name":"Haarlem","longitude":4.6462,"latitude":52.3874}]}```"#;
        assert_eq!(parse_response(raw).unwrap().destinations[0].name, "Haarlem");
    }

    #[test]
    fn test_overflowing_coordinate_skips_only_that_entry() {
        let raw = r#"{"destinations":[
            {"name":"Haarlem","longitude":4.6462,"latitude":52.3874},
            {"name":"Nowhere","longitude":1e400,"latitude":52.0}
        ]}"#;
        let ex = parse_response(raw).unwrap();
        assert_eq!(ex.destinations.len(), 1);
        assert_eq!(ex.destinations[0].name, "Haarlem");
        assert_eq!(ex.skipped.len(), 1);
        assert_eq!(ex.skipped[0].index, 1);
        assert_eq!(ex.skipped[0].name.as_deref(), Some("Nowhere"));
        assert_eq!(
            ex.skipped[0].reason,
            SkipReason::InvalidCoordinate {
                field: LONGITUDE,
                value: "1e400".to_string(),
            }
        );
    }

    #[test]
    fn test_top_level_shapes() {
        assert_eq!(
            parse_response("[]"),
            Err(ExtractionFailure::MissingDestinationsKey)
        );
        assert_eq!(
            parse_response(r#"{"places":[]}"#),
            Err(ExtractionFailure::MissingDestinationsKey)
        );
        assert_eq!(
            parse_response(r#"{"destinations":"Haarlem"}"#),
            Err(ExtractionFailure::MissingDestinationsKey)
        );
        assert_eq!(
            parse_response(r#"{"destinations":[]}"#),
            Ok(Extraction::default())
        );
    }

    #[test]
    fn test_failure_messages() {
        let failure = parse_response(r#"{"destinations":[{"name":"A"}]}"#).unwrap_err();
        assert_eq!(
            failure.to_string(),
            "reply contained no usable destinations (1 skipped)"
        );
    }
}
