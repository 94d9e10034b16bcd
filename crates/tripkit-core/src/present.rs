// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Shapes extracted destinations for the list view and the map.

use crate::geocode::GeocodeResult;
use crate::settings::MapSettings;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use tripkit_extract::{Coordinates, DestinationRecord};

/// RGB colour as map widgets expect it.
pub type Rgb = [u8; 3];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointStyle {
    pub fill_color: Rgb,
    pub radius: f64,
    pub radius_scale: f64,
    pub pickable: bool,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            fill_color: [255, 140, 0],
            radius: 30.0,
            radius_scale: 20.0,
            pickable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: Rgb,
    pub width: f64,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: [253, 128, 93],
            width: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub name: String,
    pub position: Coordinates,
    pub travel_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLine {
    pub name: String,
    pub start: Coordinates,
    pub end: Coordinates,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapLayers {
    pub points: Vec<MapPoint>,
    pub lines: Vec<MapLine>,
    pub point_style: PointStyle,
    pub line_style: LineStyle,
}

/// One point per record, in order. Lines from the origin are drawn only when it
/// was resolved; there is no stand-in origin.
pub fn to_map_layers(records: &[DestinationRecord], origin: &GeocodeResult) -> MapLayers {
    let points = records
        .iter()
        .map(|r| MapPoint {
            name: r.name.clone(),
            position: r.coordinates,
            travel_time: r.travel_time.clone(),
        })
        .collect();

    let lines = match origin.coordinates() {
        Some(start) => records
            .iter()
            .map(|r| MapLine {
                name: r.name.clone(),
                start,
                end: r.coordinates,
            })
            .collect(),
        None => Vec::new(),
    };

    MapLayers {
        points,
        lines,
        ..MapLayers::default()
    }
}

impl MapLayers {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.lines.is_empty()
    }

    /// GeoJSON `FeatureCollection` with a Point per destination and a LineString
    /// per origin-to-destination line.
    pub fn to_geojson(&self) -> Value {
        let points = self.points.iter().map(|p| {
            json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": p.position.lon_lat() },
                "properties": {
                    "layer": "destinations",
                    "name": p.name,
                    "travel_time": p.travel_time,
                    "fill_color": self.point_style.fill_color,
                    "radius": self.point_style.radius,
                },
            })
        });
        let lines = self.lines.iter().map(|l| {
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": [l.start.lon_lat(), l.end.lon_lat()],
                },
                "properties": {
                    "layer": "routes",
                    "name": l.name,
                    "color": self.line_style.color,
                    "width": self.line_style.width,
                },
            })
        });

        json!({
            "type": "FeatureCollection",
            "features": points.chain(lines).collect::<Vec<_>>(),
        })
    }
}

/// Initial camera for the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub pitch: f64,
}

impl ViewState {
    /// Centres on the origin when known, otherwise on the configured default.
    pub fn for_origin(origin: &GeocodeResult, map: &MapSettings) -> Self {
        let center = origin.coordinates().unwrap_or(map.default_center);
        Self {
            latitude: center.latitude,
            longitude: center.longitude,
            zoom: map.zoom,
            pitch: map.pitch,
        }
    }
}

/// Sidebar entry for one destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationCard {
    pub name: String,
    pub travel_time: String,
    pub activities: Vec<String>,
}

pub fn to_cards(records: &[DestinationRecord]) -> Vec<DestinationCard> {
    records
        .iter()
        .map(|r| DestinationCard {
            name: r.name.clone(),
            travel_time: r.travel_time.clone(),
            activities: r.things_to_do.clone(),
        })
        .collect()
}

impl fmt::Display for DestinationCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "  Travel time: {}", self.travel_time)?;
        if self.activities.is_empty() {
            return writeln!(f, "  Activities: none listed");
        }
        writeln!(f, "  Activities:")?;
        for activity in &self.activities {
            writeln!(f, "    - {}", activity)?;
        }
        Ok(())
    }
}

/// Plain-text sidebar: one block per card, separated by a blank line.
pub fn render_cards(cards: &[DestinationCard]) -> String {
    if cards.is_empty() {
        return "No recommendations.\n".to_string();
    }
    cards
        .iter()
        .map(DestinationCard::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
