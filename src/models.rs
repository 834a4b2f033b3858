use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Renders the box in the coordinate order Overpass expects:
    /// south, west, north, east.
    pub fn to_overpass(&self) -> String {
        format!(
            "{},{},{},{}",
            self.min_lat, self.min_lng, self.max_lat, self.max_lng
        )
    }
}

/// Geometry of one element as produced by the upstream converter.
/// Unknown types deserialize as `Unsupported` so a single odd element
/// never fails the whole result set.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    LineString { coordinates: Vec<[f64; 2]> },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
    #[serde(other)]
    Unsupported,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Element {
    pub geometry: Geometry,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Prompt {
    pub prompt: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct QueryRequest {
    pub query: String,
    pub place_name: String,
}
