//! Initial markers declared on the host node.
//!
//! The server renders the marker list as a JSON array attribute,
//! e.g. `data-markers='[{"lat":41.0,"lng":-3.0,"title":"A"}]'`.

use crate::{core::geo::LatLng, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerSeed {
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MarkerSeed {
    pub fn new(lat: f64, lng: f64, title: &str, description: &str) -> Self {
        Self {
            lat,
            lng,
            title: Some(title.to_string()),
            description: Some(description.to_string()),
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Parses a seed attribute. Blank input means no markers.
pub fn parse_seed(raw: &str) -> Result<Vec<MarkerSeed>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}
