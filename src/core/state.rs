//! Per-widget map state: viewport, base layer and interaction flags.

use crate::core::{
    constants::{DEFAULT_LATITUDE, DEFAULT_LONGITUDE, DEFAULT_ZOOM},
    geo::LatLng,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Background imagery requested by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MapType {
    #[default]
    Standard,
    Satellite,
    Terrain,
    Hybrid,
}

impl MapType {
    /// Parses a map-type tag. Unknown tags fall back to [`MapType::Standard`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "osm" | "standard" | "roadmap" => Self::Standard,
            "satellite" => Self::Satellite,
            "terrain" => Self::Terrain,
            "hybrid" => Self::Hybrid,
            other => {
                log::debug!("Unknown map type '{}', using standard", other);
                Self::Standard
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Satellite => "satellite",
            Self::Terrain => "terrain",
            Self::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_tag(s))
    }
}

impl From<String> for MapType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<MapType> for String {
    fn from(map_type: MapType) -> Self {
        map_type.as_str().to_string()
    }
}

/// State owned by one widget instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub map_type: MapType,
    pub show_controls: bool,
    pub allow_marker_creation_on_click: bool,
}

impl MapState {
    pub fn new(latitude: f64, longitude: f64, zoom: u8) -> Self {
        Self {
            latitude,
            longitude,
            zoom,
            ..Self::default()
        }
    }

    /// Current viewport center
    pub fn center(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }

    pub fn set_center(&mut self, center: LatLng) {
        self.latitude = center.lat;
        self.longitude = center.lng;
    }
}

impl Default for MapState {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            zoom: DEFAULT_ZOOM,
            map_type: MapType::Standard,
            show_controls: true,
            allow_marker_creation_on_click: false,
        }
    }
}
