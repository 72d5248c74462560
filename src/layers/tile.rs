//! Tile source descriptions for raster base layers.
//!
//! Engines never fetch tiles themselves here; they hand these descriptions
//! to the host map library. The URL templates use the Leaflet placeholder
//! syntax (`{s}`, `{z}`, `{x}`, `{y}`, `{r}`, `{id}`, `{accessToken}`).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const OSM_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OSM_ATTRIBUTION: &str = "© OpenStreetMap contributors";
pub const ESRI_IMAGERY_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";
pub const MAPBOX_URL: &str =
    "https://api.mapbox.com/styles/v1/{id}/tiles/{z}/{x}/{y}?access_token={accessToken}";
pub const CARTO_LIGHT_URL: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";
pub const CARTO_VOYAGER_URL: &str =
    "https://{s}.basemaps.cartocdn.com/rastertiles/voyager/{z}/{x}/{y}{r}.png";
pub const STAMEN_TERRAIN_URL: &str = "https://stamen-tiles.a.ssl.fastly.net/terrain/{z}/{x}/{y}.jpg";

/// Raster tile source handed to an engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSourceSpec {
    pub url_template: String,
    pub attribution: String,
    pub subdomains: Vec<String>,
    /// Style id substituted for `{id}` (Mapbox)
    pub style_id: Option<String>,
    /// Token substituted for `{accessToken}`
    pub access_token: Option<String>,
}

impl TileSourceSpec {
    pub fn new(url_template: &str, attribution: &str) -> Self {
        Self {
            url_template: url_template.to_string(),
            attribution: attribution.to_string(),
            subdomains: Vec::new(),
            style_id: None,
            access_token: None,
        }
    }

    pub fn with_subdomains(mut self, subdomains: &[&str]) -> Self {
        self.subdomains = subdomains.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_style(mut self, style_id: &str, access_token: &str) -> Self {
        self.style_id = Some(style_id.to_string());
        self.access_token = Some(access_token.to_string());
        self
    }

    /// OpenStreetMap standard tiles
    pub fn openstreetmap() -> Self {
        Self::new(OSM_URL, OSM_ATTRIBUTION).with_subdomains(&["a", "b", "c"])
    }

    /// Esri World Imagery
    pub fn esri_imagery() -> Self {
        Self::new(
            ESRI_IMAGERY_URL,
            "© Esri, Maxar, Earthstar Geographics, and the GIS User Community",
        )
    }

    /// Stamen terrain
    pub fn stamen_terrain() -> Self {
        Self::new(
            STAMEN_TERRAIN_URL,
            "Map tiles by Stamen Design, under CC BY 3.0. Data by OpenStreetMap, under ODbL",
        )
    }
}

/// Named tile providers selectable on the Leaflet widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TileProvider {
    #[default]
    Osm,
    Mapbox,
    Carto,
    Esri,
}

/// Default URL and attribution of a tile provider
#[derive(Debug, Clone, Copy)]
pub struct TileProviderPreset {
    pub provider: TileProvider,
    pub url_template: &'static str,
    pub attribution: &'static str,
}

static PRESETS: Lazy<Vec<TileProviderPreset>> = Lazy::new(|| {
    vec![
        TileProviderPreset {
            provider: TileProvider::Osm,
            url_template: OSM_URL,
            attribution: OSM_ATTRIBUTION,
        },
        TileProviderPreset {
            provider: TileProvider::Mapbox,
            url_template: MAPBOX_URL,
            attribution: "© Mapbox © OpenStreetMap",
        },
        TileProviderPreset {
            provider: TileProvider::Carto,
            url_template: CARTO_LIGHT_URL,
            attribution: "© OpenStreetMap, © CARTO",
        },
        TileProviderPreset {
            provider: TileProvider::Esri,
            url_template: ESRI_IMAGERY_URL,
            attribution: "© Esri, i-cubed, USDA, USGS, AEX, GeoEye, Getmapping, Aerogrid, IGN, IGP, UPR-EGP, and the GIS User Community",
        },
    ]
});

impl TileProvider {
    /// Unknown names resolve to OpenStreetMap
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "mapbox" => Self::Mapbox,
            "carto" => Self::Carto,
            "esri" => Self::Esri,
            _ => Self::Osm,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Osm => "osm",
            Self::Mapbox => "mapbox",
            Self::Carto => "carto",
            Self::Esri => "esri",
        }
    }

    pub fn preset(&self) -> &'static TileProviderPreset {
        PRESETS
            .iter()
            .find(|p| p.provider == *self)
            .unwrap_or(&PRESETS[0])
    }
}

impl fmt::Display for TileProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TileProvider {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<TileProvider> for String {
    fn from(provider: TileProvider) -> Self {
        provider.as_str().to_string()
    }
}
