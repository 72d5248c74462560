use serde::{Deserialize, Serialize};

/// Events sent back to the server.
///
/// Serializes as `{"name": "onMapClick", "data": {"latitude": .., "longitude": ..}}`
/// and `{"name": "onMarkerClick", "data": {"markerIndex": ..}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data")]
pub enum MapEvent {
    /// Click on the map background, in canonical degrees
    #[serde(rename = "onMapClick")]
    MapClick { latitude: f64, longitude: f64 },

    /// Click on a marker, carrying its current registry index
    #[serde(rename = "onMarkerClick")]
    MarkerClick {
        #[serde(rename = "markerIndex")]
        marker_index: usize,
    },
}

impl MapEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MapClick { .. } => "onMapClick",
            Self::MarkerClick { .. } => "onMarkerClick",
        }
    }
}

/// Raw click reported by an engine, before the widget turns it into a
/// [`MapEvent`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeClick<C, H> {
    /// Click at an engine-native coordinate; may still land on a feature
    Map { coord: C },
    /// Click delivered directly to a native marker's listener
    Marker { handle: H },
}
