//! # mapbridge
//!
//! Provider-agnostic map widgets for server-driven UIs.
//!
//! A server pushes the same five commands (`addMarker`, `removeMarker`,
//! `clearMarkers`, `centerMap`, `setMapView`) to any widget and receives the
//! same two events back (`onMapClick`, `onMarkerClick`), whether the map is
//! backed by OpenLayers, Google Maps or Leaflet. The generic [`MapWidget`]
//! owns the state machine; each engine only supplies a thin [`MapEngine`]
//! adapter.

pub mod core;
pub mod engine;
pub mod host;
pub mod input;
pub mod layers;
pub mod markers;
pub mod prelude;
pub mod spatial;
pub mod traits;
pub mod widget;
#[cfg(feature = "wasm")]
pub mod web;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    builder::MapWidgetBuilder,
    config::{PendingCommandPolicy, WidgetConfig},
    geo::{LatLng, Point},
    state::{MapState, MapType},
};

pub use engine::{
    google::GoogleMapsEngine, leaflet::LeafletEngine, openlayers::OpenLayersEngine, MapEngine,
    Provider,
};

pub use input::events::{MapEvent, NativeClick};

pub use markers::registry::{MarkerRecord, MarkerRegistry};

pub use widget::{
    dispatch::{Command, DispatchOutcome},
    BindOutcome, MapWidget, PropertyOutcome, WidgetPhase,
};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{0} engine library is not available")]
    EngineUnavailable(Provider),

    #[error("Engine load failed: {0}")]
    LoadFailed(String),

    #[error("Engine load cancelled")]
    LoadCancelled,

    #[error("Invalid arguments for command '{command}': {reason}")]
    InvalidCommand { command: String, reason: String },

    #[error("Invalid value for property '{property}': {reason}")]
    InvalidProperty { property: String, reason: String },

    #[error("Invalid widget state: {0}")]
    InvalidState(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Host error: {0}")]
    Host(String),
}

/// Error type alias for convenience
pub type Error = MapError;
