//! Capability interface every mapping engine adapter implements.
//!
//! The generic widget drives an engine only through [`MapEngine`] and the
//! [`MarkerBackend`] supertrait. Adapters keep an in-memory model of the
//! engine's object graph (view, layers, features, controls, overlays) and
//! translate each call into the corresponding engine operation.

pub mod google;
pub mod leaflet;
pub mod openlayers;

use crate::{
    core::{
        projection::WebMercator,
        state::{MapState, MapType},
    },
    markers::registry::MarkerBackend,
    traits::CoordinateNormalizer,
    widget::loading::WidgetId,
    Result,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Engine-native coordinate type of an adapter
pub type EngineCoord<E> = <<E as MapEngine>::Normalizer as CoordinateNormalizer>::Coord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenLayers,
    #[serde(alias = "googlemaps")]
    Google,
    Leaflet,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenLayers => "OpenLayers",
            Self::Google => "Google Maps",
            Self::Leaflet => "Leaflet",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens when the engine library is missing at bind time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingLibraryPolicy {
    /// Fetch the assets, then initialize
    Load,
    /// Show an inline error; the widget never binds
    Fail,
}

/// Script and style assets of an engine library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySpec {
    pub provider: Provider,
    /// Dotted global that exists once the library is usable, e.g. `google.maps`
    pub global: &'static str,
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
    /// Page-level function the library calls when ready, unique per widget
    pub callback: Option<String>,
}

impl LibrarySpec {
    pub fn new(provider: Provider, global: &'static str) -> Self {
        Self {
            provider,
            global,
            scripts: Vec::new(),
            styles: Vec::new(),
            callback: None,
        }
    }

    pub fn script(mut self, url: impl Into<String>) -> Self {
        self.scripts.push(url.into());
        self
    }

    pub fn style(mut self, url: impl Into<String>) -> Self {
        self.styles.push(url.into());
        self
    }

    pub fn with_callback(mut self, name: impl Into<String>) -> Self {
        self.callback = Some(name.into());
        self
    }
}

/// Host-side facts an engine needs at construction
#[derive(Debug, Clone, PartialEq)]
pub struct EngineContext {
    /// Render target id
    pub target: String,
    /// Click radius around a feature, in screen pixels
    pub hit_tolerance_px: f64,
}

/// Provider-specific configuration properties
pub trait ProviderOptions: Default + Clone + fmt::Debug + DeserializeOwned {
    /// Applies a server property push. Returns `Ok(false)` when `property`
    /// is not an option of this provider.
    fn apply(&mut self, property: &str, value: &Value) -> Result<bool>;

    /// Options that cannot change once the engine exists
    fn immutable_after_bind(_property: &str) -> bool {
        false
    }
}

/// A mapping engine as seen by [`crate::MapWidget`]
pub trait MapEngine: MarkerBackend + Sized {
    type Normalizer: CoordinateNormalizer;
    type Options: ProviderOptions;

    const PROVIDER: Provider;
    const MISSING_LIBRARY: MissingLibraryPolicy;

    /// Assets to fetch when the library is not on the page
    fn library(options: &Self::Options, widget: WidgetId) -> LibrarySpec;

    /// Validates options before any engine work happens
    fn check_config(_options: &Self::Options) -> Result<()> {
        Ok(())
    }

    /// Builds the engine on the render target with the initial viewport
    fn create(ctx: &EngineContext, state: &MapState, options: &Self::Options) -> Result<Self>;

    /// Shows the base layer for `map_type`, returning the type actually shown
    fn set_base_layer(&mut self, map_type: MapType) -> MapType;

    /// Installs or removes the standard control set as a unit
    fn set_controls(&mut self, visible: bool);

    fn set_center(&mut self, center: EngineCoord<Self>);

    fn set_zoom(&mut self, zoom: u8);

    /// Center and zoom in one engine call
    fn set_view(&mut self, center: EngineCoord<Self>, zoom: u8);

    /// Marker under a clicked coordinate, if any
    fn feature_at(&self, coord: EngineCoord<Self>) -> Option<Self::Handle>;

    /// Marker-specific click reaction such as opening its popup
    fn on_marker_clicked(&mut self, _handle: Self::Handle) {}

    /// Pushes a changed provider option into the live engine
    fn apply_options(&mut self, _options: &Self::Options, _property: &str) {}

    /// Detaches listeners and releases every engine object
    fn destroy(&mut self);
}

/// Converts a pixel tolerance into [`FeatureIndex`] meters at `zoom`
///
/// [`FeatureIndex`]: crate::spatial::index::FeatureIndex
pub(crate) fn hit_tolerance(pixels: f64, zoom: u8) -> f64 {
    pixels * WebMercator::meters_per_pixel(zoom)
}

pub(crate) fn string_value(property: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(crate::MapError::InvalidProperty {
            property: property.to_string(),
            reason: format!("expected a string, got {}", other),
        }),
    }
}
