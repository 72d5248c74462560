//! Google Maps adapter.
//!
//! Google takes `{lat, lng}` literals, so no projection is involved. Base
//! layers are native map type ids and controls are map option flags.

use crate::{
    core::{
        geo::LatLng,
        projection::LatLngLiteral,
        state::{MapState, MapType},
    },
    engine::{
        hit_tolerance, string_value, EngineContext, LibrarySpec, MapEngine,
        MissingLibraryPolicy, Provider, ProviderOptions,
    },
    layers::{
        base::BaseLayerSet,
        controls::{Control, ControlSet},
    },
    markers::registry::{MarkerBackend, MarkerSpec},
    prelude::HashMap,
    spatial::index::FeatureIndex,
    traits::CoordinateNormalizer,
    widget::loading::WidgetId,
    MapError, Result,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MAPS_API_URL: &str = "https://maps.googleapis.com/maps/api/js";

pub const STANDARD_CONTROLS: &[Control] = &[
    Control::Zoom,
    Control::MapType,
    Control::Scale,
    Control::StreetView,
    Control::Rotate,
    Control::FullScreen,
];

pub type MarkerId = u32;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleMapsOptions {
    pub api_key: String,
}

impl GoogleMapsOptions {
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }
}

impl ProviderOptions for GoogleMapsOptions {
    fn apply(&mut self, property: &str, value: &Value) -> Result<bool> {
        match property {
            "apiKey" => {
                self.api_key = string_value(property, value)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn immutable_after_bind(property: &str) -> bool {
        property == "apiKey"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapTypeId {
    Roadmap,
    Satellite,
    Hybrid,
    Terrain,
}

impl MapTypeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Roadmap => "roadmap",
            Self::Satellite => "satellite",
            Self::Hybrid => "hybrid",
            Self::Terrain => "terrain",
        }
    }
}

impl From<MapType> for MapTypeId {
    fn from(map_type: MapType) -> Self {
        match map_type {
            MapType::Standard => Self::Roadmap,
            MapType::Satellite => Self::Satellite,
            MapType::Hybrid => Self::Hybrid,
            MapType::Terrain => Self::Terrain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    Drop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoWindow {
    pub content: String,
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GoogleMarker {
    pub position: LatLng,
    pub title: String,
    pub animation: Animation,
    pub info_window: Option<InfoWindow>,
    pub index: usize,
}

#[derive(Debug)]
pub struct GoogleMapsEngine {
    target: Option<String>,
    center: LatLng,
    zoom: u8,
    map_type_id: MapTypeId,
    base_layers: BaseLayerSet<MapTypeId>,
    controls: ControlSet,
    markers: HashMap<MarkerId, GoogleMarker>,
    index: FeatureIndex<MarkerId>,
    hit_tolerance_px: f64,
    next_marker: MarkerId,
    click_listeners: usize,
}

impl GoogleMapsEngine {
    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn map_type_id(&self) -> MapTypeId {
        self.map_type_id
    }

    pub fn controls(&self) -> &ControlSet {
        &self.controls
    }

    pub fn marker(&self, id: MarkerId) -> Option<&GoogleMarker> {
        self.markers.get(&id)
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn click_listeners(&self) -> usize {
        self.click_listeners
    }

    /// Page-level callback the Maps script invokes once loaded
    pub fn callback_name(widget: WidgetId) -> String {
        format!("mapbridgeGoogleReady_{}", widget)
    }
}

impl MarkerBackend for GoogleMapsEngine {
    type Handle = MarkerId;

    fn create_marker(&mut self, position: LatLng, spec: &MarkerSpec, index: usize) -> MarkerId {
        self.next_marker += 1;
        let id = self.next_marker;
        let position = LatLngLiteral::to_engine(position);

        let info_window = (!spec.description.is_empty()).then(|| InfoWindow {
            content: spec.description.clone(),
            open: false,
        });
        self.markers.insert(
            id,
            GoogleMarker {
                position,
                title: spec.title.clone(),
                animation: Animation::Drop,
                info_window,
                index,
            },
        );
        self.index.insert(id, position);
        self.click_listeners += 1;
        id
    }

    fn release_marker(&mut self, handle: MarkerId) {
        // marker.setMap(null)
        if self.markers.remove(&handle).is_some() {
            self.click_listeners -= 1;
        }
        self.index.remove(handle);
    }

    fn reindex_marker(&mut self, handle: MarkerId, index: usize) {
        if let Some(marker) = self.markers.get_mut(&handle) {
            marker.index = index;
        }
    }
}

impl MapEngine for GoogleMapsEngine {
    type Normalizer = LatLngLiteral;
    type Options = GoogleMapsOptions;

    const PROVIDER: Provider = Provider::Google;
    const MISSING_LIBRARY: MissingLibraryPolicy = MissingLibraryPolicy::Load;

    fn library(options: &GoogleMapsOptions, widget: WidgetId) -> LibrarySpec {
        let callback = Self::callback_name(widget);
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("key", &options.api_key)
            .append_pair("callback", &callback)
            .finish();
        LibrarySpec::new(Provider::Google, "google.maps")
            .script(format!("{}?{}", MAPS_API_URL, query))
            .with_callback(callback)
    }

    fn check_config(options: &GoogleMapsOptions) -> Result<()> {
        if options.api_key.trim().is_empty() {
            return Err(MapError::Configuration(
                "Google Maps requires a valid API key".to_string(),
            ));
        }
        Ok(())
    }

    fn create(ctx: &EngineContext, state: &MapState, _options: &GoogleMapsOptions) -> Result<Self> {
        log::debug!("Creating Google map on '{}'", ctx.target);
        Ok(Self {
            target: Some(ctx.target.clone()),
            center: LatLngLiteral::to_engine(state.center()),
            zoom: state.zoom,
            map_type_id: MapTypeId::Roadmap,
            base_layers: BaseLayerSet::new(),
            controls: ControlSet::new(STANDARD_CONTROLS),
            markers: HashMap::default(),
            index: FeatureIndex::new(),
            hit_tolerance_px: ctx.hit_tolerance_px,
            next_marker: 0,
            click_listeners: 1,
        })
    }

    fn set_base_layer(&mut self, map_type: MapType) -> MapType {
        self.base_layers.select(
            map_type,
            |_| true,
            MapTypeId::from,
            |id, visible| {
                if visible {
                    self.map_type_id = *id;
                }
            },
        )
    }

    fn set_controls(&mut self, visible: bool) {
        self.controls.set_visible(visible);
    }

    fn set_center(&mut self, center: LatLng) {
        self.center = center;
    }

    fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom;
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.center = center;
        self.zoom = zoom;
    }

    fn feature_at(&self, coord: LatLng) -> Option<MarkerId> {
        let tolerance = hit_tolerance(self.hit_tolerance_px, self.zoom);
        self.index.hit(LatLngLiteral::from_engine(coord), tolerance)
    }

    fn on_marker_clicked(&mut self, handle: MarkerId) {
        if let Some(window) = self
            .markers
            .get_mut(&handle)
            .and_then(|m| m.info_window.as_mut())
        {
            window.open = true;
        }
    }

    fn destroy(&mut self) {
        self.target = None;
        self.markers.clear();
        self.index.clear();
        self.click_listeners = 0;
        self.controls.set_visible(false);
        self.base_layers.invalidate(|_, _| {});
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine() -> GoogleMapsEngine {
        let ctx = EngineContext {
            target: "gmap".to_string(),
            hit_tolerance_px: 10.0,
        };
        GoogleMapsEngine::create(
            &ctx,
            &MapState::default(),
            &GoogleMapsOptions::with_api_key("key"),
        )
        .unwrap()
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let err = GoogleMapsEngine::check_config(&GoogleMapsOptions::default()).unwrap_err();
        assert!(matches!(err, MapError::Configuration(_)));
        assert!(GoogleMapsEngine::check_config(&GoogleMapsOptions::with_api_key("k")).is_ok());
    }

    #[test]
    fn test_script_url_carries_key_and_instance_callback() {
        let widget = WidgetId::next();
        let spec = GoogleMapsEngine::library(&GoogleMapsOptions::with_api_key("abc"), widget);
        let callback = GoogleMapsEngine::callback_name(widget);

        assert_eq!(spec.callback.as_deref(), Some(callback.as_str()));
        assert_eq!(
            spec.scripts,
            vec![format!("{}?key=abc&callback={}", MAPS_API_URL, callback)]
        );

        let other = GoogleMapsEngine::library(&GoogleMapsOptions::with_api_key("abc"), WidgetId::next());
        assert_ne!(other.callback, spec.callback);
    }

    #[test]
    fn test_script_url_escapes_key() {
        let widget = WidgetId::next();
        let spec = GoogleMapsEngine::library(&GoogleMapsOptions::with_api_key("a&b#c=d"), widget);
        assert_eq!(
            spec.scripts[0],
            format!(
                "{}?key=a%26b%23c%3Dd&callback={}",
                MAPS_API_URL,
                GoogleMapsEngine::callback_name(widget)
            )
        );
    }

    #[test]
    fn test_map_type_ids() {
        let mut engine = engine();
        engine.set_base_layer(MapType::Hybrid);
        assert_eq!(engine.map_type_id(), MapTypeId::Hybrid);
        engine.set_base_layer(MapType::Standard);
        assert_eq!(engine.map_type_id(), MapTypeId::Roadmap);
    }

    #[test]
    fn test_info_window_only_with_description() {
        let mut engine = engine();
        let plain = engine.create_marker(LatLng::new(1.0, 2.0), &MarkerSpec::new("A", ""), 0);
        let rich = engine.create_marker(LatLng::new(3.0, 4.0), &MarkerSpec::new("B", "desc"), 1);

        assert!(engine.marker(plain).unwrap().info_window.is_none());
        assert_eq!(engine.marker(rich).unwrap().animation, Animation::Drop);

        engine.on_marker_clicked(rich);
        assert!(engine.marker(rich).unwrap().info_window.as_ref().unwrap().open);
    }

    #[test]
    fn test_api_key_option() {
        let mut options = GoogleMapsOptions::default();
        assert!(options.apply("apiKey", &json!("k1")).unwrap());
        assert_eq!(options.api_key, "k1");
        assert!(!options.apply("tileUrl", &json!("x")).unwrap());
        assert!(GoogleMapsOptions::immutable_after_bind("apiKey"));
    }

    #[test]
    fn test_listeners_follow_markers() {
        let mut engine = engine();
        let id = engine.create_marker(LatLng::new(1.0, 2.0), &MarkerSpec::default(), 0);
        assert_eq!(engine.click_listeners(), 2);
        engine.release_marker(id);
        assert_eq!(engine.click_listeners(), 1);
        engine.destroy();
        assert_eq!(engine.click_listeners(), 0);
    }
}
