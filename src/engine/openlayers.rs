//! OpenLayers adapter.
//!
//! Coordinates are EPSG:3857 meters. Markers are vector features on one
//! marker layer, styled as a red circle with the title drawn above, and a
//! single overlay acts as the description popup. Click hit testing goes
//! through an R-tree over feature geometries, which is what
//! `forEachFeatureAtPixel` does for the browser engine.

use crate::{
    core::{
        geo::{LatLng, Point},
        projection::WebMercator,
        state::{MapState, MapType},
    },
    engine::{
        hit_tolerance, EngineContext, LibrarySpec, MapEngine, MissingLibraryPolicy, Provider,
        ProviderOptions,
    },
    layers::{
        base::BaseLayerSet,
        controls::{Control, ControlSet},
        tile::TileSourceSpec,
    },
    markers::registry::{MarkerBackend, MarkerSpec},
    prelude::HashMap,
    spatial::index::FeatureIndex,
    traits::CoordinateNormalizer,
    widget::loading::WidgetId,
    Result,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const OL_VERSION: &str = "7.2.2";

pub const STANDARD_CONTROLS: &[Control] = &[
    Control::Zoom,
    Control::Scale,
    Control::Attribution { collapsible: true },
    Control::FullScreen,
];

pub type FeatureId = u32;

/// OpenLayers takes no provider-specific properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenLayersOptions {}

impl ProviderOptions for OpenLayersOptions {
    fn apply(&mut self, _property: &str, _value: &Value) -> Result<bool> {
        Ok(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct View {
    pub center: Point,
    pub zoom: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub source: TileSourceSpec,
    pub visible: bool,
}

/// Circle marker style
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill: &'static str,
    pub stroke: &'static str,
    pub stroke_width: f64,
    pub text: String,
    pub text_offset_y: f64,
}

impl MarkerStyle {
    pub fn for_title(title: &str) -> Self {
        Self {
            radius: 8.0,
            fill: "#FF0000",
            stroke: "#FFFFFF",
            stroke_width: 2.0,
            text: title.to_string(),
            text_offset_y: -15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: Point,
    pub name: String,
    pub description: String,
    /// Registry index stored on the feature
    pub index: usize,
    pub style: MarkerStyle,
}

/// Description popup, shown at one feature at a time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub position: Option<Point>,
    pub feature: Option<FeatureId>,
    pub content: String,
}

impl Overlay {
    fn close(&mut self) {
        self.position = None;
        self.feature = None;
        self.content.clear();
    }
}

#[derive(Debug)]
pub struct OpenLayersEngine {
    target: Option<String>,
    view: View,
    base_layers: BaseLayerSet<TileLayer>,
    features: HashMap<FeatureId, Feature>,
    popup: Overlay,
    controls: ControlSet,
    index: FeatureIndex<FeatureId>,
    hit_tolerance_px: f64,
    next_feature: FeatureId,
    click_listeners: usize,
}

impl OpenLayersEngine {
    pub fn view(&self) -> View {
        self.view
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn base_layers(&self) -> &BaseLayerSet<TileLayer> {
        &self.base_layers
    }

    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(&id)
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn popup(&self) -> &Overlay {
        &self.popup
    }

    pub fn controls(&self) -> &ControlSet {
        &self.controls
    }

    pub fn click_listeners(&self) -> usize {
        self.click_listeners
    }

    fn source_for(map_type: MapType) -> TileSourceSpec {
        match map_type {
            MapType::Satellite => TileSourceSpec::esri_imagery(),
            MapType::Terrain => TileSourceSpec::stamen_terrain(),
            _ => TileSourceSpec::openstreetmap(),
        }
    }
}

impl MarkerBackend for OpenLayersEngine {
    type Handle = FeatureId;

    fn create_marker(&mut self, position: LatLng, spec: &MarkerSpec, index: usize) -> FeatureId {
        self.next_feature += 1;
        let id = self.next_feature;
        let geometry = WebMercator::to_engine(position);

        self.features.insert(
            id,
            Feature {
                geometry,
                name: spec.title.clone(),
                description: spec.description.clone(),
                index,
                style: MarkerStyle::for_title(&spec.title),
            },
        );
        self.index.insert(id, position);
        id
    }

    fn release_marker(&mut self, handle: FeatureId) {
        self.features.remove(&handle);
        self.index.remove(handle);
        if self.popup.feature == Some(handle) {
            self.popup.close();
        }
    }

    fn reindex_marker(&mut self, handle: FeatureId, index: usize) {
        if let Some(feature) = self.features.get_mut(&handle) {
            feature.index = index;
        }
    }

    fn release_all(&mut self, _handles: &[FeatureId]) {
        // source.clear()
        self.features.clear();
        self.index.clear();
        self.popup.close();
    }
}

impl MapEngine for OpenLayersEngine {
    type Normalizer = WebMercator;
    type Options = OpenLayersOptions;

    const PROVIDER: Provider = Provider::OpenLayers;
    const MISSING_LIBRARY: MissingLibraryPolicy = MissingLibraryPolicy::Load;

    fn library(_options: &OpenLayersOptions, _widget: WidgetId) -> LibrarySpec {
        LibrarySpec::new(Provider::OpenLayers, "ol")
            .style(format!("https://cdn.jsdelivr.net/npm/ol@v{}/ol.css", OL_VERSION))
            .script(format!("https://cdn.jsdelivr.net/npm/ol@v{}", OL_VERSION))
    }

    fn create(ctx: &EngineContext, state: &MapState, _options: &OpenLayersOptions) -> Result<Self> {
        log::debug!("Creating OpenLayers map on '{}'", ctx.target);
        Ok(Self {
            target: Some(ctx.target.clone()),
            view: View {
                center: WebMercator::to_engine(state.center()),
                zoom: state.zoom,
            },
            base_layers: BaseLayerSet::new(),
            features: HashMap::default(),
            popup: Overlay::default(),
            controls: ControlSet::new(STANDARD_CONTROLS),
            index: FeatureIndex::new(),
            hit_tolerance_px: ctx.hit_tolerance_px,
            next_feature: 0,
            click_listeners: 1,
        })
    }

    fn set_base_layer(&mut self, map_type: MapType) -> MapType {
        self.base_layers.select(
            map_type,
            |t| t != MapType::Hybrid,
            |t| TileLayer {
                source: Self::source_for(t),
                visible: false,
            },
            |layer, visible| layer.visible = visible,
        )
    }

    fn set_controls(&mut self, visible: bool) {
        self.controls.set_visible(visible);
    }

    fn set_center(&mut self, center: Point) {
        self.view.center = center;
    }

    fn set_zoom(&mut self, zoom: u8) {
        self.view.zoom = zoom;
    }

    fn set_view(&mut self, center: Point, zoom: u8) {
        self.view = View { center, zoom };
    }

    fn feature_at(&self, coord: Point) -> Option<FeatureId> {
        let tolerance = hit_tolerance(self.hit_tolerance_px, self.view.zoom);
        self.index.hit(WebMercator::from_engine(coord), tolerance)
    }

    fn on_marker_clicked(&mut self, handle: FeatureId) {
        if let Some(feature) = self.features.get(&handle) {
            if !feature.description.is_empty() {
                self.popup = Overlay {
                    position: Some(feature.geometry),
                    feature: Some(handle),
                    content: feature.description.clone(),
                };
            }
        }
    }

    fn destroy(&mut self) {
        // map.setTarget(null)
        self.target = None;
        self.click_listeners = 0;
        self.features.clear();
        self.index.clear();
        self.popup.close();
        self.controls.set_visible(false);
        self.base_layers.invalidate(|layer, visible| layer.visible = visible);
    }
}
