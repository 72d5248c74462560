//! Leaflet adapter.
//!
//! Leaflet positions are `[lat, lng]` arrays. The base layer is a tile
//! layer resolved from the tile provider options and the map type; markers
//! live in one layer group and carry a bound popup when they have a
//! description. Leaflet is never loaded on demand: a page without `L`
//! shows an inline error instead.

use crate::{
    core::{
        geo::LatLng,
        projection::LatLngArray,
        state::{MapState, MapType},
    },
    engine::{
        hit_tolerance, string_value, EngineContext, LibrarySpec, MapEngine,
        MissingLibraryPolicy, Provider, ProviderOptions,
    },
    layers::{
        base::BaseLayerSet,
        controls::{Control, ControlSet},
        tile::{
            TileProvider, TileSourceSpec, CARTO_VOYAGER_URL, ESRI_IMAGERY_URL, MAPBOX_URL,
            OSM_ATTRIBUTION, OSM_URL,
        },
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

pub const LEAFLET_VERSION: &str = "1.9.4";

pub const STANDARD_CONTROLS: &[Control] = &[
    Control::Zoom,
    Control::Scale,
    Control::Attribution { collapsible: false },
];

pub type MarkerId = u32;

/// Tile configuration pushed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LeafletOptions {
    pub tile_provider: TileProvider,
    pub tile_url: String,
    pub attribution: String,
    pub access_token: String,
}

impl Default for LeafletOptions {
    fn default() -> Self {
        Self {
            tile_provider: TileProvider::Osm,
            tile_url: OSM_URL.to_string(),
            attribution: OSM_ATTRIBUTION.to_string(),
            access_token: String::new(),
        }
    }
}

impl LeafletOptions {
    /// Options for `provider` with its preset URL and attribution
    pub fn for_provider(provider: TileProvider) -> Self {
        let mut options = Self::default();
        options.select_provider(provider);
        options
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    fn select_provider(&mut self, provider: TileProvider) {
        let preset = provider.preset();
        self.tile_provider = provider;
        self.tile_url = preset.url_template.to_string();
        self.attribution = preset.attribution.to_string();
    }

    fn mapbox_token(&self) -> Option<&str> {
        (self.tile_provider == TileProvider::Mapbox && !self.access_token.is_empty())
            .then_some(self.access_token.as_str())
    }

    /// Tile source shown for `map_type`
    pub fn source_for(&self, map_type: MapType) -> TileSourceSpec {
        let with_subdomains = |spec: TileSourceSpec| {
            if spec.url_template.contains("{s}") {
                spec.with_subdomains(&["a", "b", "c"])
            } else {
                spec
            }
        };
        let mapbox = |style: &str, token: &str| {
            TileSourceSpec::new(MAPBOX_URL, &self.attribution).with_style(style, token)
        };

        let base = match self.mapbox_token() {
            Some(token) => TileSourceSpec::new(&self.tile_url, &self.attribution)
                .with_style("mapbox/streets-v11", token),
            None => TileSourceSpec::new(&self.tile_url, &self.attribution),
        };

        let spec = match (map_type, self.tile_provider, self.mapbox_token()) {
            (MapType::Satellite, TileProvider::Mapbox, Some(token)) => {
                mapbox("mapbox/satellite-v9", token)
            }
            (MapType::Satellite, TileProvider::Esri, _) => TileSourceSpec {
                url_template: ESRI_IMAGERY_URL.to_string(),
                ..base
            },
            (MapType::Terrain, TileProvider::Mapbox, Some(token)) => {
                mapbox("mapbox/outdoors-v11", token)
            }
            (MapType::Terrain, TileProvider::Carto, _) => TileSourceSpec {
                url_template: CARTO_VOYAGER_URL.to_string(),
                ..base
            },
            _ => base,
        };
        with_subdomains(spec)
    }
}

impl ProviderOptions for LeafletOptions {
    fn apply(&mut self, property: &str, value: &Value) -> Result<bool> {
        match property {
            "tileProvider" => {
                let name = string_value(property, value)?;
                self.select_provider(TileProvider::from_name(&name));
            }
            "tileUrl" => self.tile_url = string_value(property, value)?,
            "attribution" => self.attribution = string_value(property, value)?,
            "accessToken" => self.access_token = string_value(property, value)?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafletTileLayer {
    pub spec: TileSourceSpec,
    pub on_map: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub content: String,
    pub open: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeafletMarker {
    pub position: [f64; 2],
    pub title: String,
    pub popup: Option<Popup>,
    pub index: usize,
}

#[derive(Debug)]
pub struct LeafletEngine {
    target: Option<String>,
    center: [f64; 2],
    zoom: u8,
    options: LeafletOptions,
    tile_layers: BaseLayerSet<LeafletTileLayer>,
    controls: ControlSet,
    marker_group: HashMap<MarkerId, LeafletMarker>,
    index: FeatureIndex<MarkerId>,
    hit_tolerance_px: f64,
    next_marker: MarkerId,
    click_listeners: usize,
}

impl LeafletEngine {
    pub fn center(&self) -> [f64; 2] {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn tile_layer(&self) -> Option<&LeafletTileLayer> {
        self.tile_layers.active_layer()
    }

    pub fn tile_layers(&self) -> &BaseLayerSet<LeafletTileLayer> {
        &self.tile_layers
    }

    pub fn controls(&self) -> &ControlSet {
        &self.controls
    }

    pub fn marker(&self, id: MarkerId) -> Option<&LeafletMarker> {
        self.marker_group.get(&id)
    }

    pub fn marker_count(&self) -> usize {
        self.marker_group.len()
    }

    pub fn click_listeners(&self) -> usize {
        self.click_listeners
    }

    fn show_tiles(&mut self, map_type: MapType) -> MapType {
        let options = &self.options;
        self.tile_layers.select(
            map_type,
            |t| t != MapType::Hybrid,
            |t| LeafletTileLayer {
                spec: options.source_for(t),
                on_map: false,
            },
            |layer, on_map| layer.on_map = on_map,
        )
    }
}

impl MarkerBackend for LeafletEngine {
    type Handle = MarkerId;

    fn create_marker(&mut self, position: LatLng, spec: &MarkerSpec, index: usize) -> MarkerId {
        self.next_marker += 1;
        let id = self.next_marker;
        self.index.insert(id, position);
        let position = LatLngArray::to_engine(position);

        let popup = (!spec.description.is_empty()).then(|| Popup {
            content: spec.description.clone(),
            open: false,
        });
        self.marker_group.insert(
            id,
            LeafletMarker {
                position,
                title: spec.title.clone(),
                popup,
                index,
            },
        );
        self.click_listeners += 1;
        id
    }

    fn release_marker(&mut self, handle: MarkerId) {
        if self.marker_group.remove(&handle).is_some() {
            self.click_listeners -= 1;
        }
        self.index.remove(handle);
    }

    fn reindex_marker(&mut self, handle: MarkerId, index: usize) {
        if let Some(marker) = self.marker_group.get_mut(&handle) {
            marker.index = index;
        }
    }

    fn release_all(&mut self, _handles: &[MarkerId]) {
        // markerLayer.clearLayers()
        self.click_listeners -= self.marker_group.len();
        self.marker_group.clear();
        self.index.clear();
    }
}

impl MapEngine for LeafletEngine {
    type Normalizer = LatLngArray;
    type Options = LeafletOptions;

    const PROVIDER: Provider = Provider::Leaflet;
    const MISSING_LIBRARY: MissingLibraryPolicy = MissingLibraryPolicy::Fail;

    fn library(_options: &LeafletOptions, _widget: WidgetId) -> LibrarySpec {
        LibrarySpec::new(Provider::Leaflet, "L")
            .style(format!(
                "https://unpkg.com/leaflet@{}/dist/leaflet.css",
                LEAFLET_VERSION
            ))
            .script(format!(
                "https://unpkg.com/leaflet@{}/dist/leaflet.js",
                LEAFLET_VERSION
            ))
    }

    fn create(ctx: &EngineContext, state: &MapState, options: &LeafletOptions) -> Result<Self> {
        log::debug!("Creating Leaflet map on '{}'", ctx.target);
        Ok(Self {
            target: Some(ctx.target.clone()),
            center: LatLngArray::to_engine(state.center()),
            zoom: state.zoom,
            options: options.clone(),
            tile_layers: BaseLayerSet::new(),
            controls: ControlSet::new(STANDARD_CONTROLS),
            marker_group: HashMap::default(),
            index: FeatureIndex::new(),
            hit_tolerance_px: ctx.hit_tolerance_px,
            next_marker: 0,
            click_listeners: 1,
        })
    }

    fn set_base_layer(&mut self, map_type: MapType) -> MapType {
        self.show_tiles(map_type)
    }

    fn set_controls(&mut self, visible: bool) {
        self.controls.set_visible(visible);
    }

    fn set_center(&mut self, center: [f64; 2]) {
        self.center = center;
    }

    fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom;
    }

    fn set_view(&mut self, center: [f64; 2], zoom: u8) {
        self.center = center;
        self.zoom = zoom;
    }

    fn feature_at(&self, coord: [f64; 2]) -> Option<MarkerId> {
        let tolerance = hit_tolerance(self.hit_tolerance_px, self.zoom);
        self.index.hit(LatLngArray::from_engine(coord), tolerance)
    }

    fn on_marker_clicked(&mut self, handle: MarkerId) {
        if let Some(popup) = self
            .marker_group
            .get_mut(&handle)
            .and_then(|m| m.popup.as_mut())
        {
            popup.open = true;
        }
    }

    fn apply_options(&mut self, options: &LeafletOptions, property: &str) {
        self.options = options.clone();

        if property == "attribution" {
            let attribution = options.attribution.clone();
            for (_, layer) in self.tile_layers.iter_mut() {
                layer.spec.attribution = attribution.clone();
            }
            return;
        }

        // provider, url or token changed: rebuild the visible layer
        if let Some(active) = self
            .tile_layers
            .invalidate(|layer, on_map| layer.on_map = on_map)
        {
            self.show_tiles(active);
        }
    }

    fn destroy(&mut self) {
        self.target = None;
        self.marker_group.clear();
        self.index.clear();
        self.click_listeners = 0;
        self.controls.set_visible(false);
        self.tile_layers
            .invalidate(|layer, on_map| layer.on_map = on_map);
    }
}
