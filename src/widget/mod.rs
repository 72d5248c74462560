//! The provider-agnostic map widget.
//!
//! [`MapWidget`] owns the map state, the marker registry and the engine
//! lifecycle. It is the single place where server commands, property pushes
//! and native clicks are turned into engine calls and outbound events; the
//! engine adapters only translate individual operations.
//!
//! Lifecycle:
//!
//! ```text
//! Unbound --bind--> Bound
//!    |                 |
//!    +--bind--> Loading --complete_load--> Bound
//!    |             |
//!    +--> Failed   +--unbind--> TornDown <--unbind-- Bound
//! ```
//!
//! Everything runs synchronously on the caller's turn. The only suspension
//! point is the [`PendingLoad`] returned while the engine library is fetched.

pub mod dispatch;
pub mod loading;

use crate::{
    core::{
        config::{PendingCommandPolicy, WidgetConfig},
        geo::LatLng,
        state::{MapState, MapType},
    },
    engine::{EngineContext, EngineCoord, MapEngine, MissingLibraryPolicy, ProviderOptions},
    input::events::{MapEvent, NativeClick},
    markers::{
        registry::MarkerRegistry,
        seed::{parse_seed, MarkerSeed},
    },
    traits::{AssetLoader, CoordinateNormalizer, EventSink, HostNode, LogSink},
    MapError, Result,
};
use dispatch::{Command, DispatchOutcome};
use futures::future::AbortHandle;
use loading::{LoadCompletion, LoadToken, PendingLoad, WidgetId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::VecDeque;

/// Observable lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetPhase {
    Unbound,
    Loading,
    Bound,
    /// Configuration or library error; the widget never binds
    Failed,
    /// Terminal
    TornDown,
}

enum Lifecycle<E> {
    Unbound,
    Loading { token: LoadToken, abort: AbortHandle },
    Bound(E),
    Failed,
    TornDown,
}

/// Result of [`MapWidget::bind`]
#[derive(Debug)]
pub enum BindOutcome<'a> {
    /// Engine created synchronously
    Bound,
    /// Engine library is being fetched; drive the future and pass its output
    /// to [`MapWidget::complete_load`]
    Loading(PendingLoad<'a>),
    /// An inline error is shown on the node
    Failed,
    /// The widget was not in the unbound phase
    Rejected,
}

/// Result of a property push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyOutcome {
    Applied,
    /// The property cannot change in the current phase
    Rejected,
    Unknown,
    Invalid,
}

pub struct MapWidget<E: MapEngine> {
    id: WidgetId,
    state: MapState,
    options: E::Options,
    config: WidgetConfig,
    lifecycle: Lifecycle<E>,
    registry: MarkerRegistry<E::Handle>,
    pending: VecDeque<Command>,
    sink: Box<dyn EventSink>,
    seeds: Vec<MarkerSeed>,
}

impl<E: MapEngine> MapWidget<E> {
    pub fn new(state: MapState, options: E::Options) -> Self {
        Self::from_parts(state, options, WidgetConfig::default(), Box::new(LogSink), Vec::new())
    }

    pub(crate) fn from_parts(
        state: MapState,
        options: E::Options,
        config: WidgetConfig,
        sink: Box<dyn EventSink>,
        seeds: Vec<MarkerSeed>,
    ) -> Self {
        Self {
            id: WidgetId::next(),
            state,
            options,
            config,
            lifecycle: Lifecycle::Unbound,
            registry: MarkerRegistry::new(),
            pending: VecDeque::new(),
            sink,
            seeds,
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn phase(&self) -> WidgetPhase {
        match self.lifecycle {
            Lifecycle::Unbound => WidgetPhase::Unbound,
            Lifecycle::Loading { .. } => WidgetPhase::Loading,
            Lifecycle::Bound(_) => WidgetPhase::Bound,
            Lifecycle::Failed => WidgetPhase::Failed,
            Lifecycle::TornDown => WidgetPhase::TornDown,
        }
    }

    pub fn is_bound(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Bound(_))
    }

    pub fn state(&self) -> &MapState {
        &self.state
    }

    pub fn options(&self) -> &E::Options {
        &self.options
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn registry(&self) -> &MarkerRegistry<E::Handle> {
        &self.registry
    }

    /// The live engine, while bound
    pub fn engine(&self) -> Option<&E> {
        match &self.lifecycle {
            Lifecycle::Bound(engine) => Some(engine),
            _ => None,
        }
    }

    /// Commands waiting for the engine to load
    pub fn pending_commands(&self) -> usize {
        self.pending.len()
    }

    pub fn set_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = sink;
    }

    // --- lifecycle -------------------------------------------------------------------------------

    /// Binds the widget to `node`.
    ///
    /// Validates the provider configuration, reads seed markers from the
    /// node and creates the engine right away when its library is present.
    /// Otherwise the engine's missing-library policy decides between
    /// returning a [`PendingLoad`] and failing with an inline error.
    pub fn bind<'a>(
        &mut self,
        node: &mut dyn HostNode,
        loader: &'a dyn AssetLoader,
    ) -> BindOutcome<'a> {
        if !matches!(self.lifecycle, Lifecycle::Unbound) {
            log::warn!(
                "Widget {} cannot bind while {:?}",
                self.id,
                self.phase()
            );
            return BindOutcome::Rejected;
        }

        if let Err(e) = E::check_config(&self.options) {
            self.fail(node, &e);
            return BindOutcome::Failed;
        }

        self.read_seeds(node);

        let library = E::library(&self.options, self.id);
        if loader.is_available(&library) {
            return if self.attach(node) {
                BindOutcome::Bound
            } else {
                BindOutcome::Failed
            };
        }

        match E::MISSING_LIBRARY {
            MissingLibraryPolicy::Fail => {
                self.fail(node, &MapError::EngineUnavailable(E::PROVIDER));
                BindOutcome::Failed
            }
            MissingLibraryPolicy::Load => {
                let token = LoadToken::next();
                log::info!(
                    "Widget {} loading {} library ({} scripts)",
                    self.id,
                    E::PROVIDER,
                    library.scripts.len()
                );
                let (pending, abort) = PendingLoad::new(token, loader.load(library));
                self.lifecycle = Lifecycle::Loading { token, abort };
                BindOutcome::Loading(pending)
            }
        }
    }

    /// Finishes a bind that had to load the engine library.
    ///
    /// Completions from an earlier or cancelled load are ignored. Returns
    /// whether the widget is bound afterwards.
    pub fn complete_load(&mut self, completion: LoadCompletion, node: &mut dyn HostNode) -> bool {
        let current = matches!(
            self.lifecycle,
            Lifecycle::Loading { token, .. } if token == completion.token
        );
        if !current {
            log::debug!(
                "Widget {} ignoring stale load completion ({:?})",
                self.id,
                self.phase()
            );
            return false;
        }

        match completion.result {
            Ok(()) => self.attach(node),
            Err(e) => {
                self.pending.clear();
                self.fail(node, &e);
                false
            }
        }
    }

    /// Tears the widget down: cancels a pending load or releases every
    /// marker and engine object. Terminal.
    pub fn unbind(&mut self) {
        match std::mem::replace(&mut self.lifecycle, Lifecycle::TornDown) {
            Lifecycle::Loading { abort, .. } => {
                abort.abort();
                log::info!("Widget {} unbound during load, load cancelled", self.id);
            }
            Lifecycle::Bound(mut engine) => {
                self.registry.clear(&mut engine);
                engine.destroy();
                log::info!("Widget {} unbound", self.id);
            }
            Lifecycle::TornDown => return,
            Lifecycle::Unbound | Lifecycle::Failed => {
                log::debug!("Widget {} torn down without an engine", self.id);
            }
        }
        self.pending.clear();
        self.seeds.clear();
    }

    fn fail(&mut self, node: &mut dyn HostNode, error: &MapError) {
        log::error!("Widget {} ({}): {}", self.id, E::PROVIDER, error);
        node.show_error(&error.to_string());
        self.lifecycle = Lifecycle::Failed;
    }

    fn read_seeds(&mut self, node: &dyn HostNode) {
        let raw = match node.attribute(&self.config.seed_attribute) {
            Some(raw) => raw,
            None => return,
        };
        match parse_seed(&raw) {
            Ok(seeds) => self.seeds.extend(seeds),
            Err(e) => log::error!(
                "Widget {} ignoring malformed '{}' attribute: {}",
                self.id,
                self.config.seed_attribute,
                e
            ),
        }
    }

    fn attach(&mut self, node: &mut dyn HostNode) -> bool {
        let ctx = EngineContext {
            target: node.node_id(),
            hit_tolerance_px: self.config.hit_tolerance_px,
        };
        let mut engine = match E::create(&ctx, &self.state, &self.options) {
            Ok(engine) => engine,
            Err(e) => {
                self.fail(node, &e);
                return false;
            }
        };

        engine.set_base_layer(self.state.map_type);
        engine.set_controls(self.state.show_controls);
        for seed in std::mem::take(&mut self.seeds) {
            self.registry.add(
                &mut engine,
                seed.position(),
                seed.title.unwrap_or_default(),
                seed.description.unwrap_or_default(),
            );
        }

        self.lifecycle = Lifecycle::Bound(engine);
        log::info!(
            "Widget {} bound to '{}' ({}, {} markers)",
            self.id,
            ctx.target,
            E::PROVIDER,
            self.registry.len()
        );

        if !self.pending.is_empty() {
            log::debug!(
                "Widget {} replaying {} queued commands",
                self.id,
                self.pending.len()
            );
            while let Some(command) = self.pending.pop_front() {
                self.run(command);
            }
        }
        true
    }

    // --- commands --------------------------------------------------------------------------------

    /// Server command entry point. Never fails; problems are logged and
    /// reported through the outcome.
    pub fn service(&mut self, name: &str, args: &Value) -> DispatchOutcome {
        match Command::parse(name, args) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => {
                log::debug!("Widget {} has no handler for '{}'", self.id, name);
                DispatchOutcome::Unknown
            }
            Err(e) => {
                log::warn!("Widget {}: {}", self.id, e);
                DispatchOutcome::Invalid
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> DispatchOutcome {
        match self.phase() {
            WidgetPhase::Bound => {
                self.run(command);
                DispatchOutcome::Applied
            }
            WidgetPhase::Loading => self.defer(command),
            phase => {
                log::debug!(
                    "Widget {} ignoring {} while {:?}",
                    self.id,
                    command.name(),
                    phase
                );
                DispatchOutcome::Ignored
            }
        }
    }

    /// Adds a marker and returns its index when bound
    pub fn add_marker(
        &mut self,
        position: LatLng,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Option<usize> {
        let command = Command::AddMarker {
            position,
            title: title.into(),
            description: description.into(),
        };
        match self.phase() {
            WidgetPhase::Bound => self.run(command),
            _ => {
                self.execute(command);
                None
            }
        }
    }

    pub fn remove_marker(&mut self, index: usize) -> DispatchOutcome {
        self.execute(Command::RemoveMarker {
            index: i64::try_from(index).unwrap_or(i64::MAX),
        })
    }

    pub fn clear_markers(&mut self) -> DispatchOutcome {
        self.execute(Command::ClearMarkers)
    }

    pub fn center_map(&mut self, center: LatLng) -> DispatchOutcome {
        self.execute(Command::CenterMap { center })
    }

    pub fn set_map_view(&mut self, center: LatLng, zoom: u8) -> DispatchOutcome {
        self.execute(Command::SetMapView { center, zoom })
    }

    fn defer(&mut self, command: Command) -> DispatchOutcome {
        if self.config.pending_commands == PendingCommandPolicy::Drop
            || self.config.max_pending_commands == 0
        {
            log::debug!(
                "Widget {} dropping {} while the engine loads",
                self.id,
                command.name()
            );
            return DispatchOutcome::Dropped;
        }

        if self.pending.len() >= self.config.max_pending_commands {
            if let Some(oldest) = self.pending.pop_front() {
                log::warn!(
                    "Widget {} command queue full, dropping queued {}",
                    self.id,
                    oldest.name()
                );
            }
        }
        self.pending.push_back(command);
        DispatchOutcome::Queued
    }

    /// Runs a command against the bound engine; returns the index of an
    /// added marker
    fn run(&mut self, command: Command) -> Option<usize> {
        let engine = match &mut self.lifecycle {
            Lifecycle::Bound(engine) => engine,
            _ => return None,
        };

        match command {
            Command::AddMarker {
                position,
                title,
                description,
            } => return Some(self.registry.add(engine, position, title, description)),
            Command::RemoveMarker { index } => match usize::try_from(index) {
                Ok(index) => {
                    self.registry.remove(engine, index);
                }
                Err(_) => log::debug!("removeMarker({}) ignored", index),
            },
            Command::ClearMarkers => self.registry.clear(engine),
            Command::CenterMap { center } => {
                self.state.set_center(center);
                engine.set_center(E::Normalizer::to_engine(center));
            }
            Command::SetMapView { center, zoom } => {
                self.state.set_center(center);
                self.state.zoom = zoom;
                engine.set_view(E::Normalizer::to_engine(center), zoom);
            }
        }
        None
    }

    // --- properties ------------------------------------------------------------------------------

    pub fn set_latitude(&mut self, latitude: f64) {
        self.state.latitude = latitude;
        let center = E::Normalizer::to_engine(self.state.center());
        if let Lifecycle::Bound(engine) = &mut self.lifecycle {
            engine.set_center(center);
        }
    }

    pub fn set_longitude(&mut self, longitude: f64) {
        self.state.longitude = longitude;
        let center = E::Normalizer::to_engine(self.state.center());
        if let Lifecycle::Bound(engine) = &mut self.lifecycle {
            engine.set_center(center);
        }
    }

    pub fn set_zoom(&mut self, zoom: u8) {
        self.state.zoom = zoom;
        if let Lifecycle::Bound(engine) = &mut self.lifecycle {
            engine.set_zoom(zoom);
        }
    }

    pub fn set_map_type(&mut self, map_type: MapType) {
        self.state.map_type = map_type;
        if let Lifecycle::Bound(engine) = &mut self.lifecycle {
            engine.set_base_layer(map_type);
        }
    }

    pub fn set_show_controls(&mut self, visible: bool) {
        self.state.show_controls = visible;
        if let Lifecycle::Bound(engine) = &mut self.lifecycle {
            engine.set_controls(visible);
        }
    }

    pub fn set_allow_marker_creation_on_click(&mut self, allow: bool) {
        self.state.allow_marker_creation_on_click = allow;
    }

    /// Server property push by wire name
    pub fn set_property(&mut self, name: &str, value: &Value) -> PropertyOutcome {
        match self.try_set_property(name, value) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("Widget {}: {}", self.id, e);
                PropertyOutcome::Invalid
            }
        }
    }

    fn try_set_property(&mut self, name: &str, value: &Value) -> Result<PropertyOutcome> {
        match name {
            "latitude" => self.set_latitude(property(name, value)?),
            "longitude" => self.set_longitude(property(name, value)?),
            "zoom" => {
                let zoom: f64 = property(name, value)?;
                self.set_zoom(zoom.round().clamp(0.0, crate::constants::MAX_ZOOM as f64) as u8);
            }
            "mapType" => self.set_map_type(MapType::from_tag(&property::<String>(name, value)?)),
            "showControls" => self.set_show_controls(property(name, value)?),
            "allowMarkerCreationOnClick" | "allowMarkers" => {
                self.set_allow_marker_creation_on_click(property(name, value)?)
            }
            _ => return self.set_option(name, value),
        }
        Ok(PropertyOutcome::Applied)
    }

    fn set_option(&mut self, name: &str, value: &Value) -> Result<PropertyOutcome> {
        if E::Options::immutable_after_bind(name)
            && matches!(self.phase(), WidgetPhase::Loading | WidgetPhase::Bound)
        {
            log::warn!(
                "Widget {}: '{}' cannot change once the {} map is initialized",
                self.id,
                name,
                E::PROVIDER
            );
            return Ok(PropertyOutcome::Rejected);
        }

        let mut options = self.options.clone();
        if !options.apply(name, value)? {
            log::debug!("Widget {} has no property '{}'", self.id, name);
            return Ok(PropertyOutcome::Unknown);
        }
        self.options = options;
        if let Lifecycle::Bound(engine) = &mut self.lifecycle {
            engine.apply_options(&self.options, name);
        }
        Ok(PropertyOutcome::Applied)
    }

    // --- events ----------------------------------------------------------------------------------

    /// Turns a native engine click into exactly one outbound event.
    ///
    /// A map click that lands on a marker is reported as a marker click.
    /// A plain map click emits `onMapClick` and, when click creation is
    /// enabled, then adds a marker at the clicked position.
    pub fn handle_native_click(
        &mut self,
        click: NativeClick<EngineCoord<E>, E::Handle>,
    ) -> Option<MapEvent> {
        if !self.is_bound() {
            log::debug!("Widget {} ignoring click while {:?}", self.id, self.phase());
            return None;
        }
        let engine = match &mut self.lifecycle {
            Lifecycle::Bound(engine) => engine,
            _ => return None,
        };

        let (hit, coord) = match click {
            NativeClick::Marker { handle } => (Some(handle), None),
            NativeClick::Map { coord } => (engine.feature_at(coord), Some(coord)),
        };

        if let Some(handle) = hit {
            match self.registry.index_of(handle) {
                Some(marker_index) => {
                    engine.on_marker_clicked(handle);
                    let event = MapEvent::MarkerClick { marker_index };
                    self.sink.emit(event.clone());
                    return Some(event);
                }
                None => log::debug!("Widget {} click on released marker {:?}", self.id, handle),
            }
        }

        let coord = coord?;
        let position = E::Normalizer::from_engine(coord);
        let event = MapEvent::MapClick {
            latitude: position.lat,
            longitude: position.lng,
        };
        self.sink.emit(event.clone());

        if self.state.allow_marker_creation_on_click {
            let title = self.config.default_marker_title.clone();
            self.registry.add(engine, position, title, "");
        }
        Some(event)
    }

    /// Simulates a click at a canonical position
    pub fn click_at(&mut self, position: LatLng) -> Option<MapEvent> {
        self.handle_native_click(NativeClick::Map {
            coord: E::Normalizer::to_engine(position),
        })
    }

    /// Simulates a click delivered to the native marker at `index`
    pub fn click_marker(&mut self, index: usize) -> Option<MapEvent> {
        let handle = self.registry.get(index)?.handle;
        self.handle_native_click(NativeClick::Marker { handle })
    }
}

impl<E: MapEngine> Drop for MapWidget<E> {
    fn drop(&mut self) {
        if matches!(self.phase(), WidgetPhase::Bound | WidgetPhase::Loading) {
            self.unbind();
        }
    }
}

fn property<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|e| MapError::InvalidProperty {
        property: name.to_string(),
        reason: e.to_string(),
    })
}
