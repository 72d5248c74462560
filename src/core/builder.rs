//! Widget builder for fluent configuration
//!
//! This module provides a MapWidgetBuilder that assembles the initial map
//! state, provider options, widget behaviour and event sink of a
//! [`MapWidget`] before it is bound.

use crate::{
    core::{
        config::{PendingCommandPolicy, WidgetConfig},
        geo::LatLng,
        state::{MapState, MapType},
    },
    engine::MapEngine,
    markers::seed::MarkerSeed,
    traits::{EventSink, LogSink},
    widget::MapWidget,
};

/// Builder for creating and configuring MapWidget instances
pub struct MapWidgetBuilder<E: MapEngine> {
    /// Initial viewport and interaction flags
    state: MapState,
    /// Provider-specific options
    options: E::Options,
    /// Widget behaviour
    config: WidgetConfig,
    /// Receiver of outbound events
    sink: Option<Box<dyn EventSink>>,
    /// Markers present as soon as the engine exists
    seeds: Vec<MarkerSeed>,
}

impl<E: MapEngine> MapWidgetBuilder<E> {
    /// Create a new MapWidgetBuilder with default settings
    pub fn new() -> Self {
        Self {
            state: MapState::default(),
            options: E::Options::default(),
            config: WidgetConfig::default(),
            sink: None,
            seeds: Vec::new(),
        }
    }

    /// Start from a complete state, e.g. one deserialized from the server
    pub fn with_state(mut self, state: MapState) -> Self {
        self.state = state;
        self
    }

    /// Set the initial center
    pub fn with_center(mut self, center: LatLng) -> Self {
        self.state.set_center(center);
        self
    }

    /// Set the initial center and zoom level
    pub fn with_center_and_zoom(mut self, center: LatLng, zoom: u8) -> Self {
        self.state.set_center(center);
        self.state.zoom = zoom;
        self
    }

    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.state.zoom = zoom;
        self
    }

    pub fn with_map_type(mut self, map_type: MapType) -> Self {
        self.state.map_type = map_type;
        self
    }

    /// Show or hide the standard control set
    pub fn with_controls(mut self, visible: bool) -> Self {
        self.state.show_controls = visible;
        self
    }

    /// Enable or disable marker creation on map click
    pub fn with_marker_creation_on_click(mut self, enabled: bool) -> Self {
        self.state.allow_marker_creation_on_click = enabled;
        self
    }

    /// Set the provider options
    pub fn with_options(mut self, options: E::Options) -> Self {
        self.options = options;
        self
    }

    pub fn with_config(mut self, config: WidgetConfig) -> Self {
        self.config = config;
        self
    }

    /// Choose how commands received during engine loading are handled
    pub fn with_pending_commands(mut self, policy: PendingCommandPolicy) -> Self {
        self.config.pending_commands = policy;
        self
    }

    /// Set the click radius used for marker hit testing
    pub fn with_hit_tolerance(mut self, pixels: f64) -> Self {
        self.config.hit_tolerance_px = pixels;
        self
    }

    /// Set where outbound events go
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Add a marker created when the engine binds
    pub fn with_marker(mut self, seed: MarkerSeed) -> Self {
        self.seeds.push(seed);
        self
    }

    pub fn with_markers(mut self, seeds: impl IntoIterator<Item = MarkerSeed>) -> Self {
        self.seeds.extend(seeds);
        self
    }

    /// Build the unbound widget
    pub fn build(self) -> MapWidget<E> {
        let sink: Box<dyn EventSink> = match self.sink {
            Some(sink) => sink,
            None => Box::new(LogSink),
        };
        MapWidget::from_parts(self.state, self.options, self.config, sink, self.seeds)
    }
}

impl<E: MapEngine> Default for MapWidgetBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}
