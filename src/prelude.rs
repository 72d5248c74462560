//! Prelude module for common mapbridge types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapbridge::prelude::*;`

pub use crate::core::{
    builder::MapWidgetBuilder,
    config::{PendingCommandPolicy, WidgetConfig},
    geo::{LatLng, Point},
    projection::{LatLngArray, LatLngLiteral, WebMercator},
    state::{MapState, MapType},
};

pub use crate::engine::{
    google::{GoogleMapsEngine, GoogleMapsOptions},
    leaflet::{LeafletEngine, LeafletOptions},
    openlayers::{OpenLayersEngine, OpenLayersOptions},
    EngineContext, EngineCoord, LibrarySpec, MapEngine, MissingLibraryPolicy, Provider,
    ProviderOptions,
};

pub use crate::host::{HeadlessNode, PreloadedLoader};

pub use crate::input::events::{MapEvent, NativeClick};

pub use crate::layers::{
    base::BaseLayerSet,
    controls::{Control, ControlSet},
    tile::{TileProvider, TileSourceSpec},
};

pub use crate::markers::{
    registry::{MarkerBackend, MarkerRecord, MarkerRegistry, MarkerSpec},
    seed::MarkerSeed,
};

pub use crate::spatial::index::FeatureIndex;

pub use crate::traits::{AssetLoader, CoordinateNormalizer, EventSink, HostNode};

pub use crate::widget::{
    dispatch::{Command, DispatchOutcome},
    loading::{LoadCompletion, LoadToken, PendingLoad, WidgetId},
    BindOutcome, MapWidget, PropertyOutcome, WidgetPhase,
};

pub use crate::{Error as MapError, Result};

pub use fxhash::FxHashMap as HashMap;
