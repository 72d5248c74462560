//! Shared trait abstractions for the seams between the widget and its host
//!
//! The widget never talks to a DOM, a script loader or a server channel
//! directly. Everything outside the synchronization core is reached through
//! the traits in this module.

use crate::{core::geo::LatLng, engine::LibrarySpec, input::events::MapEvent, Result};
use async_trait::async_trait;
use std::fmt::Debug;

/// Converts between canonical (latitude, longitude) pairs and an engine's
/// native coordinate representation.
///
/// This is the only place an axis swap or projection may happen.
/// Implementations are pure and total: out-of-range input passes through.
pub trait CoordinateNormalizer {
    /// Engine-native coordinate
    type Coord: Copy + Debug + PartialEq;

    /// Canonical WGS84 degrees to engine coordinates
    fn to_engine(position: LatLng) -> Self::Coord;

    /// Engine coordinates back to canonical WGS84 degrees
    fn from_engine(coord: Self::Coord) -> LatLng;
}

/// The DOM node (or stand-in) a widget is bound to
pub trait HostNode {
    /// Identifier the engine uses as its render target
    fn node_id(&self) -> String;

    /// Reads an attribute declared on the node
    fn attribute(&self, name: &str) -> Option<String>;

    /// Replaces the node's content with a visible inline error message
    fn show_error(&mut self, message: &str);
}

/// Fetches a mapping engine's script and style assets
#[async_trait(?Send)]
pub trait AssetLoader {
    /// Whether the engine's global namespace is already present
    fn is_available(&self, library: &LibrarySpec) -> bool;

    /// Fetches the library; resolves once it is usable
    async fn load(&self, library: LibrarySpec) -> Result<()>;
}

/// Receives outbound events destined for the server
pub trait EventSink {
    fn emit(&mut self, event: MapEvent);
}

impl EventSink for Vec<MapEvent> {
    fn emit(&mut self, event: MapEvent) {
        self.push(event);
    }
}

impl EventSink for crossbeam_channel::Sender<MapEvent> {
    fn emit(&mut self, event: MapEvent) {
        if let Err(e) = self.send(event) {
            log::warn!("Dropping event {:?}: server channel disconnected", e.0);
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&mut self, event: MapEvent) {
        (**self).emit(event);
    }
}

/// Sink that only logs; used until a real channel is attached
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, event: MapEvent) {
        log::debug!("No event sink attached, discarding {:?}", event);
    }
}
