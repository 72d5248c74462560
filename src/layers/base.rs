//! Base-layer selection shared by every engine.
//!
//! Layers are built lazily the first time their map type is requested and
//! kept afterwards, so toggling back is a visibility flip rather than a
//! rebuild. Exactly one entry is active while the map is bound.

use crate::{core::state::MapType, prelude::HashMap};

#[derive(Debug)]
pub struct BaseLayerSet<L> {
    layers: HashMap<MapType, L>,
    active: Option<MapType>,
}

impl<L> BaseLayerSet<L> {
    pub fn new() -> Self {
        Self {
            layers: HashMap::default(),
            active: None,
        }
    }

    /// Activates the layer for `requested`, building it on first use.
    ///
    /// Types the engine does not offer fall back to [`MapType::Standard`].
    /// `toggle` is called with `false` on the previously active layer and
    /// with `true` on the newly active one. Returns the type actually shown.
    pub fn select<S, B, T>(
        &mut self,
        requested: MapType,
        supported: S,
        build: B,
        mut toggle: T,
    ) -> MapType
    where
        S: Fn(MapType) -> bool,
        B: FnOnce(MapType) -> L,
        T: FnMut(&mut L, bool),
    {
        let target = if supported(requested) {
            requested
        } else {
            log::debug!("Map type {} not offered, falling back to standard", requested);
            MapType::Standard
        };

        if self.active == Some(target) {
            return target;
        }

        if let Some(previous) = self.active.take() {
            if let Some(layer) = self.layers.get_mut(&previous) {
                toggle(layer, false);
            }
        }

        let layer = self.layers.entry(target).or_insert_with(|| build(target));
        toggle(layer, true);
        self.active = Some(target);
        target
    }

    /// Deactivates and drops every cached layer, e.g. when the tile source
    /// configuration changes. Returns the type that was active.
    pub fn invalidate<T>(&mut self, mut toggle: T) -> Option<MapType>
    where
        T: FnMut(&mut L, bool),
    {
        let active = self.active.take();
        if let Some(previous) = active {
            if let Some(layer) = self.layers.get_mut(&previous) {
                toggle(layer, false);
            }
        }
        self.layers.clear();
        active
    }

    pub fn active(&self) -> Option<MapType> {
        self.active
    }

    pub fn active_layer(&self) -> Option<&L> {
        self.active.and_then(|t| self.layers.get(&t))
    }

    pub fn get(&self, map_type: MapType) -> Option<&L> {
        self.layers.get(&map_type)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&MapType, &mut L)> {
        self.layers.iter_mut()
    }

    /// Number of layers built so far
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl<L> Default for BaseLayerSet<L> {
    fn default() -> Self {
        Self::new()
    }
}
