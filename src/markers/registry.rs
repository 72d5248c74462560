//! Ordered, index-addressed marker collection.
//!
//! Indices are contiguous from zero. Removing a record shifts every later
//! record down by one, and the new index is pushed to the engine handle so
//! future click events report it.

use crate::{core::geo::LatLng, prelude::HashMap};
use serde::Serialize;
use std::{fmt::Debug, hash::Hash};

/// Semantic marker data handed to the engine when its native marker is built
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MarkerSpec {
    pub title: String,
    pub description: String,
}

impl MarkerSpec {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Engine side of the registry: creates and releases native marker objects
pub trait MarkerBackend {
    /// Opaque engine-native marker reference
    type Handle: Copy + Eq + Ord + Hash + Debug;

    /// Builds a native marker, wires its click handling and returns its handle
    fn create_marker(&mut self, position: LatLng, spec: &MarkerSpec, index: usize)
        -> Self::Handle;

    /// Removes the native marker from the engine
    fn release_marker(&mut self, handle: Self::Handle);

    /// Stores a new index in the native marker's metadata
    fn reindex_marker(&mut self, handle: Self::Handle, index: usize);

    /// Removes every marker; engines with a bulk clear override this
    fn release_all(&mut self, handles: &[Self::Handle]) {
        for handle in handles {
            self.release_marker(*handle);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerRecord<H> {
    pub index: usize,
    pub position: LatLng,
    pub title: String,
    pub description: String,
    #[serde(skip)]
    pub handle: H,
}

/// Markers of one widget, in display order
#[derive(Debug)]
pub struct MarkerRegistry<H> {
    records: Vec<MarkerRecord<H>>,
    /// Reverse lookup used by the click path
    by_handle: HashMap<H, usize>,
}

impl<H: Copy + Eq + Ord + Hash + Debug> MarkerRegistry<H> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            by_handle: HashMap::default(),
        }
    }

    /// Appends a marker and returns its index (the prior length)
    pub fn add<B>(
        &mut self,
        backend: &mut B,
        position: LatLng,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> usize
    where
        B: MarkerBackend<Handle = H> + ?Sized,
    {
        let index = self.records.len();
        let spec = MarkerSpec::new(title, description);
        let handle = backend.create_marker(position, &spec, index);

        self.by_handle.insert(handle, index);
        self.records.push(MarkerRecord {
            index,
            position,
            title: spec.title,
            description: spec.description,
            handle,
        });
        index
    }

    /// Removes the marker at `index` and renumbers the ones after it.
    /// Out-of-range indices are ignored.
    pub fn remove<B>(&mut self, backend: &mut B, index: usize) -> Option<MarkerRecord<H>>
    where
        B: MarkerBackend<Handle = H> + ?Sized,
    {
        if index >= self.records.len() {
            log::debug!(
                "removeMarker({}) ignored, registry holds {} markers",
                index,
                self.records.len()
            );
            return None;
        }

        let removed = self.records.remove(index);
        backend.release_marker(removed.handle);
        self.by_handle.remove(&removed.handle);

        for record in &mut self.records[index..] {
            record.index -= 1;
            backend.reindex_marker(record.handle, record.index);
            self.by_handle.insert(record.handle, record.index);
        }

        Some(removed)
    }

    /// Releases every marker; idempotent
    pub fn clear<B>(&mut self, backend: &mut B)
    where
        B: MarkerBackend<Handle = H> + ?Sized,
    {
        if self.records.is_empty() {
            return;
        }
        let handles: Vec<H> = self.records.iter().map(|r| r.handle).collect();
        backend.release_all(&handles);
        self.records.clear();
        self.by_handle.clear();
    }

    /// Current index of the marker behind `handle`
    pub fn index_of(&self, handle: H) -> Option<usize> {
        self.by_handle.get(&handle).copied()
    }

    pub fn get(&self, index: usize) -> Option<&MarkerRecord<H>> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[MarkerRecord<H>] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &MarkerRecord<H>> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<H: Copy + Eq + Ord + Hash + Debug> Default for MarkerRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}
