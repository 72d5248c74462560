use crate::{core::geo::LatLng, prelude::HashMap};
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::hash::Hash;

/// A marker position stored in the R-tree
#[derive(Debug, Clone, Copy)]
pub struct IndexedFeature<H> {
    pub handle: H,
    pub position: [f64; 2],
}

impl<H: PartialEq> PartialEq for IndexedFeature<H> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

// --- rstar integration -------------------------------------------------------------------------

impl<H> RTreeObject for IndexedFeature<H> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl<H> PointDistance for IndexedFeature<H> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Key of a position in the index: Web Mercator meters with latitude
/// clamped to the square world, so every key is finite and one meter means
/// the same screen distance in both axes whatever the engine.
pub fn index_key(position: LatLng) -> [f64; 2] {
    LatLng::new(LatLng::clamp_lat(position.lat), position.lng)
        .to_mercator()
        .to_array()
}

/// R-tree over the features an engine has drawn, used to resolve a click
/// position into the feature under the pointer.
///
/// Positions go in as canonical degrees and are stored under
/// [`index_key`]; tolerances are in projected meters.
#[derive(Debug)]
pub struct FeatureIndex<H> {
    rtree: RTree<IndexedFeature<H>>,
    positions: HashMap<H, [f64; 2]>,
}

impl<H: Copy + Eq + Ord + Hash> FeatureIndex<H> {
    pub fn new() -> Self {
        Self {
            rtree: RTree::new(),
            positions: HashMap::default(),
        }
    }

    pub fn insert(&mut self, handle: H, position: LatLng) {
        let position = index_key(position);
        if self.positions.contains_key(&handle) {
            self.remove(handle);
        }
        self.positions.insert(handle, position);
        self.rtree.insert(IndexedFeature { handle, position });
    }

    pub fn remove(&mut self, handle: H) -> bool {
        match self.positions.remove(&handle) {
            Some(position) => self
                .rtree
                .remove(&IndexedFeature { handle, position })
                .is_some(),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
        self.positions.clear();
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Feature closest to `position` within `tolerance`. Equidistant
    /// features resolve to the most recently created one (largest handle),
    /// which is the one drawn on top.
    pub fn hit(&self, position: LatLng, tolerance: f64) -> Option<H> {
        let position = index_key(position);
        // rstar expects the squared radius here
        self.rtree
            .locate_within_distance(position, tolerance * tolerance)
            .map(|f| (f.distance_2(&position), f.handle))
            .min_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.1.cmp(&a.1))
            })
            .map(|(_, handle)| handle)
    }
}

impl<H: Copy + Eq + Ord + Hash> Default for FeatureIndex<H> {
    fn default() -> Self {
        Self::new()
    }
}
