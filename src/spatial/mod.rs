pub mod index;

pub use index::FeatureIndex;
