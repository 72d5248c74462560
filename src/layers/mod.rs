pub mod base;
pub mod controls;
pub mod tile;

pub use base::BaseLayerSet;
pub use controls::{Control, ControlSet};
pub use tile::{TileProvider, TileSourceSpec};
