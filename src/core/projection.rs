//! Coordinate normalizers for the supported engines.
//!
//! The widget speaks (latitude, longitude) in WGS84 degrees everywhere.
//! OpenLayers wants projected `[x, y]` meters (longitude first), Google
//! Maps takes `{lat, lng}` literals and Leaflet `[lat, lng]` arrays.

use crate::{
    core::{
        constants::{EARTH_RADIUS, TILE_SIZE},
        geo::{LatLng, Point},
    },
    traits::CoordinateNormalizer,
};
use std::f64::consts::PI;

/// EPSG:4326 <-> EPSG:3857, as used by OpenLayers views and geometries
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl CoordinateNormalizer for WebMercator {
    type Coord = Point;

    fn to_engine(position: LatLng) -> Point {
        position.to_mercator()
    }

    fn from_engine(coord: Point) -> LatLng {
        LatLng::from_mercator(coord)
    }
}

impl WebMercator {
    /// Ground size of one screen pixel at the equator at `zoom`, in
    /// projected meters
    pub fn meters_per_pixel(zoom: u8) -> f64 {
        2.0 * PI * EARTH_RADIUS / (TILE_SIZE * 2_f64.powi(zoom as i32))
    }
}

/// Identity mapping onto `{lat, lng}` object literals (Google Maps)
#[derive(Debug, Clone, Copy, Default)]
pub struct LatLngLiteral;

impl CoordinateNormalizer for LatLngLiteral {
    type Coord = LatLng;

    fn to_engine(position: LatLng) -> LatLng {
        position
    }

    fn from_engine(coord: LatLng) -> LatLng {
        coord
    }
}

/// `[lat, lng]` arrays (Leaflet)
#[derive(Debug, Clone, Copy, Default)]
pub struct LatLngArray;

impl CoordinateNormalizer for LatLngArray {
    type Coord = [f64; 2];

    fn to_engine(position: LatLng) -> [f64; 2] {
        [position.lat, position.lng]
    }

    fn from_engine(coord: [f64; 2]) -> LatLng {
        LatLng::new(coord[0], coord[1])
    }
}
