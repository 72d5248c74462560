//! Widget-wide defaults and engine conventions.
//! Keeping them in a single place makes it easier to tweak magic numbers.

/// WGS84 equatorial radius used by Web Mercator (EPSG:3857), in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude at which the square Web Mercator world ends.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Default square tile size in pixels.
pub const TILE_SIZE: f64 = 256.0;

/// Initial map center latitude (Madrid).
pub const DEFAULT_LATITUDE: f64 = 40.4168;

/// Initial map center longitude (Madrid).
pub const DEFAULT_LONGITUDE: f64 = -3.7038;

/// Initial zoom level.
pub const DEFAULT_ZOOM: u8 = 10;

/// Highest zoom level the server side accepts.
pub const MAX_ZOOM: u8 = 20;

/// Pointer radius, in screen pixels, within which a click hits a marker.
/// Matches the rendered marker radius (8px) plus its stroke.
pub const DEFAULT_HIT_TOLERANCE_PX: f64 = 10.0;

/// Title given to markers created by clicking on the map.
pub const DEFAULT_MARKER_TITLE: &str = "New marker";

/// Host node attribute carrying the initial marker list as JSON.
pub const SEED_ATTRIBUTE: &str = "data-markers";

/// Upper bound on commands held while the engine library loads.
pub const DEFAULT_MAX_PENDING_COMMANDS: usize = 256;
