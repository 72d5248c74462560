//! Server command decoding.
//!
//! Every provider accepts the same five command names with the same
//! argument shapes. Arguments arrive as JSON; the object form is canonical
//! and a few positional shorthands are accepted as well.

use crate::{
    core::{constants::MAX_ZOOM, geo::LatLng},
    MapError, Result,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

pub const ADD_MARKER: &str = "addMarker";
pub const REMOVE_MARKER: &str = "removeMarker";
pub const CLEAR_MARKERS: &str = "clearMarkers";
pub const CENTER_MAP: &str = "centerMap";
pub const SET_MAP_VIEW: &str = "setMapView";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddMarker {
        position: LatLng,
        title: String,
        description: String,
    },
    /// Signed so that negative indices from the wire stay representable;
    /// they are out of range like any other invalid index
    RemoveMarker { index: i64 },
    ClearMarkers,
    CenterMap { center: LatLng },
    SetMapView { center: LatLng, zoom: u8 },
}

/// How the widget handled a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Executed against the bound engine
    Applied,
    /// Held until the engine finishes loading
    Queued,
    /// Discarded while loading under the drop policy
    Dropped,
    /// Widget is not bound (never bound, failed or torn down)
    Ignored,
    /// Command name not recognized
    Unknown,
    /// Arguments could not be decoded
    Invalid,
}

#[derive(Deserialize)]
struct MarkerArgs {
    lat: f64,
    lng: f64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndexArgs {
    Bare(i64),
    Object { index: i64 },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CenterArgs {
    Object { lat: f64, lng: f64 },
    Array([f64; 2]),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ViewArgs {
    Object { lat: f64, lng: f64, zoom: f64 },
    Array([f64; 3]),
}

fn decode<T: DeserializeOwned>(command: &str, args: &Value) -> Result<T> {
    T::deserialize(args).map_err(|e| MapError::InvalidCommand {
        command: command.to_string(),
        reason: e.to_string(),
    })
}

fn zoom_level(zoom: f64) -> u8 {
    zoom.round().clamp(0.0, MAX_ZOOM as f64) as u8
}

impl Command {
    /// Decodes a command. Unknown names yield `Ok(None)`.
    pub fn parse(name: &str, args: &Value) -> Result<Option<Command>> {
        let command = match name {
            ADD_MARKER => {
                let args: MarkerArgs = decode(name, args)?;
                Command::AddMarker {
                    position: LatLng::new(args.lat, args.lng),
                    title: args.title.unwrap_or_default(),
                    description: args.description.unwrap_or_default(),
                }
            }
            REMOVE_MARKER => {
                let index = match decode(name, args)? {
                    IndexArgs::Bare(index) | IndexArgs::Object { index } => index,
                };
                Command::RemoveMarker { index }
            }
            CLEAR_MARKERS => Command::ClearMarkers,
            CENTER_MAP => {
                let center = match decode(name, args)? {
                    CenterArgs::Object { lat, lng } => LatLng::new(lat, lng),
                    CenterArgs::Array([lat, lng]) => LatLng::new(lat, lng),
                };
                Command::CenterMap { center }
            }
            SET_MAP_VIEW => {
                let (center, zoom) = match decode(name, args)? {
                    ViewArgs::Object { lat, lng, zoom } => (LatLng::new(lat, lng), zoom),
                    ViewArgs::Array([lat, lng, zoom]) => (LatLng::new(lat, lng), zoom),
                };
                Command::SetMapView {
                    center,
                    zoom: zoom_level(zoom),
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::AddMarker { .. } => ADD_MARKER,
            Command::RemoveMarker { .. } => REMOVE_MARKER,
            Command::ClearMarkers => CLEAR_MARKERS,
            Command::CenterMap { .. } => CENTER_MAP,
            Command::SetMapView { .. } => SET_MAP_VIEW,
        }
    }
}
