//! Widget behaviour configuration
//!
//! Everything here is tunable per widget and deserializable from the same
//! camelCase JSON the server uses for properties.

use crate::core::constants::{
    DEFAULT_HIT_TOLERANCE_PX, DEFAULT_MARKER_TITLE, DEFAULT_MAX_PENDING_COMMANDS, SEED_ATTRIBUTE,
};
use serde::{Deserialize, Serialize};

/// What happens to commands that arrive while the engine library loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingCommandPolicy {
    /// Hold commands and replay them in arrival order once bound
    #[default]
    Queue,
    /// Discard commands, logging each one
    Drop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WidgetConfig {
    pub pending_commands: PendingCommandPolicy,
    /// Queue bound; the oldest command is dropped on overflow
    pub max_pending_commands: usize,
    /// Pointer radius in screen pixels for marker hit testing
    pub hit_tolerance_px: f64,
    /// Title of markers created by map clicks
    pub default_marker_title: String,
    /// Host attribute holding the initial marker list
    pub seed_attribute: String,
}

impl WidgetConfig {
    /// Preset that discards commands received before the engine exists
    pub fn dropping() -> Self {
        Self {
            pending_commands: PendingCommandPolicy::Drop,
            ..Self::default()
        }
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            pending_commands: PendingCommandPolicy::Queue,
            max_pending_commands: DEFAULT_MAX_PENDING_COMMANDS,
            hit_tolerance_px: DEFAULT_HIT_TOLERANCE_PX,
            default_marker_title: DEFAULT_MARKER_TITLE.to_string(),
            seed_attribute: SEED_ATTRIBUTE.to_string(),
        }
    }
}
