//! Editor commands.

use serde::{Deserialize, Serialize};

use super::Handle;
use crate::error::Result;
use crate::model::{RegionId, TextStyle};

/// One user gesture, as data.
///
/// Commands serialize as internally tagged JSON, e.g.
/// `{"command": "toggle_active", "id": {"page": 1, "index": 0}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Make `id` the style-edit target.
    Select {
        /// Region to select
        id: RegionId,
    },

    /// Drop the current selection.
    ClearSelection,

    /// Flip a region between active and inactive.
    ToggleActive {
        /// Region to toggle
        id: RegionId,
    },

    /// Flip a region between text and image.
    Reclassify {
        /// Region to reclassify
        id: RegionId,
    },

    /// Drag a corner handle by `(dx, dy)` pixels.
    Resize {
        /// Region to resize
        id: RegionId,
        /// Handle being dragged
        handle: Handle,
        /// Horizontal drag distance
        dx: f32,
        /// Vertical drag distance
        dy: f32,
    },

    /// Replace the style of the selected text region.
    SetStyle {
        /// New style
        style: TextStyle,
    },

    /// Overwrite the style of every text region on every page.
    ApplyStyleGlobally {
        /// Style to broadcast
        style: TextStyle,
    },

    /// Broadcast the selected text region's style to every text region.
    BroadcastSelectedStyle,
}

impl Command {
    /// Whether the command can change the document.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Command::Select { .. } | Command::ClearSelection)
    }

    /// Parse a JSON array of commands.
    pub fn parse_batch(json: &str) -> Result<Vec<Command>> {
        Ok(serde_json::from_str(json)?)
    }
}
