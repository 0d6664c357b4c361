use serde::{Deserialize, Serialize};

use crate::board::history::DEFAULT_CAPACITY;

/// Runtime preferences from `.corkboard/config.toml`.
///
/// Every field has a default so a partial or missing file still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Snapshots kept for undo/redo.
    pub history_capacity: usize,
    /// Cells the pointer must travel before a column header drag starts.
    pub column_drag_threshold: u16,
    /// Interval between drag frames in the TUI loop.
    pub frame_interval_ms: u64,
    /// Save the board after every mutation.
    pub autosave: bool,
    /// Rows a card occupies in the board view, borders included.
    pub card_height: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            column_drag_threshold: 2,
            frame_interval_ms: 16,
            autosave: true,
            card_height: 4,
        }
    }
}
