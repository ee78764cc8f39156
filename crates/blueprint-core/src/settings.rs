//! Editor configuration.

use crate::camera::{MAX_ZOOM, MIN_ZOOM};
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::snap::{GRID_SIZE, SHAPE_SNAP_THRESHOLD, SnapMode};
use serde::{Deserialize, Serialize};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 10;

/// User-tunable editor settings. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub grid_size: f64,
    /// Snap gesture endpoints and single box-selected objects to the grid.
    pub grid_snap: bool,
    pub snap_mode: SnapMode,
    /// Entity snap threshold in screen pixels.
    pub snap_threshold_px: f64,
    pub units: String,
    pub draw_color: String,
    pub thickness: f64,
    pub material: Option<String>,
    pub history_limit: usize,
    pub autosave_interval_secs: u64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            grid_snap: false,
            snap_mode: SnapMode::default(),
            snap_threshold_px: SHAPE_SNAP_THRESHOLD,
            units: "cm".to_string(),
            draw_color: "#000000".to_string(),
            thickness: 2.0,
            material: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl EditorSettings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn snaps_to_grid(&self) -> bool {
        self.grid_snap || self.snap_mode.snaps_to_grid()
    }

    pub fn snaps_to_entities(&self) -> bool {
        self.snap_mode.snaps_to_shapes()
    }
}
