//! Editor configuration
//!
//! Shape metrics, label offsets, zoom limits and history settings. Every field
//! has a default, so a JSON override only needs the keys it changes.

use serde::{Deserialize, Serialize};

use super::DiagramError;

/// Storage slot used by the browser editor
pub const DEFAULT_STORAGE_KEY: &str = "er-diagram-v2";

/// Tunable constants shared by the state manager and the geometry engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub grid_size: f64,
    pub entity_width: f64,
    pub entity_min_height: f64,
    pub entity_padding: f64,
    pub entity_header_height: f64,
    pub attribute_height: f64,
    pub association_width: f64,
    pub association_min_height: f64,
    pub association_padding: f64,
    pub association_header_height: f64,
    pub association_attribute_height: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
    pub zoom_step: f64,
    /// Distance from the entity edge back along the line to the cardinality label
    pub cardinality_offset: f64,
    /// Perpendicular nudge applied to connection labels
    pub label_offset: f64,
    /// Control point rotation for self-association curves, in degrees
    pub self_association_angle: f64,
    pub double_click_ms: u64,
    pub history_capacity: usize,
    /// Offset applied to pasted copies
    pub paste_offset: f64,
    pub snap_to_grid: bool,
    pub storage_key: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: 20.0,
            entity_width: 220.0,
            entity_min_height: 100.0,
            entity_padding: 12.0,
            entity_header_height: 40.0,
            attribute_height: 28.0,
            association_width: 160.0,
            association_min_height: 100.0,
            association_padding: 12.0,
            association_header_height: 30.0,
            association_attribute_height: 24.0,
            canvas_width: 3000.0,
            canvas_height: 2000.0,
            zoom_min: 0.2,
            zoom_max: 3.0,
            zoom_step: 0.1,
            cardinality_offset: 35.0,
            label_offset: 15.0,
            self_association_angle: 60.0,
            double_click_ms: 300,
            history_capacity: 50,
            paste_offset: 50.0,
            snap_to_grid: false,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl EditorConfig {
    /// Load a configuration from JSON, falling back to defaults for missing keys
    pub fn from_json(json: &str) -> Result<Self, DiagramError> {
        serde_json::from_str(json).map_err(|e| DiagramError::deserialize_error(e.to_string()))
    }

    /// Builder-style toggle for grid snapping
    pub fn with_snap_to_grid(mut self, enabled: bool) -> Self {
        self.snap_to_grid = enabled;
        self
    }
}

/// Canvas zoom level clamped to the configured range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    scale: f64,
    min: f64,
    max: f64,
    step: f64,
}

impl Zoom {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            scale: 1.0,
            min: config.zoom_min,
            max: config.zoom_max,
            step: config.zoom_step,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Percentage shown in the toolbar
    pub fn percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    pub fn set(&mut self, scale: f64) -> f64 {
        self.scale = scale.clamp(self.min, self.max);
        self.scale
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set(self.scale + self.step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set(self.scale - self.step)
    }

    pub fn reset(&mut self) -> f64 {
        self.set(1.0)
    }

    /// Wheel zoom: negative delta zooms in, positive zooms out
    pub fn wheel(&mut self, delta_y: f64) -> f64 {
        if delta_y > 0.0 {
            self.zoom_out()
        } else {
            self.zoom_in()
        }
    }
}
