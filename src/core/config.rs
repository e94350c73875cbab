//! Engine configuration.
//!
//! Everything tunable lives here and is handed to the component that needs
//! it. Debug visualization settings are consumed by the drawing side only.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::Error;
use super::types::Result;

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-transformer defaults.
    pub transformer: TransformerConfig,
    /// Batch (multi-actor) update settings.
    pub batch: BatchConfig,
    /// Debug overlay settings for the drawing collaborator.
    pub debug: DebugConfig,
}

/// Defaults applied by a [`Transformer`](crate::animation::Transformer).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransformerConfig {
    /// `speed` variable seeded into new animation registrations.
    pub default_speed: f32,
    /// Emit a warning when a frame is skipped because the skeleton is invalid.
    pub warn_on_invalid_skeleton: bool,
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            default_speed: 1.0,
            warn_on_invalid_skeleton: true,
        }
    }
}

/// Settings for [`update_all`](crate::animation::batch::update_all).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BatchConfig {
    /// Below this many transformers the batch runs on the calling thread.
    pub min_parallel: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { min_parallel: 4 }
    }
}

/// Debug overlay settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Emit a segment from each parent origin to its child origin.
    pub draw_bones: bool,
    /// Emit per-bone local axes.
    pub draw_axes: bool,
    /// Attach bone names to emitted segments.
    pub draw_names: bool,
    /// Linear RGBA color of bone segments.
    pub bone_color: [f32; 4],
    /// Length of axis segments in world units (before bone scale).
    pub axis_length: f32,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            draw_bones: false,
            draw_axes: false,
            draw_names: false,
            bone_color: [1.0, 0.8, 0.2, 1.0],
            axis_length: 10.0,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Save to file (sync)
    pub fn save_sync(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load from file (sync)
    pub fn load_sync(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
