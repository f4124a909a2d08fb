// SPDX-License-Identifier: GPL-3.0-only

//! Scanner configuration handling

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants::{detection, timing};
use crate::errors::{ScanError, ScanResult};

/// Scanner configuration
///
/// Loaded from a JSON file or built from defaults; every field has a
/// sensible default so partial files work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Maximum processing dimension; larger frames are downscaled
    pub max_dimension: u32,
    /// Frame rate for the stream demo source
    pub stream_fps: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_dimension: detection::MAX_DIMENSION,
            stream_fps: timing::DEFAULT_STREAM_FPS,
        }
    }
}

impl ScannerConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ScanResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| ScanError::Config(format!("{}: {}", path.display(), e)))
    }
}
