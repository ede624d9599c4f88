// SPDX-License-Identifier: GPL-3.0-only

//! Engine configuration
//!
//! Everything here has a default, so an empty JSON object (or no file at all)
//! yields a working engine.

use crate::constants::{DEFAULT_DEBUG_IMAGE_QUALITY, DEFAULT_DETECTION_BUDGET};
use crate::errors::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Wall-clock budget for one detection call, in milliseconds
    pub detection_budget_ms: u64,
    /// Attach a JPEG of the analysed luma buffer to detection results
    pub attach_debug_image: bool,
    /// JPEG fidelity of the debug image, `[0.0, 1.0]`
    pub debug_image_quality: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            detection_budget_ms: DEFAULT_DETECTION_BUDGET.as_millis() as u64,
            attach_debug_image: false,
            debug_image_quality: DEFAULT_DEBUG_IMAGE_QUALITY,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Resource(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| EngineError::Resource(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), ?config, "Loaded engine config");
        Ok(config)
    }

    pub fn detection_budget(&self) -> Duration {
        Duration::from_millis(self.detection_budget_ms)
    }

    pub fn with_detection_budget(mut self, budget: Duration) -> Self {
        self.detection_budget_ms = budget.as_millis() as u64;
        self
    }

    pub fn with_debug_image(mut self, enabled: bool) -> Self {
        self.attach_debug_image = enabled;
        self
    }
}
