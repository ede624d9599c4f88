// SPDX-License-Identifier: GPL-3.0-only

//! Engine-wide constants

use std::time::Duration;

/// JPEG fidelity used when the caller does not pick one
pub const DEFAULT_CAPTURE_QUALITY: f32 = 0.5;

/// Wall-clock budget for one detection call
pub const DEFAULT_DETECTION_BUDGET: Duration = Duration::from_millis(100);

/// JPEG fidelity of the optional detection debug image
pub const DEFAULT_DEBUG_IMAGE_QUALITY: f32 = 0.5;

/// Linear scanning parameters
pub mod scan {
    /// Rows visited per region in fast mode, alternating outward from the middle
    pub const FAST_SCAN_LINES: usize = 15;

    /// Line spacing in fast mode is `extent >> FAST_ROW_STEP_SHIFT`
    pub const FAST_ROW_STEP_SHIFT: u32 = 5;

    /// Line spacing in accurate mode; every line is visited below 512 pixels
    pub const ACCURATE_ROW_STEP_SHIFT: u32 = 8;

    /// Distinct lines that must agree before a symbology without a strong
    /// checksum is reported
    pub const CONFIRMATIONS_REQUIRED: usize = 2;

    /// Quiet zone, in modules, required on both sides of an EAN/UPC symbol
    pub const UPC_EAN_QUIET_MODULES: u32 = 5;

    /// Black-point histogram resolution (luma >> 3)
    pub const LUMINANCE_BUCKETS: usize = 32;

    /// Max averaged variance accepted when matching a whole EAN/UPC pattern
    pub const UPC_EAN_MAX_AVG_VARIANCE: f32 = 0.48;

    /// Max averaged variance accepted when matching a Code 128 pattern
    pub const CODE128_MAX_AVG_VARIANCE: f32 = 0.25;

    /// Max variance of any single element when matching a pattern
    pub const MAX_INDIVIDUAL_VARIANCE: f32 = 0.7;
}

/// Matrix code parameters
pub mod matrix {
    /// Regions larger than this on either side are sampled down before the
    /// finder-pattern search in accurate mode
    pub const MAX_DETECTION_DIMENSION: u32 = 1280;

    /// Sampling limit for fast scans
    pub const FAST_DETECTION_DIMENSION: u32 = 640;
}

/// Application information
pub mod app_info {
    /// Get the application version from build-time git info
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }

    /// Package version without git decoration
    pub fn package_version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
