// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use frame_engine::BarcodeFormat;
use frame_engine::constants::{self, app_info};

#[test]
fn test_default_quality_in_range() {
    assert!((0.0..=1.0).contains(&constants::DEFAULT_CAPTURE_QUALITY));
    assert!((0.0..=1.0).contains(&constants::DEFAULT_DEBUG_IMAGE_QUALITY));
}

#[test]
fn test_detection_budget_below_frame_interval() {
    // Leaves headroom at 5 fps and above
    assert!(constants::DEFAULT_DETECTION_BUDGET.as_millis() <= 200);
}

#[test]
fn test_version_strings() {
    assert!(!app_info::version().is_empty());
    assert_eq!(app_info::package_version(), env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_format_names_parse() {
    // Test that every format accepts its wire name
    for format in BarcodeFormat::ALL {
        assert_eq!(format.name().parse::<BarcodeFormat>(), Ok(format));
    }
    assert_eq!("qrcode".parse::<BarcodeFormat>(), Ok(BarcodeFormat::QrCode));
    assert!("Hologram".parse::<BarcodeFormat>().is_err());
}
