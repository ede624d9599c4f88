// SPDX-License-Identifier: GPL-3.0-only

//! Media utilities
//!
//! Pixel format math shared by the capture and detection pipelines.

pub mod conversions;

pub use conversions::{rgb_to_luma, yuv_to_rgb};
