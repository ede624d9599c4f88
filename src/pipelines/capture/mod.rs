// SPDX-License-Identifier: GPL-3.0-only

//! Frame capture pipeline
//!
//! ```text
//! Frame → PixelBufferAdapter → ImageEncoder → base64 packing → CaptureResult
//! ```
//!
//! The frame is only borrowed; the result owns copies of everything it
//! reports.

pub mod encoding;
pub mod packing;

pub use encoding::{EncodingFormat, EncodingQuality, ImageEncoder};

use crate::errors::EngineResult;
use crate::frame::{Frame, PixelBufferAdapter};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Capture options
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureOptions {
    /// Output format
    pub format: EncodingFormat,
    /// JPEG fidelity, ignored for PNG
    pub quality: EncodingQuality,
}

impl CaptureOptions {
    pub fn jpeg(quality: f32) -> Self {
        Self {
            format: EncodingFormat::Jpeg,
            quality: EncodingQuality::new(quality),
        }
    }

    pub fn png() -> Self {
        Self {
            format: EncodingFormat::Png,
            quality: EncodingQuality::default(),
        }
    }
}

/// Encoded frame handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResult {
    /// Compressed image bytes
    #[serde(skip)]
    pub encoded_bytes: Vec<u8>,
    /// Standard base64 of `encoded_bytes`
    pub base64: String,
    pub width: u32,
    pub height: u32,
    /// Byte length of `encoded_bytes`
    pub size: usize,
    pub format: EncodingFormat,
}

impl CaptureResult {
    /// `data:` URI embedding the encoded image
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.format.mime_type(), self.base64)
    }
}

/// Run the capture pipeline on one frame
pub fn capture(frame: &Frame<'_>, options: &CaptureOptions) -> EngineResult<CaptureResult> {
    let start = Instant::now();

    let canonical = PixelBufferAdapter::to_color(frame)?;
    let encoded_bytes = ImageEncoder::encode(&canonical, options.format, options.quality)?;
    let base64 = packing::pack(&encoded_bytes);

    debug!(
        width = frame.width,
        height = frame.height,
        source = %frame.format,
        size = encoded_bytes.len(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "Frame captured"
    );

    Ok(CaptureResult {
        size: encoded_bytes.len(),
        width: canonical.width(),
        height: canonical.height(),
        format: options.format,
        base64,
        encoded_bytes,
    })
}
