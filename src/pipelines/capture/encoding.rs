// SPDX-License-Identifier: GPL-3.0-only

//! Still image encoding
//!
//! Compresses canonical buffers into JPEG (with quality control) or PNG
//! (lossless). Runs synchronously on the caller's thread.

use crate::constants::DEFAULT_CAPTURE_QUALITY;
use crate::errors::{EngineError, EngineResult};
use crate::frame::{CanonicalImage, Channels};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder as _};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Supported encoding formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EncodingFormat {
    /// JPEG format (lossy compression)
    #[default]
    Jpeg,
    /// PNG format (lossless compression)
    Png,
}

impl EncodingFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "jpg",
            EncodingFormat::Png => "png",
        }
    }

    /// MIME type used in data URIs
    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodingFormat::Jpeg => "image/jpeg",
            EncodingFormat::Png => "image/png",
        }
    }
}

/// JPEG fidelity in `[0.0, 1.0]`
///
/// Out-of-range values are clamped; NaN falls back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct EncodingQuality(f32);

impl EncodingQuality {
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(DEFAULT_CAPTURE_QUALITY);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f32 {
        self.0
    }

    /// Get JPEG quality value (1-100)
    pub fn jpeg_quality(&self) -> u8 {
        ((self.0 * 100.0).round() as u8).clamp(1, 100)
    }
}

impl Default for EncodingQuality {
    fn default() -> Self {
        Self(DEFAULT_CAPTURE_QUALITY)
    }
}

impl From<f32> for EncodingQuality {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl From<EncodingQuality> for f32 {
    fn from(quality: EncodingQuality) -> Self {
        quality.0
    }
}

/// Encodes canonical buffers
pub struct ImageEncoder;

impl ImageEncoder {
    /// Encode `image` in the requested format
    ///
    /// `quality` only affects JPEG.
    pub fn encode(
        image: &CanonicalImage<'_>,
        format: EncodingFormat,
        quality: EncodingQuality,
    ) -> EngineResult<Vec<u8>> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(EngineError::Resource(format!(
                "cannot encode {}x{} image",
                width, height
            )));
        }

        let color_type = match image.channels() {
            Channels::Luma => ExtendedColorType::L8,
            Channels::Rgb => ExtendedColorType::Rgb8,
        };
        let pixels = image.packed_pixels();

        let data = match format {
            EncodingFormat::Jpeg => Self::encode_jpeg(&pixels, width, height, color_type, quality)?,
            EncodingFormat::Png => Self::encode_png(&pixels, width, height, color_type)?,
        };

        debug!(
            width,
            height,
            format = ?format,
            size = data.len(),
            "Encoding complete"
        );
        Ok(data)
    }

    /// Encode image as JPEG
    fn encode_jpeg(
        pixels: &[u8],
        width: u32,
        height: u32,
        color_type: ExtendedColorType,
        quality: EncodingQuality,
    ) -> EngineResult<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.jpeg_quality());
        encoder.encode(pixels, width, height, color_type)?;
        Ok(buffer)
    }

    /// Encode image as PNG
    fn encode_png(
        pixels: &[u8],
        width: u32,
        height: u32,
        color_type: ExtendedColorType,
    ) -> EngineResult<Vec<u8>> {
        let mut buffer = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut buffer, CompressionType::Fast, FilterType::Adaptive);
        encoder.write_image(pixels, width, height, color_type)?;
        Ok(buffer)
    }
}
