// SPDX-License-Identifier: MPL-2.0

//! Frame Engine - per-frame capture encoding and barcode detection
//!
//! This library provides the two operations a camera pipeline runs on every
//! delivered frame: encoding the frame into a JPEG/PNG image with a base64
//! payload, and finding barcodes in it.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`frame`]: Borrowed frames, plane views and canonical buffers
//! - [`media`]: Pixel format color conversion
//! - [`pipelines`]: Capture and detection pipelines
//! - [`frame_processor`]: Barcode types, time budget and symbol decoders
//! - [`config`]: Engine configuration
//!
//! Both entry points are plain synchronous functions. They only borrow the
//! frame and return `None` on any failure; the `try_*` methods on
//! [`FrameEngine`] keep the cause.
//!
//! # Example
//!
//! ```no_run
//! use frame_engine::{BarcodeFormat, CaptureOptions, DetectionOptions, Frame, PixelFormat};
//!
//! let pixels = vec![0u8; 640 * 480 * 4];
//! let frame = Frame::packed(&pixels, 640, 480, 640 * 4, PixelFormat::BGRA);
//!
//! if let Some(photo) = frame_engine::capture_video_frame(&frame, &CaptureOptions::jpeg(0.8)) {
//!     println!("{}", photo.data_uri());
//! }
//!
//! let found = frame_engine::detect_barcodes(
//!     &frame,
//!     &[BarcodeFormat::QrCode, BarcodeFormat::Ean13],
//!     &DetectionOptions::default(),
//! );
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod frame;
pub mod frame_processor;
pub mod media;
pub mod pipelines;

// Re-export commonly used types
pub use config::EngineConfig;
pub use errors::{EngineError, EngineResult, ErrorKind, FrameError};
pub use frame::{Frame, PixelFormat, PlaneView};
pub use frame_processor::{
    Barcode, BarcodeFormat, DetectionOptions, DetectionResult, MetadataKey, MetadataValue, Point,
};
pub use pipelines::capture::{CaptureOptions, CaptureResult, EncodingFormat, EncodingQuality};

use tracing::{debug, warn};

/// Entry point holding the engine configuration
///
/// Holds no per-call state; one engine can be shared by any number of
/// threads calling into it at frame rate.
#[derive(Debug, Clone, Default)]
pub struct FrameEngine {
    config: EngineConfig,
}

impl FrameEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Encode one frame, keeping the failure cause
    pub fn try_capture(
        &self,
        frame: &Frame<'_>,
        options: &CaptureOptions,
    ) -> EngineResult<CaptureResult> {
        pipelines::guarded(|| pipelines::capture::capture(frame, options))
    }

    /// Encode one frame; `None` on any failure
    pub fn capture_video_frame(
        &self,
        frame: &Frame<'_>,
        options: &CaptureOptions,
    ) -> Option<CaptureResult> {
        match self.try_capture(frame, options) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Frame capture failed");
                None
            }
        }
    }

    /// Detect barcodes in one frame, keeping the failure cause
    pub fn try_detect(
        &self,
        frame: &Frame<'_>,
        formats: &[BarcodeFormat],
        options: &DetectionOptions,
    ) -> EngineResult<DetectionResult> {
        pipelines::guarded(|| pipelines::detection::detect(frame, formats, options, &self.config))
    }

    /// Detect barcodes in one frame; `None` on failure or timeout
    ///
    /// A frame without barcodes yields an empty result, not `None`.
    pub fn detect_barcodes(
        &self,
        frame: &Frame<'_>,
        formats: &[BarcodeFormat],
        options: &DetectionOptions,
    ) -> Option<DetectionResult> {
        match self.try_detect(frame, formats, options) {
            Ok(result) => Some(result),
            Err(e) if e.kind() == ErrorKind::BudgetExceeded => {
                debug!(error = %e, "Barcode detection timed out");
                None
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Barcode detection failed");
                None
            }
        }
    }
}

/// Encode one frame with the default configuration
pub fn capture_video_frame(frame: &Frame<'_>, options: &CaptureOptions) -> Option<CaptureResult> {
    FrameEngine::default().capture_video_frame(frame, options)
}

/// Detect barcodes in one frame with the default configuration
pub fn detect_barcodes(
    frame: &Frame<'_>,
    formats: &[BarcodeFormat],
    options: &DetectionOptions,
) -> Option<DetectionResult> {
    FrameEngine::default().detect_barcodes(frame, formats, options)
}
