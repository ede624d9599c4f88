// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for frame capture and barcode detection
//!
//! Both pipelines run synchronously on the caller's thread and only borrow
//! the frame for the duration of the call.
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌────────────────┐
//! │ Camera Frame │ ──▶ │ Capture Pipeline  │ ──▶ │ CaptureResult  │
//! │ (any format) │     │  - to RGB / luma  │     │  (JPEG / PNG,  │
//! │              │     │  - Encoding       │     │   base64)      │
//! └──────────────┘     └───────────────────┘     └────────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌─────────────────┐
//! │ Camera Frame │ ──▶ │ Detection Pipeline│ ──▶ │ DetectionResult │
//! │ (any format) │     │  - to luma        │     │  (barcodes,     │
//! │              │     │  - Regions        │     │   geometry)     │
//! │              │     │  - Decoders       │     │                 │
//! └──────────────┘     └───────────────────┘     └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`capture`]: Frame encoding to JPEG/PNG with base64 packing
//! - [`detection`]: Barcode detection over whole frames or quadrants

pub mod capture;
pub mod detection;

use crate::errors::{EngineError, EngineResult};
use std::panic::{self, AssertUnwindSafe};

/// Run a pipeline, turning a panic into [`EngineError::Panicked`]
///
/// Pipelines only touch call-local state and borrowed input.
pub(crate) fn guarded<T>(pipeline: impl FnOnce() -> EngineResult<T>) -> EngineResult<T> {
    panic::catch_unwind(AssertUnwindSafe(pipeline))
        .unwrap_or_else(|payload| Err(EngineError::from_panic(payload)))
}
