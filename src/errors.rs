// SPDX-License-Identifier: MPL-2.0

//! Error types for the frame engine
//!
//! Every failure belongs to one of three classes: the input frame was
//! unusable, an allocation or codec failed mid-pipeline, or the decoder ran
//! out of its time budget. The public facades flatten all of them to `None`;
//! the `try_*` variants keep the cause for logging and tests.

use crate::frame::PixelFormat;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using EngineError
pub type EngineResult<T> = Result<T, EngineError>;

/// Coarse failure class reported by [`EngineError::kind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unsupported frame, detected before processing
    Input,
    /// Allocation, encoder or decoder failure mid-pipeline
    Resource,
    /// Internal time ceiling hit during decoding
    BudgetExceeded,
}

/// Frame shape errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame has zero area ({width}x{height})")]
    ZeroArea { width: u32, height: u32 },

    #[error("{format:?} expects {expected} plane(s), got {found}")]
    PlaneCount {
        format: PixelFormat,
        expected: usize,
        found: usize,
    },

    #[error("plane {plane} stride {stride} is shorter than a {min}-byte row")]
    StrideTooSmall { plane: usize, stride: usize, min: usize },

    #[error("plane {plane} holds {len} bytes, {needed} required")]
    PlaneTooShort { plane: usize, len: usize, needed: usize },

    #[error("frame dimensions overflow addressable memory")]
    Overflow,

    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(String),
}

/// Engine errors surfaced by the `try_*` facades
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid frame: {0}")]
    Input(#[from] FrameError),

    #[error("encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("resource failure: {0}")]
    Resource(String),

    #[error("time budget of {budget:?} exceeded after {elapsed:?}")]
    BudgetExceeded { budget: Duration, elapsed: Duration },

    #[error("pipeline panicked: {0}")]
    Panicked(String),
}

impl EngineError {
    /// Failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Input(_) => ErrorKind::Input,
            EngineError::Encode(_) | EngineError::Resource(_) | EngineError::Panicked(_) => {
                ErrorKind::Resource
            }
            EngineError::BudgetExceeded { .. } => ErrorKind::BudgetExceeded,
        }
    }

    /// Build a `Panicked` error from a `catch_unwind` payload
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        EngineError::Panicked(message)
    }
}
