// SPDX-License-Identifier: GPL-3.0-only

//! Merging per-region results
//!
//! Barcodes arrive in region scan order with region-relative corner points.
//! The aggregator moves them into frame coordinates, drops repeats of a
//! (format, text) pair already seen in an earlier region, and decides when
//! scanning may stop.

use super::regions::RegionBounds;
use crate::frame::CanonicalImage;
use crate::frame_processor::types::{Barcode, BarcodeFormat, DetectionResult};
use crate::pipelines::capture::{EncodingFormat, EncodingQuality, ImageEncoder};
use std::collections::HashSet;
use tracing::{trace, warn};

pub struct ResultAggregator {
    multiple: bool,
    seen: HashSet<(BarcodeFormat, String)>,
    barcodes: Vec<Barcode>,
}

impl ResultAggregator {
    pub fn new(read_multiple: bool) -> Self {
        Self {
            multiple: read_multiple,
            seen: HashSet::new(),
            barcodes: Vec::new(),
        }
    }

    /// Add one region's barcodes; returns `true` when scanning can stop
    pub fn absorb(&mut self, bounds: &RegionBounds, found: Vec<Barcode>) -> bool {
        for barcode in found {
            if self.done() {
                break;
            }
            let (format, text) = barcode.identity();
            if !self.seen.insert((format, text.to_string())) {
                trace!(%format, text, region = %bounds.kind, "Duplicate barcode suppressed");
                continue;
            }
            self.barcodes
                .push(barcode.offset(bounds.x as f32, bounds.y as f32));
        }
        self.done()
    }

    /// Single-result mode stops at the first barcode
    pub fn done(&self) -> bool {
        !self.multiple && !self.barcodes.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }

    pub fn finish(self, width: u32, height: u32, debug_image: Option<Vec<u8>>) -> DetectionResult {
        DetectionResult {
            barcodes: self.barcodes,
            width,
            height,
            debug_image,
        }
    }
}

/// JPEG preview of the analysed frame
///
/// A failed preview never fails the detection call.
pub fn debug_image(canonical: &CanonicalImage<'_>, quality: f32) -> Option<Vec<u8>> {
    match ImageEncoder::encode(canonical, EncodingFormat::Jpeg, EncodingQuality::new(quality)) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(error = %e, "Failed to encode debug image");
            None
        }
    }
}
