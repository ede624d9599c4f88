// SPDX-License-Identifier: GPL-3.0-only

//! Barcode detection pipeline
//!
//! ```text
//! Frame → luma → regions → symbol decoders → aggregator → DetectionResult
//! ```
//!
//! One call walks `Idle → Converting → Partitioning → Decoding → Aggregating
//! → Done` with everything held on the stack, so concurrent calls share
//! nothing but the stateless decoder tables.

pub mod aggregate;
pub mod regions;

pub use aggregate::ResultAggregator;
pub use regions::{RegionBounds, RegionKind, Regions};

use crate::config::EngineConfig;
use crate::errors::{EngineError, EngineResult};
use crate::frame::{Frame, PixelBufferAdapter};
use crate::frame_processor::deadline::Deadline;
use crate::frame_processor::tasks::{self, DecodeRequest};
use crate::frame_processor::types::{BarcodeFormat, DetectionOptions, DetectionResult, FormatSet};
use std::fmt;
use tracing::{debug, trace};

/// Stage of one detection call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Converting,
    Partitioning,
    Decoding,
    Aggregating,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Run the detection pipeline on one frame
///
/// The budget is split evenly over the regions still to scan, and the
/// first unit of work in a region always runs. Returns `BudgetExceeded` only
/// when the budget was spent before the first region started; a scan cut
/// short later returns what it found, which may be nothing.
pub fn detect(
    frame: &Frame<'_>,
    formats: &[BarcodeFormat],
    options: &DetectionOptions,
    config: &EngineConfig,
) -> EngineResult<DetectionResult> {
    let deadline = Deadline::start(config.detection_budget());
    let mut stage = Stage::Idle;
    let mut advance = |next: Stage| {
        let elapsed_us = deadline.elapsed().as_micros() as u64;
        trace!(from = %stage, to = %next, elapsed_us, "Detection stage");
        stage = next;
    };

    advance(Stage::Converting);
    let canonical = PixelBufferAdapter::to_luma(frame)?;
    let luma = canonical
        .luma_view()
        .ok_or_else(|| EngineError::Resource("canonical luma buffer is not addressable".into()))?;

    let requested: FormatSet = formats.iter().copied().collect();
    let unsupported: Vec<&str> = requested
        .iter()
        .filter(|format| !tasks::supports(*format))
        .map(|format| format.name())
        .collect();
    if !unsupported.is_empty() {
        debug!(formats = ?unsupported, "No reader for requested formats, skipping them");
    }

    let request = DecodeRequest {
        formats: requested,
        accurate: options.accurate,
        multiple: options.read_multiple,
    };
    let mut aggregator = ResultAggregator::new(options.read_multiple);
    let mut budget_exceeded = false;
    let mut truncated = false;

    if tasks::decoders_for(&request).is_empty() {
        debug!("Nothing to decode");
    } else {
        advance(Stage::Partitioning);
        let regions: Vec<_> = Regions::new(luma, options.read_by_quadrant).collect();
        let count = regions.len();

        advance(Stage::Decoding);
        for (index, (bounds, view)) in regions.into_iter().enumerate() {
            if deadline.expired() {
                budget_exceeded = index == 0;
                truncated = true;
                trace!(skipped = count - index, "Budget spent, skipping regions");
                break;
            }

            let slot = deadline.share(count - index);
            let scan = tasks::decode_region(&view, &request, &slot);
            trace!(
                region = %bounds.kind,
                x = bounds.x,
                y = bounds.y,
                width = bounds.width,
                height = bounds.height,
                found = scan.barcodes.len(),
                truncated = scan.truncated,
                "Region scanned"
            );

            truncated |= scan.truncated;
            if aggregator.absorb(&bounds, scan.barcodes) {
                break;
            }
        }
    }

    if budget_exceeded && aggregator.is_empty() {
        return Err(EngineError::BudgetExceeded {
            budget: deadline.budget(),
            elapsed: deadline.elapsed(),
        });
    }

    advance(Stage::Aggregating);
    let debug_image = if config.attach_debug_image {
        aggregate::debug_image(&canonical, config.debug_image_quality)
    } else {
        None
    };
    let result = aggregator.finish(canonical.width(), canonical.height(), debug_image);

    advance(Stage::Done);
    debug!(
        width = result.width,
        height = result.height,
        source = %frame.format,
        found = result.barcodes.len(),
        truncated,
        elapsed_us = deadline.elapsed().as_micros() as u64,
        "Detection finished"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::frame::PixelFormat;
    use std::time::Duration;

    fn relaxed() -> EngineConfig {
        EngineConfig::default().with_detection_budget(Duration::from_secs(60))
    }

    #[test]
    fn test_blank_frame_gives_empty_result() {
        let gray = vec![255u8; 64 * 48];
        let frame = Frame::packed(&gray, 64, 48, 64, PixelFormat::Gray8);
        let result = detect(
            &frame,
            &[BarcodeFormat::QrCode, BarcodeFormat::Code128],
            &DetectionOptions::default(),
            &relaxed(),
        )
        .unwrap();
        assert!(result.barcodes.is_empty());
        assert_eq!((result.width, result.height), (64, 48));
        assert!(result.debug_image.is_none());
    }

    #[test]
    fn test_formats_without_reader_give_empty_result() {
        let gray = vec![255u8; 16 * 16];
        let frame = Frame::packed(&gray, 16, 16, 16, PixelFormat::Gray8);
        let config = EngineConfig::default().with_detection_budget(Duration::ZERO);
        let result = detect(
            &frame,
            &[BarcodeFormat::UpcEanExtension],
            &DetectionOptions::default(),
            &config,
        )
        .unwrap();
        assert!(result.barcodes.is_empty());
    }

    #[test]
    fn test_zero_budget_without_results_fails() {
        let gray = vec![255u8; 64 * 48];
        let frame = Frame::packed(&gray, 64, 48, 64, PixelFormat::Gray8);
        let config = EngineConfig::default().with_detection_budget(Duration::ZERO);
        let err = detect(&frame, &[BarcodeFormat::QrCode], &DetectionOptions::default(), &config)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BudgetExceeded);
    }

    #[test]
    fn test_invalid_frame_is_input_error() {
        let gray = vec![0u8; 8];
        let frame = Frame::packed(&gray, 4, 4, 4, PixelFormat::Gray8);
        let err = detect(&frame, &[BarcodeFormat::QrCode], &DetectionOptions::default(), &relaxed())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Input);
    }

    #[test]
    fn test_debug_image_attached_when_enabled() {
        let gray = vec![200u8; 32 * 32];
        let frame = Frame::packed(&gray, 32, 32, 32, PixelFormat::Gray8);
        let config = relaxed().with_debug_image(true);
        let result = detect(&frame, &[BarcodeFormat::QrCode], &DetectionOptions::default(), &config)
            .unwrap();
        let jpeg = result.debug_image.as_deref().unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert!(result.debug_image_base64().unwrap().starts_with("/9j/"));
    }

    #[test]
    fn test_reads_painted_code128_in_quadrant() {
        use crate::frame_processor::tasks::linear::{code128, testing::paint_line};

        let (width, height) = (320usize, 120usize);
        let mut gray = vec![255u8; width * height];
        // "A1" painted into the top-left quadrant only
        let line = paint_line(&code128::testing::encode(&[104, 33, 17]), 10, 2);
        for y in 10..50 {
            gray[y * width..y * width + line.len()].copy_from_slice(&line);
        }
        let frame = Frame::packed(&gray, width as u32, height as u32, width, PixelFormat::Gray8);
        let options = DetectionOptions {
            read_by_quadrant: true,
            read_multiple: true,
            ..Default::default()
        };
        let result = detect(&frame, &[BarcodeFormat::Code128], &options, &relaxed()).unwrap();

        assert_eq!(result.barcodes.len(), 1);
        assert_eq!(result.barcodes[0].text, "A1");
        assert_eq!(result.barcodes[0].format, BarcodeFormat::Code128);
        for point in &result.barcodes[0].corner_points {
            assert!(point.x < 160.0 && point.y < 60.0);
        }
    }
}
