// SPDX-License-Identifier: GPL-3.0-only

//! Symbol decoding tasks
//!
//! Each decoder reads one family of symbologies out of a luma region.
//! [`decode_region`] runs every decoder that handles a requested format, in
//! the order the scan mode calls for, and reports what it found along with
//! whether the region's time slot cut the scan short.

pub mod linear;
pub mod matrix_detector;
pub mod qr_detector;

pub use linear::LinearDecoder;
pub use matrix_detector::MatrixDetector;
pub use qr_detector::QrDetector;

use crate::constants::matrix::FAST_DETECTION_DIMENSION;
use crate::frame::LumaView;
use crate::frame_processor::deadline::Deadline;
use crate::frame_processor::types::{Barcode, BarcodeFormat, FormatSet};
use tracing::trace;

/// What a decoder is asked to find in one region
#[derive(Debug, Clone, Copy)]
pub struct DecodeRequest {
    pub formats: FormatSet,
    /// More scan lines, rotated passes and a finer matrix search
    pub accurate: bool,
    /// Keep going after the first hit
    pub multiple: bool,
}

/// How a decoder pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Completed,
    /// The slot ran out before every unit of work was tried
    Truncated,
}

/// A reader for one family of symbologies
///
/// Implementations hold no per-call state, so one instance can serve
/// concurrent detection calls.
pub trait SymbolDecoder: Send + Sync {
    fn name(&self) -> &'static str;

    /// True if this decoder can read any format in `formats`
    fn handles(&self, formats: &FormatSet) -> bool;

    /// Append every barcode found in `luma` to `found`
    ///
    /// The first unit of work always runs; `slot` is checked before each
    /// one after it. Corner points are relative to the view's origin.
    fn decode(
        &self,
        luma: &LumaView<'_>,
        request: &DecodeRequest,
        slot: &Deadline,
        found: &mut Vec<Barcode>,
    ) -> ScanStatus;
}

static QR_FAST: QrDetector = QrDetector::with_max_dimension(FAST_DETECTION_DIMENSION);
static QR_ACCURATE: QrDetector = QrDetector::new();
static MATRIX_FAST: MatrixDetector = MatrixDetector::with_max_dimension(FAST_DETECTION_DIMENSION);
static MATRIX_ACCURATE: MatrixDetector = MatrixDetector::new();
static LINEAR: LinearDecoder = LinearDecoder;

/// Decoders for `request`, in scan order
///
/// Fast scans try the cheap line readers first and search matrix codes on a
/// coarser grid; accurate scans lead with the matrix readers at full
/// resolution.
pub fn decoders_for(request: &DecodeRequest) -> Vec<&'static dyn SymbolDecoder> {
    let ordered: [&'static dyn SymbolDecoder; 3] = if request.accurate {
        [&QR_ACCURATE, &MATRIX_ACCURATE, &LINEAR]
    } else {
        [&LINEAR, &QR_FAST, &MATRIX_FAST]
    };
    ordered
        .into_iter()
        .filter(|decoder| decoder.handles(&request.formats))
        .collect()
}

/// True if some decoder can read `format`
pub fn supports(format: BarcodeFormat) -> bool {
    let formats: FormatSet = [format].into_iter().collect();
    [&QR_ACCURATE as &dyn SymbolDecoder, &MATRIX_ACCURATE, &LINEAR]
        .iter()
        .any(|decoder| decoder.handles(&formats))
}

/// Integer sampling step that brings a `width` x `height` region under
/// `max_dimension` on its longer side
pub(crate) fn sampling_step(max_dimension: u32, width: u32, height: u32) -> usize {
    let largest = width.max(height);
    largest.div_ceil(max_dimension.max(1)).max(1) as usize
}

/// Barcodes found in one region
#[derive(Debug, Default)]
pub struct RegionScan {
    pub barcodes: Vec<Barcode>,
    /// Some decoder was cut short or skipped
    pub truncated: bool,
}

/// Run every applicable decoder over one region
///
/// Each decoder gets an equal share of what is left of `slot`. The first
/// decoder always runs; later ones are skipped once the slot is spent.
pub fn decode_region(
    luma: &LumaView<'_>,
    request: &DecodeRequest,
    slot: &Deadline,
) -> RegionScan {
    let mut scan = RegionScan::default();
    let decoders = decoders_for(request);
    let count = decoders.len();

    for (index, decoder) in decoders.into_iter().enumerate() {
        if index > 0 && slot.expired() {
            trace!(skipped = count - index, "Region slot spent, skipping decoders");
            scan.truncated = true;
            break;
        }

        let share = slot.share(count - index);
        let before = scan.barcodes.len();
        let status = decoder.decode(luma, request, &share, &mut scan.barcodes);
        trace!(
            decoder = decoder.name(),
            found = scan.barcodes.len() - before,
            ?status,
            "Decoder pass finished"
        );

        if status == ScanStatus::Truncated {
            scan.truncated = true;
        }
        if !request.multiple && !scan.barcodes.is_empty() {
            break;
        }
    }

    scan
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request(formats: &[BarcodeFormat], accurate: bool) -> DecodeRequest {
        DecodeRequest {
            formats: formats.iter().copied().collect(),
            accurate,
            multiple: false,
        }
    }

    fn names(request: &DecodeRequest) -> Vec<&'static str> {
        decoders_for(request).iter().map(|d| d.name()).collect()
    }

    #[test]
    fn test_decoder_order_follows_mode() {
        let formats = [BarcodeFormat::QrCode, BarcodeFormat::Aztec, BarcodeFormat::Code128];
        assert_eq!(names(&request(&formats, false)), vec!["linear", "qr", "matrix"]);
        assert_eq!(names(&request(&formats, true)), vec!["qr", "matrix", "linear"]);
    }

    #[test]
    fn test_add_on_alone_has_no_decoder() {
        let formats = [BarcodeFormat::UpcEanExtension];
        assert!(decoders_for(&request(&formats, true)).is_empty());
    }

    #[test]
    fn test_supported_formats() {
        for format in BarcodeFormat::ALL {
            let expected = format != BarcodeFormat::UpcEanExtension;
            assert_eq!(supports(format), expected, "{format}");
        }
    }

    #[test]
    fn test_sampling_step() {
        assert_eq!(sampling_step(640, 640, 480), 1);
        assert_eq!(sampling_step(640, 1920, 1080), 3);
        assert_eq!(sampling_step(640, 641, 10), 2);
        assert_eq!(sampling_step(0, 10, 10), 10);
    }

    #[test]
    fn test_blank_region_finds_nothing() {
        let data = vec![255u8; 64 * 64];
        let luma = LumaView::new(&data, 64, 64, 64).unwrap();
        let scan = decode_region(
            &luma,
            &request(&[BarcodeFormat::QrCode, BarcodeFormat::Ean13], false),
            &Deadline::start(Duration::from_secs(60)),
        );
        assert!(scan.barcodes.is_empty());
        assert!(!scan.truncated);
    }

    #[test]
    fn test_spent_slot_truncates_scan() {
        let data = vec![255u8; 64 * 64];
        let luma = LumaView::new(&data, 64, 64, 64).unwrap();
        let scan = decode_region(
            &luma,
            &request(&[BarcodeFormat::QrCode, BarcodeFormat::Code128], false),
            &Deadline::start(Duration::ZERO),
        );
        assert!(scan.truncated);
        assert!(scan.barcodes.is_empty());
    }

    #[test]
    fn test_spent_slot_still_reads_first_line() {
        use linear::{code128, testing::paint_line};

        // Code 128 "A1" on every row; only the middle row is read
        let line = paint_line(&code128::testing::encode(&[104, 33, 17]), 10, 2);
        let (width, height) = (line.len(), 32usize);
        let canvas: Vec<u8> = line.iter().copied().cycle().take(width * height).collect();
        let luma = LumaView::new(&canvas, width as u32, height as u32, width).unwrap();

        let scan = decode_region(
            &luma,
            &request(&[BarcodeFormat::Code128, BarcodeFormat::QrCode], false),
            &Deadline::start(Duration::ZERO),
        );
        assert_eq!(scan.barcodes.len(), 1);
        assert_eq!(scan.barcodes[0].text, "A1");
        assert_eq!(scan.barcodes[0].corner_points[0].y, 16.0);
    }
}
