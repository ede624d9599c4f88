// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection task
//!
//! Finder-pattern search and decoding are done by the rqrr crate. Large
//! regions are sampled down before the search and grid corners are scaled
//! back, so reported points are always in region pixel coordinates.

use super::{DecodeRequest, ScanStatus, SymbolDecoder, sampling_step};
use crate::constants::matrix::MAX_DETECTION_DIMENSION;
use crate::frame::LumaView;
use crate::frame_processor::deadline::Deadline;
use crate::frame_processor::types::{
    Barcode, BarcodeFormat, FormatSet, MetadataKey, MetadataValue, Point,
};
use std::time::Instant;
use tracing::{debug, trace};

/// QR code detector
pub struct QrDetector {
    /// Maximum dimension for processing (regions are sampled down to this)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new QR detector with default settings
    pub const fn new() -> Self {
        Self {
            max_dimension: MAX_DETECTION_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub const fn with_max_dimension(max_dimension: u32) -> Self {
        Self { max_dimension }
    }
}

impl SymbolDecoder for QrDetector {
    fn name(&self) -> &'static str {
        "qr"
    }

    fn handles(&self, formats: &FormatSet) -> bool {
        formats.contains(BarcodeFormat::QrCode)
    }

    fn decode(
        &self,
        luma: &LumaView<'_>,
        request: &DecodeRequest,
        slot: &Deadline,
        found: &mut Vec<Barcode>,
    ) -> ScanStatus {
        let start = Instant::now();

        let step = sampling_step(self.max_dimension, luma.width(), luma.height());
        let proc_width = (luma.width() as usize).div_ceil(step);
        let proc_height = (luma.height() as usize).div_ceil(step);

        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(proc_width, proc_height, |x, y| {
                luma.get(x * step, y * step)
            });
        if slot.expired() {
            trace!(proc_width, proc_height, step, "QR slot spent after thresholding");
            return ScanStatus::Truncated;
        }

        let grids = prepared.detect_grids();
        trace!(
            proc_width,
            proc_height,
            step,
            grids = grids.len(),
            detection_ms = start.elapsed().as_millis(),
            "QR finder search complete"
        );

        for (index, grid) in grids.into_iter().enumerate() {
            if index > 0 && slot.expired() {
                return ScanStatus::Truncated;
            }

            let mut payload = Vec::new();
            let meta = match grid.decode_to(&mut payload) {
                Ok(meta) => meta,
                Err(e) => {
                    debug!(error = ?e, "Failed to decode QR grid");
                    continue;
                }
            };

            let scale = step as f32;
            let corners = grid
                .bounds
                .iter()
                .map(|p| Point::new(p.x as f32 * scale, p.y as f32 * scale))
                .collect();

            let barcode = qr_barcode(payload, meta.ecc_level, corners);
            debug!(
                content = %barcode.text,
                version = meta.version.0,
                "Detected QR code"
            );
            found.push(barcode);

            if !request.multiple {
                break;
            }
        }

        ScanStatus::Completed
    }
}

/// Error correction level from the two format-information bits
fn ecc_level_name(bits: u16) -> &'static str {
    match bits & 0b11 {
        0 => "M",
        1 => "L",
        2 => "H",
        _ => "Q",
    }
}

fn qr_barcode(payload: Vec<u8>, ecc_level: u16, corners: Vec<Point>) -> Barcode {
    let (text, raw) = match String::from_utf8(payload) {
        Ok(text) => (text, None),
        // Binary payloads keep their bytes; the text falls back to ISO-8859-1
        Err(e) => {
            let bytes = e.into_bytes();
            (bytes.iter().map(|&b| char::from(b)).collect(), Some(bytes))
        }
    };

    let mut barcode = Barcode::new(BarcodeFormat::QrCode, text, corners).with_metadata(
        MetadataKey::ErrorCorrectionLevel,
        MetadataValue::Text(ecc_level_name(ecc_level).to_string()),
    );
    if let Some(bytes) = raw {
        barcode =
            barcode.with_metadata(MetadataKey::ByteSegments, MetadataValue::Bytes(vec![bytes]));
    }
    barcode
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrcode::{Color, EcLevel, QrCode};
    use std::time::Duration;

    /// Paint `code` into a white luma canvas
    fn paint_qr(
        canvas: &mut [u8],
        stride: usize,
        (left, top): (usize, usize),
        module: usize,
        code: &QrCode,
    ) {
        let modules = code.width();
        for my in 0..modules {
            for mx in 0..modules {
                if code[(mx, my)] == Color::Dark {
                    for dy in 0..module {
                        let row = (top + my * module + dy) * stride;
                        for dx in 0..module {
                            canvas[row + left + mx * module + dx] = 0;
                        }
                    }
                }
            }
        }
    }

    fn request() -> DecodeRequest {
        DecodeRequest {
            formats: [BarcodeFormat::QrCode].into_iter().collect(),
            accurate: false,
            multiple: false,
        }
    }

    #[test]
    fn test_ecc_level_names() {
        assert_eq!(ecc_level_name(0), "M");
        assert_eq!(ecc_level_name(1), "L");
        assert_eq!(ecc_level_name(2), "H");
        assert_eq!(ecc_level_name(3), "Q");
    }

    #[test]
    fn test_detects_rendered_code() {
        let code = QrCode::with_error_correction_level(b"frame-engine", EcLevel::Q).unwrap();
        let (width, height) = (200usize, 160usize);
        let mut canvas = vec![255u8; width * height];
        paint_qr(&mut canvas, width, (40, 20), 4, &code);

        let luma = LumaView::new(&canvas, width as u32, height as u32, width).unwrap();
        let mut found = Vec::new();
        let status = QrDetector::new().decode(
            &luma,
            &request(),
            &Deadline::start(Duration::from_secs(60)),
            &mut found,
        );

        assert_eq!(status, ScanStatus::Completed);
        assert_eq!(found.len(), 1);
        let barcode = &found[0];
        assert_eq!(barcode.text, "frame-engine");
        assert_eq!(barcode.corner_points.len(), 4);
        assert_eq!(
            barcode.metadata.get(&MetadataKey::ErrorCorrectionLevel),
            Some(&MetadataValue::Text("Q".into()))
        );
        assert!(!barcode.metadata.contains_key(&MetadataKey::ByteSegments));

        let side = (code.width() * 4) as f32;
        for point in &barcode.corner_points {
            assert!(point.x >= 35.0 && point.x <= 45.0 + side, "x out of range: {point:?}");
            assert!(point.y >= 15.0 && point.y <= 25.0 + side, "y out of range: {point:?}");
        }
    }

    #[test]
    fn test_binary_payload_keeps_byte_segments() {
        let payload = [0xFFu8, 0x00, 0x80, 0x41];
        let barcode = qr_barcode(payload.to_vec(), 1, Vec::new());
        assert_eq!(barcode.text.chars().count(), 4);
        assert_eq!(
            barcode.metadata.get(&MetadataKey::ByteSegments),
            Some(&MetadataValue::Bytes(vec![payload.to_vec()]))
        );
        assert_eq!(
            barcode.metadata.get(&MetadataKey::ErrorCorrectionLevel),
            Some(&MetadataValue::Text("L".into()))
        );
    }

    #[test]
    fn test_spent_slot_stops_before_grid_search() {
        let code = QrCode::with_error_correction_level(b"late", EcLevel::M).unwrap();
        let (width, height) = (120usize, 120usize);
        let mut canvas = vec![255u8; width * height];
        paint_qr(&mut canvas, width, (20, 20), 3, &code);

        let luma = LumaView::new(&canvas, width as u32, height as u32, width).unwrap();
        let mut found = Vec::new();
        let slot = Deadline::start(Duration::ZERO);
        let status = QrDetector::new().decode(&luma, &request(), &slot, &mut found);

        assert_eq!(status, ScanStatus::Truncated);
        assert!(found.is_empty());
    }

    #[test]
    fn test_blank_region_finds_nothing() {
        let canvas = vec![200u8; 100 * 100];
        let luma = LumaView::new(&canvas, 100, 100, 100).unwrap();
        let mut found = Vec::new();
        QrDetector::new().decode(
            &luma,
            &request(),
            &Deadline::start(Duration::from_secs(60)),
            &mut found,
        );
        assert!(found.is_empty());
    }
}

