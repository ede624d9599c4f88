// SPDX-License-Identifier: GPL-3.0-only

//! Aztec, Data Matrix, PDF417 and MaxiCode detection task
//!
//! Locating and decoding are done by the rxing readers. The region is
//! sampled down the same way as for the QR search and binarized once; every
//! requested reader then gets a pass over that bitmap. Accurate scans give a
//! failed reader a second pass with its harder search enabled.

use super::{DecodeRequest, ScanStatus, SymbolDecoder, sampling_step};
use crate::constants::matrix::MAX_DETECTION_DIMENSION;
use crate::frame::LumaView;
use crate::frame_processor::deadline::Deadline;
use crate::frame_processor::types::{
    Barcode, BarcodeFormat, FormatSet, Metadata, MetadataKey, MetadataValue, Point,
};
use rxing::aztec::AztecReader;
use rxing::common::HybridBinarizer;
use rxing::datamatrix::DataMatrixReader;
use rxing::maxicode::MaxiCodeReader;
use rxing::multi::MultipleBarcodeReader;
use rxing::pdf417::PDF417Reader;
use rxing::{
    BinaryBitmap, DecodeHints, ImmutableReader, Luma8LuminanceSource, RXingResult,
    RXingResultMetadataValue,
};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, trace};

type Bitmap = BinaryBitmap<HybridBinarizer<Luma8LuminanceSource>>;

/// Reader order within one pass
///
/// MaxiCode goes last: its harder search rewrites the shared bit matrix.
const FORMATS: [BarcodeFormat; 4] = [
    BarcodeFormat::DataMatrix,
    BarcodeFormat::Aztec,
    BarcodeFormat::Pdf417,
    BarcodeFormat::MaxiCode,
];

/// Matrix code detector for the symbologies rqrr does not cover
pub struct MatrixDetector {
    /// Maximum dimension for processing (regions are sampled down to this)
    max_dimension: u32,
}

impl Default for MatrixDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl MatrixDetector {
    pub const fn new() -> Self {
        Self {
            max_dimension: MAX_DETECTION_DIMENSION,
        }
    }

    pub const fn with_max_dimension(max_dimension: u32) -> Self {
        Self { max_dimension }
    }
}

impl SymbolDecoder for MatrixDetector {
    fn name(&self) -> &'static str {
        "matrix"
    }

    fn handles(&self, formats: &FormatSet) -> bool {
        formats.contains_any(&FORMATS)
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
        let (samples, width, height) = sample(luma, step);
        let mut bitmap = match Luma8LuminanceSource::new(samples, width, height) {
            Ok(source) => BinaryBitmap::new(HybridBinarizer::new(source)),
            Err(e) => {
                debug!(error = ?e, width, height, "Cannot build matrix luminance source");
                return ScanStatus::Completed;
            }
        };

        let passes: &[bool] = if request.accurate { &[false, true] } else { &[false] };
        let mut read = FormatSet::empty();
        let mut attempts = 0usize;

        for &try_harder in passes {
            let hints = DecodeHints {
                TryHarder: Some(try_harder),
                ..Default::default()
            };

            for format in FORMATS {
                if !request.formats.contains(format) || read.contains(format) {
                    continue;
                }
                if attempts > 0 && slot.expired() {
                    trace!(attempts, "Matrix slot spent");
                    return ScanStatus::Truncated;
                }
                attempts += 1;

                for result in run_reader(format, &mut bitmap, &hints, request.multiple) {
                    let barcode = matrix_barcode(format, &result, step as f32);
                    debug!(
                        format = %barcode.format,
                        content = %barcode.text,
                        try_harder,
                        "Detected matrix code"
                    );
                    found.push(barcode);
                    read.insert(format);

                    if !request.multiple {
                        return ScanStatus::Completed;
                    }
                }
            }
        }

        trace!(
            width,
            height,
            step,
            attempts,
            detection_ms = start.elapsed().as_millis(),
            "Matrix search complete"
        );
        ScanStatus::Completed
    }
}

/// Every `step`th sample of every `step`th row
fn sample(luma: &LumaView<'_>, step: usize) -> (Vec<u8>, u32, u32) {
    let width = (luma.width() as usize).div_ceil(step);
    let height = (luma.height() as usize).div_ceil(step);
    let mut samples = Vec::with_capacity(width * height);
    for y in 0..height {
        if step == 1 {
            samples.extend_from_slice(luma.row(y));
        } else {
            samples.extend((0..width).map(|x| luma.get(x * step, y * step)));
        }
    }
    (samples, width as u32, height as u32)
}

/// One reader pass; a panicking reader counts as finding nothing
fn run_reader(
    format: BarcodeFormat,
    bitmap: &mut Bitmap,
    hints: &DecodeHints,
    multiple: bool,
) -> Vec<RXingResult> {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| match format {
        BarcodeFormat::Aztec => {
            AztecReader.immutable_decode_with_hints(bitmap, hints).map(|r| vec![r])
        }
        BarcodeFormat::DataMatrix => {
            DataMatrixReader.immutable_decode_with_hints(bitmap, hints).map(|r| vec![r])
        }
        BarcodeFormat::MaxiCode => MaxiCodeReader::default()
            .immutable_decode_with_hints(bitmap, hints)
            .map(|r| vec![r]),
        BarcodeFormat::Pdf417 if multiple => {
            PDF417Reader::new().decode_multiple_with_hints(bitmap, hints)
        }
        BarcodeFormat::Pdf417 => {
            PDF417Reader.immutable_decode_with_hints(bitmap, hints).map(|r| vec![r])
        }
        _ => Ok(Vec::new()),
    }));

    match attempt {
        Ok(Ok(results)) => results,
        Ok(Err(e)) => {
            trace!(%format, error = ?e, "Matrix reader found nothing");
            Vec::new()
        }
        Err(_) => {
            debug!(%format, "Matrix reader panicked, skipping it");
            Vec::new()
        }
    }
}

fn matrix_barcode(format: BarcodeFormat, result: &RXingResult, scale: f32) -> Barcode {
    let points: Vec<Point> = result
        .getPoints()
        .iter()
        .map(|p| Point::new(p.x * scale, p.y * scale))
        .collect();
    let mut barcode = Barcode::new(format, result.getText(), corners(points));
    barcode.metadata = reader_metadata(result);
    barcode
}

/// Four corners from whatever points a reader reports
///
/// Readers that report more or fewer than four points (PDF417 reports its
/// row indicator ends) get their axis-aligned bounding box.
fn corners(points: Vec<Point>) -> Vec<Point> {
    if points.len() == 4 || points.is_empty() {
        return points;
    }
    let (mut min_x, mut min_y) = (f32::MAX, f32::MAX);
    let (mut max_x, mut max_y) = (f32::MIN, f32::MIN);
    for point in &points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }
    vec![
        Point::new(min_x, min_y),
        Point::new(max_x, min_y),
        Point::new(max_x, max_y),
        Point::new(min_x, max_y),
    ]
}

pub(crate) fn reader_metadata(result: &RXingResult) -> Metadata {
    let mut metadata = Metadata::new();
    for value in result.getRXingResultMetadata().values() {
        match value {
            RXingResultMetadataValue::ErrorCorrectionLevel(level) => {
                metadata.insert(
                    MetadataKey::ErrorCorrectionLevel,
                    MetadataValue::Text(level.clone()),
                );
            }
            RXingResultMetadataValue::Orientation(degrees) => {
                metadata.insert(MetadataKey::Orientation, MetadataValue::Int(*degrees as i64));
            }
            RXingResultMetadataValue::ByteSegments(segments) if !segments.is_empty() => {
                metadata.insert(MetadataKey::ByteSegments, MetadataValue::Bytes(segments.clone()));
            }
            RXingResultMetadataValue::SymbologyIdentifier(id) => {
                metadata.insert(MetadataKey::Other, MetadataValue::Text(id.clone()));
            }
            RXingResultMetadataValue::Pdf417ExtraMetadata(extra) => {
                metadata.insert(
                    MetadataKey::Pdf417ExtraMetadata,
                    MetadataValue::Text(extra.getFileId().to_string()),
                );
                metadata.insert(
                    MetadataKey::StructuredAppendIndex,
                    MetadataValue::Int(extra.getSegmentIndex() as i64),
                );
                if extra.getSegmentCount() > 0 {
                    metadata.insert(
                        MetadataKey::StructuredAppendTotal,
                        MetadataValue::Int(extra.getSegmentCount() as i64),
                    );
                }
            }
            _ => {}
        }
    }
    metadata
}

/// Fixture builders for matrix symbols
#[cfg(test)]
pub(crate) mod testing {
    use rxing::common::BitMatrix;
    use rxing::common::reedsolomon::{PredefinedGenericGF, ReedSolomonEncoder};
    use rxing::maxicode::decoder::BitMatrixParser;
    use rxing::{BarcodeFormat, Writer};

    /// Luma canvas for a bit matrix: `module` pixels per module and a white
    /// border of `quiet` modules
    pub fn paint_bits(bits: &BitMatrix, module: u32, quiet: u32) -> (Vec<u8>, u32, u32) {
        let width = (bits.getWidth() + 2 * quiet) * module;
        let height = (bits.getHeight() + 2 * quiet) * module;
        let mut canvas = vec![255u8; (width * height) as usize];
        for y in 0..height {
            for x in 0..width {
                let (mx, my) = (x / module, y / module);
                let inside = (quiet..quiet + bits.getWidth()).contains(&mx)
                    && (quiet..quiet + bits.getHeight()).contains(&my);
                if inside && bits.get(mx - quiet, my - quiet) {
                    canvas[(y * width + x) as usize] = 0;
                }
            }
        }
        (canvas, width, height)
    }

    /// Render `contents` with one of the rxing writers at one pixel per module
    pub fn encode(writer: &impl Writer, contents: &str, format: BarcodeFormat) -> BitMatrix {
        writer.encode(contents, &format, 0, 0).unwrap()
    }

    const MAXICODE_WIDTH: u32 = 30;
    const MAXICODE_HEIGHT: u32 = 33;

    /// Mode 4 MaxiCode codewords for an upper-case, digit and space message
    pub fn maxicode_codewords(message: &str) -> [u8; 144] {
        // Code set A, padded
        let mut data = [33u8; 94];
        data[0] = 4;
        for (i, c) in message.chars().enumerate() {
            data[1 + i] = match c {
                'A'..='Z' => c as u8 - b'A' + 1,
                '0'..='9' => c as u8 - b'0' + 48,
                ' ' => 32,
                _ => panic!("no code set A value for {c:?}"),
            };
        }

        let mut encoder = ReedSolomonEncoder::new(PredefinedGenericGF::MaxicodeField64.into())
            .unwrap();
        let mut codewords = [0u8; 144];

        // Primary message: 10 data + 10 check codewords
        let mut primary: Vec<i32> = data[..10].iter().map(|&d| d as i32).collect();
        primary.resize(20, 0);
        encoder.encode(&mut primary, 10).unwrap();
        for (slot, value) in codewords[..20].iter_mut().zip(&primary) {
            *slot = *value as u8;
        }

        // Secondary message: even and odd halves of 42 data + 20 check each
        for parity in 0..2 {
            let mut block: Vec<i32> = (0..42).map(|k| data[10 + 2 * k + parity] as i32).collect();
            block.resize(62, 0);
            encoder.encode(&mut block, 20).unwrap();
            for k in 0..42 {
                codewords[20 + 2 * k + parity] = block[k] as u8;
            }
            for k in 0..20 {
                codewords[104 + 2 * k + parity] = block[42 + k] as u8;
            }
        }
        codewords
    }

    /// Module of every codeword bit, found by reading single-module grids
    fn maxicode_placement() -> Vec<Option<(u32, u32)>> {
        let mut placement = vec![None; 144 * 6];
        for y in 0..MAXICODE_HEIGHT {
            for x in 0..MAXICODE_WIDTH {
                let mut grid = BitMatrix::new(MAXICODE_WIDTH, MAXICODE_HEIGHT).unwrap();
                grid.set(x, y);
                let codewords = BitMatrixParser::new(&grid).readCodewords();
                if let Some((index, value)) = codewords.iter().enumerate().find(|(_, v)| **v != 0)
                {
                    let bit = 5 - value.trailing_zeros() as usize;
                    placement[index * 6 + bit] = Some((x, y));
                }
            }
        }
        placement
    }

    /// Luma canvas for a MaxiCode in pure form
    ///
    /// Modules are 10x9 pixels with odd rows shifted half a module, inside a
    /// 300x297 box marked by its corner pixels and a 30 pixel margin. There
    /// is no bullseye, so only the pure-image reader can find it.
    pub fn paint_maxicode(codewords: &[u8; 144]) -> (Vec<u8>, u32, u32) {
        let mut grid = BitMatrix::new(MAXICODE_WIDTH, MAXICODE_HEIGHT).unwrap();
        for (index, module) in maxicode_placement().into_iter().enumerate() {
            let (codeword, bit) = (index / 6, index % 6);
            if codewords[codeword] & (1 << (5 - bit)) == 0 {
                continue;
            }
            if let Some((x, y)) = module {
                grid.set(x, y);
            }
        }

        let (margin, box_width, box_height) = (30u32, 300u32, 297u32);
        let (width, height) = (box_width + 2 * margin, box_height + 2 * margin);
        let mut canvas = vec![255u8; (width * height) as usize];
        let mut fill = |x: u32, y: u32| canvas[((y + margin) * width + x + margin) as usize] = 0;

        for my in 0..MAXICODE_HEIGHT {
            for mx in 0..MAXICODE_WIDTH {
                if !grid.get(mx, my) {
                    continue;
                }
                let left = mx * 10 + (my & 1) * 5;
                for y in my * 9..my * 9 + 9 {
                    for x in left..(left + 10).min(box_width) {
                        fill(x, y);
                    }
                }
            }
        }
        fill(0, 0);
        fill(box_width - 1, box_height - 1);
        (canvas, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxing::aztec::AztecWriter;
    use rxing::datamatrix::DataMatrixWriter;
    use rxing::pdf417::PDF417Writer;
    use std::time::Duration;

    fn request(formats: &[BarcodeFormat], accurate: bool) -> DecodeRequest {
        DecodeRequest {
            formats: formats.iter().copied().collect(),
            accurate,
            multiple: false,
        }
    }

    fn scan(canvas: &[u8], width: u32, height: u32, request: &DecodeRequest) -> Vec<Barcode> {
        let luma = LumaView::new(canvas, width, height, width as usize).unwrap();
        let mut found = Vec::new();
        let status = MatrixDetector::new().decode(
            &luma,
            request,
            &Deadline::start(Duration::from_secs(60)),
            &mut found,
        );
        assert_eq!(status, ScanStatus::Completed);
        found
    }

    fn assert_inside(barcode: &Barcode, width: u32, height: u32) {
        assert_eq!(barcode.corner_points.len(), 4);
        for point in &barcode.corner_points {
            assert!(point.x >= 0.0 && point.x <= width as f32, "x out of range: {point:?}");
            assert!(point.y >= 0.0 && point.y <= height as f32, "y out of range: {point:?}");
        }
    }

    #[test]
    fn test_reads_aztec() {
        let bits = testing::encode(&AztecWriter, "frame-engine aztec", rxing::BarcodeFormat::AZTEC);
        let (canvas, width, height) = testing::paint_bits(&bits, 4, 4);
        let found = scan(&canvas, width, height, &request(&[BarcodeFormat::Aztec], false));

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].format, BarcodeFormat::Aztec);
        assert_eq!(found[0].text, "frame-engine aztec");
        assert!(found[0].metadata.contains_key(&MetadataKey::ErrorCorrectionLevel));
        assert_inside(&found[0], width, height);
    }

    #[test]
    fn test_reads_data_matrix() {
        let bits = testing::encode(
            &DataMatrixWriter,
            "FRAME-ENGINE 2024",
            rxing::BarcodeFormat::DATA_MATRIX,
        );
        let (canvas, width, height) = testing::paint_bits(&bits, 6, 4);
        let found = scan(&canvas, width, height, &request(&[BarcodeFormat::DataMatrix], false));

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].format, BarcodeFormat::DataMatrix);
        assert_eq!(found[0].text, "FRAME-ENGINE 2024");
        assert_eq!(
            found[0].metadata.get(&MetadataKey::Other),
            Some(&MetadataValue::Text("]d1".into()))
        );
        assert_inside(&found[0], width, height);
    }

    #[test]
    fn test_reads_pdf417() {
        let bits = testing::encode(
            &PDF417Writer,
            "PDF417 frame test",
            rxing::BarcodeFormat::PDF_417,
        );
        let (canvas, width, height) = testing::paint_bits(&bits, 2, 2);
        let found = scan(&canvas, width, height, &request(&[BarcodeFormat::Pdf417], false));

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].format, BarcodeFormat::Pdf417);
        assert_eq!(found[0].text, "PDF417 frame test");
        assert!(found[0].metadata.contains_key(&MetadataKey::ErrorCorrectionLevel));
        assert!(found[0].metadata.contains_key(&MetadataKey::Orientation));
        assert_inside(&found[0], width, height);
    }

    #[test]
    fn test_reads_pure_maxicode() {
        let codewords = testing::maxicode_codewords("MAXICODE TEST 42");
        let (canvas, width, height) = testing::paint_maxicode(&codewords);

        for accurate in [false, true] {
            let request = request(&[BarcodeFormat::MaxiCode], accurate);
            let found = scan(&canvas, width, height, &request);
            assert_eq!(found.len(), 1, "accurate={accurate}");
            assert_eq!(found[0].format, BarcodeFormat::MaxiCode);
            assert_eq!(found[0].text, "MAXICODE TEST 42");
            assert_eq!(
                found[0].metadata.get(&MetadataKey::ErrorCorrectionLevel),
                Some(&MetadataValue::Text("4".into()))
            );
            // The pure reader reports no geometry
            assert!(found[0].corner_points.is_empty());
        }
    }

    #[test]
    fn test_unrequested_formats_are_not_read() {
        let bits = testing::encode(&AztecWriter, "not asked for", rxing::BarcodeFormat::AZTEC);
        let (canvas, width, height) = testing::paint_bits(&bits, 4, 4);
        let found = scan(&canvas, width, height, &request(&[BarcodeFormat::DataMatrix], true));
        assert!(found.is_empty());
    }

    #[test]
    fn test_blank_region_finds_nothing() {
        let canvas = vec![255u8; 120 * 90];
        let formats = [
            BarcodeFormat::Aztec,
            BarcodeFormat::DataMatrix,
            BarcodeFormat::MaxiCode,
            BarcodeFormat::Pdf417,
        ];
        assert!(scan(&canvas, 120, 90, &request(&formats, true)).is_empty());
    }

    #[test]
    fn test_spent_slot_stops_after_first_reader() {
        let canvas = vec![255u8; 64 * 64];
        let luma = LumaView::new(&canvas, 64, 64, 64).unwrap();
        let mut found = Vec::new();
        let status = MatrixDetector::new().decode(
            &luma,
            &request(&[BarcodeFormat::Aztec, BarcodeFormat::Pdf417], false),
            &Deadline::start(Duration::ZERO),
            &mut found,
        );
        assert_eq!(status, ScanStatus::Truncated);
    }

    #[test]
    fn test_downsampled_points_are_scaled_back() {
        let bits = testing::encode(&AztecWriter, "scaled", rxing::BarcodeFormat::AZTEC);
        let (canvas, width, height) = testing::paint_bits(&bits, 8, 4);
        let luma = LumaView::new(&canvas, width, height, width as usize).unwrap();
        let mut found = Vec::new();
        MatrixDetector::with_max_dimension(width / 2 + 1).decode(
            &luma,
            &request(&[BarcodeFormat::Aztec], false),
            &Deadline::start(Duration::from_secs(60)),
            &mut found,
        );

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "scaled");
        let max_x = found[0].corner_points.iter().map(|p| p.x).fold(0.0, f32::max);
        assert!(max_x > width as f32 / 2.0, "points not scaled: {:?}", found[0].corner_points);
    }

    #[test]
    fn test_corners_from_extra_points() {
        let points = vec![
            Point::new(10.0, 5.0),
            Point::new(10.0, 40.0),
            Point::new(90.0, 5.0),
            Point::new(90.0, 40.0),
            Point::new(20.0, 5.0),
            Point::new(20.0, 40.0),
            Point::new(80.0, 5.0),
            Point::new(80.0, 40.0),
        ];
        assert_eq!(
            corners(points),
            vec![
                Point::new(10.0, 5.0),
                Point::new(90.0, 5.0),
                Point::new(90.0, 40.0),
                Point::new(10.0, 40.0),
            ]
        );
        assert!(corners(Vec::new()).is_empty());
    }
}
