// SPDX-License-Identifier: GPL-3.0-only

//! Linear (1D) barcode readers
//!
//! A region is read along scan lines. Each line is binarized against its own
//! histogram black point, turned into alternating white/black run lengths and
//! handed to the per-symbology readers, once forward and once reversed.
//! Accurate mode adds more rows and a pass over columns. Formats with weak
//! checks are reported only once distinct lines agree.
//!
//! ```text
//! line samples → black point → runs → reader → LineMatch → Barcode
//! ```

pub mod codabar;
pub mod code128;
pub mod code39;
pub mod code93;
pub mod databar;
pub mod extension;
pub mod itf;
pub mod upc_ean;

use super::{DecodeRequest, ScanStatus, SymbolDecoder};
use crate::constants::scan::{
    ACCURATE_ROW_STEP_SHIFT, CONFIRMATIONS_REQUIRED, FAST_ROW_STEP_SHIFT, FAST_SCAN_LINES,
    LUMINANCE_BUCKETS,
};
use crate::frame::LumaView;
use crate::frame_processor::deadline::Deadline;
use crate::frame_processor::types::{
    Barcode, BarcodeFormat, FormatSet, Metadata, MetadataKey, MetadataValue, Point,
};
use databar::DataBarScan;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::trace;

/// Alternating run lengths of one binarized scan line
///
/// Even indices are white runs, odd indices black. The first and last runs
/// are always white, possibly zero-width, so every bar has a space on both
/// sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runs {
    widths: Vec<u32>,
    offsets: Vec<u32>,
    length: u32,
}

impl Runs {
    /// Build runs from run widths starting with a white run
    pub fn from_widths(widths: &[u32]) -> Self {
        let mut normalized = Vec::with_capacity(widths.len() + 1);
        normalized.extend_from_slice(widths);
        if normalized.is_empty() || normalized.len() % 2 == 0 {
            normalized.push(0);
        }
        let mut offsets = Vec::with_capacity(normalized.len());
        let mut position = 0;
        for width in &normalized {
            offsets.push(position);
            position += width;
        }
        Self {
            widths: normalized,
            offsets,
            length: position,
        }
    }

    /// Build runs from per-pixel black flags
    pub fn from_pixels(black: impl IntoIterator<Item = bool>) -> Self {
        let mut widths = vec![0u32];
        let mut current = false;
        for is_black in black {
            if is_black != current {
                widths.push(0);
                current = is_black;
            }
            if let Some(last) = widths.last_mut() {
                *last += 1;
            }
        }
        Self::from_widths(&widths)
    }

    /// The same line read right to left
    pub fn reversed(&self) -> Self {
        let widths: Vec<u32> = self.widths.iter().rev().copied().collect();
        Self::from_widths(&widths)
    }

    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Line length in pixels
    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn width(&self, index: usize) -> u32 {
        self.widths.get(index).copied().unwrap_or(0)
    }

    /// Pixel position where run `index` starts
    pub fn offset(&self, index: usize) -> u32 {
        self.offsets.get(index).copied().unwrap_or(self.length)
    }

    /// `count` runs starting at `index`, if the line has them
    pub fn window(&self, index: usize, count: usize) -> Option<&[u32]> {
        self.widths.get(index..index.checked_add(count)?)
    }

    /// Total pixel width of `count` runs starting at `index`
    pub fn span(&self, index: usize, count: usize) -> u32 {
        self.offset(index + count) - self.offset(index)
    }

    /// Pixel center between the start of run `index` and the end of run
    /// `index + count - 1`
    pub fn center(&self, index: usize, count: usize) -> f32 {
        (self.offset(index) + self.offset(index + count)) as f32 / 2.0
    }

    /// Indices of black runs, left to right
    pub fn bars(&self) -> impl Iterator<Item = usize> + '_ {
        (1..self.widths.len()).step_by(2)
    }

    /// White run before black run `index` is at least `needed` wide, or
    /// reaches the start of the line
    pub fn quiet_before(&self, index: usize, needed: u32) -> bool {
        if index == 0 {
            return false;
        }
        self.width(index - 1) >= needed.min(self.offset(index))
    }

    /// White run `index` is at least `needed` wide, or reaches the end of the
    /// line
    pub fn quiet_after(&self, index: usize, needed: u32) -> bool {
        if index >= self.widths.len() {
            return true;
        }
        self.width(index) >= needed.min(self.length - self.offset(index))
    }
}

/// Black point of one line from its luminance histogram
///
/// Finds the two tallest, well separated histogram peaks and picks the
/// emptiest valley between them. Returns `None` for low-contrast lines.
pub fn black_point(line: &[u8]) -> Option<u8> {
    let mut buckets = [0u32; LUMINANCE_BUCKETS];
    for &sample in line {
        buckets[(sample >> 3) as usize] += 1;
    }

    let mut first_peak = 0usize;
    let mut first_peak_size = 0u32;
    let mut max_bucket_count = 0u32;
    for (x, &count) in buckets.iter().enumerate() {
        if count > first_peak_size {
            first_peak = x;
            first_peak_size = count;
        }
        max_bucket_count = max_bucket_count.max(count);
    }

    let mut second_peak = 0usize;
    let mut second_peak_score = 0u64;
    for (x, &count) in buckets.iter().enumerate() {
        let distance = x.abs_diff(first_peak) as u64;
        let score = count as u64 * distance * distance;
        if score > second_peak_score {
            second_peak = x;
            second_peak_score = score;
        }
    }

    let (low, high) = if first_peak > second_peak {
        (second_peak, first_peak)
    } else {
        (first_peak, second_peak)
    };
    if high - low <= LUMINANCE_BUCKETS / 16 {
        return None;
    }

    let mut best_valley = high - 1;
    let mut best_valley_score = -1i64;
    for x in (low + 1..high).rev() {
        let from_first = (x - low) as i64;
        let emptiness = (max_bucket_count - buckets[x]) as i64;
        let score = from_first * from_first * (high - x) as i64 * emptiness;
        if score > best_valley_score {
            best_valley = x;
            best_valley_score = score;
        }
    }

    Some((best_valley << 3) as u8)
}

/// Binarize one line into runs
///
/// Interior samples are sharpened against their neighbours before the
/// threshold, which keeps narrow bars from bleeding into each other.
pub fn binarize(line: &[u8]) -> Option<Runs> {
    let threshold = black_point(line)? as i32;
    let last = line.len() - 1;
    let black = line.iter().enumerate().map(|(x, &center)| {
        if x == 0 || x == last {
            return (center as i32) < threshold;
        }
        let sharpened = (center as i32 * 4 - line[x - 1] as i32 - line[x + 1] as i32) / 2;
        sharpened < threshold
    });
    Some(Runs::from_pixels(black))
}

/// Line indices to visit, starting in the middle and alternating outwards
pub fn scan_lines(extent: usize, accurate: bool) -> impl Iterator<Item = usize> {
    let (shift, max_lines) = if accurate {
        (ACCURATE_ROW_STEP_SHIFT, extent)
    } else {
        (FAST_ROW_STEP_SHIFT, FAST_SCAN_LINES)
    };
    let step = (extent >> shift).max(1);
    let middle = extent / 2;

    (0..max_lines).map_while(move |x| {
        let steps = (x + 1) / 2;
        let line = if x % 2 == 0 {
            middle.checked_add(step * steps)?
        } else {
            middle.checked_sub(step * steps)?
        };
        (line < extent).then_some(line)
    })
}

/// Variance between measured runs and an ideal pattern, in module units
///
/// Returns `f32::INFINITY` when any single element is off by more than
/// `max_individual` modules.
pub fn pattern_variance(counters: &[u32], pattern: &[u32], max_individual: f32) -> f32 {
    let total: u32 = counters.iter().sum();
    let pattern_length: u32 = pattern.iter().sum();
    if total < pattern_length || pattern_length == 0 {
        return f32::INFINITY;
    }

    let unit = total as f32 / pattern_length as f32;
    let max_individual = max_individual * unit;
    let mut total_variance = 0.0;
    for (&counter, &expected) in counters.iter().zip(pattern) {
        let variance = (counter as f32 - expected as f32 * unit).abs();
        if variance > max_individual {
            return f32::INFINITY;
        }
        total_variance += variance;
    }
    total_variance / total as f32
}

/// Index of the best pattern under `max_avg` variance
pub fn best_match<'p>(
    counters: &[u32],
    patterns: impl IntoIterator<Item = &'p [u32]>,
    max_avg: f32,
    max_individual: f32,
) -> Option<usize> {
    let mut best = None;
    let mut best_variance = max_avg;
    for (index, pattern) in patterns.into_iter().enumerate() {
        let variance = pattern_variance(counters, pattern, max_individual);
        if variance < best_variance {
            best_variance = variance;
            best = Some(index);
        }
    }
    best
}

/// Split elements into narrow and wide around the largest width gap
///
/// Returns a bitmask with the first element in the highest bit, or `None`
/// when wide elements are not clearly wider than narrow ones.
pub fn narrow_wide_bits(counters: &[u32]) -> Option<u32> {
    let mut sorted: Vec<u32> = counters.to_vec();
    sorted.sort_unstable();

    let (mut threshold, mut best_ratio) = (0u32, 0.0f32);
    for pair in sorted.windows(2) {
        let ratio = pair[1] as f32 / pair[0].max(1) as f32;
        if ratio > best_ratio {
            best_ratio = ratio;
            threshold = pair[0];
        }
    }
    if best_ratio < 1.5 {
        return None;
    }

    Some(
        counters
            .iter()
            .fold(0u32, |bits, &counter| (bits << 1) | u32::from(counter > threshold)),
    )
}

/// One decoded line
#[derive(Debug, Clone, PartialEq)]
pub struct LineMatch {
    pub format: BarcodeFormat,
    pub text: String,
    /// Middle of the start pattern along the line
    pub start: f32,
    /// Middle of the stop pattern along the line
    pub end: f32,
    pub metadata: Metadata,
}

impl LineMatch {
    pub fn new(format: BarcodeFormat, text: String, start: f32, end: f32) -> Self {
        Self {
            format,
            text,
            start,
            end,
            metadata: Metadata::new(),
        }
    }
}

/// Reader for one linear symbology family
pub trait LineReader: Send + Sync {
    /// Formats this reader may report
    fn formats(&self) -> &'static [BarcodeFormat];

    /// First barcode on the line, honouring the requested formats
    fn decode_runs(&self, runs: &Runs, formats: &FormatSet) -> Option<LineMatch>;
}

static READERS: [&dyn LineReader; 6] = [
    &upc_ean::UpcEanReader,
    &code128::Code128Reader,
    &code39::Code39Reader,
    &code93::Code93Reader,
    &itf::ItfReader,
    &codabar::CodabarReader,
];

/// Distinct lines a format must be read on before it is reported
///
/// Symbologies without a mandatory checksum need agreement, and so does
/// the UPC/EAN family whose lone check digit lets noise through. RSS-14
/// pairs its halves across lines on its own.
fn confirmations_for(format: BarcodeFormat) -> usize {
    match format {
        BarcodeFormat::Code39
        | BarcodeFormat::Codabar
        | BarcodeFormat::Itf
        | BarcodeFormat::Ean8
        | BarcodeFormat::Ean13
        | BarcodeFormat::UpcA
        | BarcodeFormat::UpcE => CONFIRMATIONS_REQUIRED,
        _ => 1,
    }
}

/// Scan direction of one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Rows,
    Columns,
}

impl Axis {
    fn orientation(self) -> i64 {
        match self {
            Axis::Rows => 0,
            Axis::Columns => 90,
        }
    }
}

/// A scan line, by pass and index
type LineId = (Axis, usize);

/// Lines one (format, text) pair was read on
struct Sighting {
    lines: usize,
    last_line: LineId,
    /// Barcode as placed by the first line that read it
    first: Barcode,
}

/// Runs all linear readers over rows (and columns in accurate mode)
pub struct LinearDecoder;

impl LinearDecoder {
    fn readers_for(formats: &FormatSet) -> Vec<&'static dyn LineReader> {
        READERS
            .iter()
            .copied()
            .filter(|reader| formats.contains_any(reader.formats()))
            .collect()
    }
}

/// Per-call scan bookkeeping
struct LineScan<'r> {
    readers: Vec<&'static dyn LineReader>,
    databar: Option<DataBarScan>,
    formats: FormatSet,
    multiple: bool,
    sightings: HashMap<(BarcodeFormat, String), Sighting>,
    found: &'r mut Vec<Barcode>,
    reported: usize,
}

impl LineScan<'_> {
    fn done(&self) -> bool {
        !self.multiple && self.reported > 0
    }

    /// Read one line both ways; `place` maps (position, reversed) to a point
    fn read_line(&mut self, runs: &Runs, line: LineId, place: impl Fn(f32, bool) -> Point) {
        let reversed = runs.reversed();
        for (line_runs, is_reversed) in [(runs, false), (&reversed, true)] {
            for index in 0..self.readers.len() {
                let reader = self.readers[index];
                if let Some(hit) = reader.decode_runs(line_runs, &self.formats) {
                    self.report(hit, line, &place, is_reversed);
                    if self.done() {
                        return;
                    }
                }
            }

            let number = line.1 as u32;
            let databar = self.databar.as_mut();
            if let Some(hit) = databar.and_then(|d| d.read(line_runs, number, is_reversed)) {
                self.report(hit, line, &place, is_reversed);
                if self.done() {
                    return;
                }
            }
        }
    }

    fn report(
        &mut self,
        hit: LineMatch,
        line: LineId,
        place: &impl Fn(f32, bool) -> Point,
        reversed: bool,
    ) {
        let needed = confirmations_for(hit.format);
        let key = (hit.format, hit.text.clone());
        let sighting = match self.sightings.entry(key) {
            Entry::Occupied(entry) => {
                let sighting = entry.into_mut();
                // Forward and reversed reads of one line count once
                if sighting.last_line == line {
                    return;
                }
                sighting.lines += 1;
                sighting.last_line = line;
                sighting
            }
            Entry::Vacant(entry) => entry.insert(Sighting {
                lines: 1,
                last_line: line,
                first: place_match(hit, line, place, reversed),
            }),
        };
        if sighting.lines != needed {
            return;
        }

        let barcode = sighting.first.clone();
        trace!(
            format = %barcode.format,
            text = %barcode.text,
            lines = needed,
            "Linear barcode decoded"
        );
        self.found.push(barcode);
        self.reported += 1;
    }
}

/// Barcode for a line match, placed in region coordinates
fn place_match(
    hit: LineMatch,
    line: LineId,
    place: &impl Fn(f32, bool) -> Point,
    reversed: bool,
) -> Barcode {
    let orientation = line.0.orientation();
    let orientation = if reversed { (orientation + 180) % 360 } else { orientation };
    let points = vec![place(hit.start, reversed), place(hit.end, reversed)];
    let mut barcode = Barcode::new(hit.format, hit.text, points)
        .with_metadata(MetadataKey::Orientation, MetadataValue::Int(orientation));
    barcode.metadata.extend(hit.metadata);
    barcode
}

impl SymbolDecoder for LinearDecoder {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn handles(&self, formats: &FormatSet) -> bool {
        !Self::readers_for(formats).is_empty() || formats.contains_any(databar::FORMATS)
    }

    fn decode(
        &self,
        luma: &LumaView<'_>,
        request: &DecodeRequest,
        slot: &Deadline,
        found: &mut Vec<Barcode>,
    ) -> ScanStatus {
        let mut scan = LineScan {
            readers: Self::readers_for(&request.formats),
            databar: DataBarScan::for_formats(&request.formats),
            formats: request.formats,
            multiple: request.multiple,
            sightings: HashMap::new(),
            found,
            reported: 0,
        };

        let (width, height) = (luma.width() as usize, luma.height() as usize);
        let axes: &[Axis] = if request.accurate {
            &[Axis::Rows, Axis::Columns]
        } else {
            &[Axis::Rows]
        };

        let mut column = Vec::with_capacity(height);
        let mut lines_read = 0usize;
        for &axis in axes {
            let extent = match axis {
                Axis::Rows => height,
                Axis::Columns => width,
            };

            for index in scan_lines(extent, request.accurate) {
                if lines_read > 0 && slot.expired() {
                    trace!(lines_read, ?axis, "Linear slot spent");
                    return ScanStatus::Truncated;
                }
                lines_read += 1;

                let line = match axis {
                    Axis::Rows => luma.row(index),
                    Axis::Columns => {
                        luma.column_into(index, &mut column);
                        &column[..]
                    }
                };
                let Some(runs) = binarize(line) else {
                    continue;
                };

                let length = runs.length() as f32;
                let along = move |position: f32, reversed: bool| {
                    if reversed { length - position } else { position }
                };
                let fixed = index as f32;
                let id = (axis, index);
                match axis {
                    Axis::Rows => scan.read_line(&runs, id, |p, r| {
                        Point::new(along(p, r), fixed)
                    }),
                    Axis::Columns => scan.read_line(&runs, id, |p, r| {
                        Point::new(fixed, along(p, r))
                    }),
                }

                if scan.done() {
                    return ScanStatus::Completed;
                }
            }
        }

        ScanStatus::Completed
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_runs_start_and_end_white() {
        let runs = Runs::from_pixels([true, true, false, true]);
        assert_eq!(runs.window(0, runs.len()).unwrap(), &[0, 2, 1, 1, 0]);
        assert_eq!(runs.length(), 4);
        assert_eq!(runs.offset(3), 3);
        assert_eq!(runs.bars().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_runs_reversed() {
        let runs = Runs::from_widths(&[5, 1, 2, 3, 4]);
        let reversed = runs.reversed();
        assert_eq!(reversed.window(0, 5).unwrap(), &[4, 3, 2, 1, 5]);
        assert_eq!(reversed.length(), runs.length());
    }

    #[test]
    fn test_quiet_zone_at_line_edge() {
        let runs = Runs::from_widths(&[0, 2, 1, 2, 1]);
        // Touching the left edge counts as quiet
        assert!(runs.quiet_before(1, 10));
        // One pixel of white at the end of the line also reaches the edge
        assert!(runs.quiet_after(4, 10));
        assert!(!runs.quiet_before(3, 2));
    }

    #[test]
    fn test_black_point_splits_bimodal_line() {
        let mut line = vec![20u8; 50];
        line.extend(vec![230u8; 50]);
        let point = black_point(&line).unwrap();
        assert!(point > 20 && point < 230);
    }

    #[test]
    fn test_flat_line_has_no_black_point() {
        assert!(black_point(&[128u8; 64]).is_none());
        assert!(binarize(&[128u8; 64]).is_none());
    }

    #[test]
    fn test_binarize_recovers_runs() {
        let line = testing::paint_line(&[1, 2, 3], 4, 3);
        let runs = binarize(&line).unwrap();
        assert_eq!(runs.window(0, runs.len()).unwrap(), &[12, 3, 6, 9, 12]);
    }

    #[test]
    fn test_scan_lines_fast_mode() {
        let lines: Vec<usize> = scan_lines(480, false).collect();
        assert_eq!(lines.len(), 15);
        assert_eq!(&lines[..3], &[240, 225, 255]);
    }

    #[test]
    fn test_scan_lines_accurate_visits_every_row() {
        let mut lines: Vec<usize> = scan_lines(101, true).collect();
        lines.sort_unstable();
        assert_eq!(lines, (0..101).collect::<Vec<_>>());
    }

    #[test]
    fn test_pattern_variance() {
        assert_eq!(pattern_variance(&[2, 2, 2], &[1, 1, 1], 0.7), 0.0);
        assert!(pattern_variance(&[2, 6, 2], &[1, 1, 1], 0.7).is_infinite());
        assert!(pattern_variance(&[1, 1], &[2, 2], 0.7).is_infinite());
    }

    #[test]
    fn test_narrow_wide_bits() {
        assert_eq!(narrow_wide_bits(&[3, 9, 3, 3, 8]), Some(0b01001));
        assert_eq!(narrow_wide_bits(&[3, 3, 3]), None);
    }

    fn canvas(line: &[u8], height: usize) -> Vec<u8> {
        line.iter().copied().cycle().take(line.len() * height).collect()
    }

    fn decode(
        canvas: &[u8],
        width: usize,
        formats: &[BarcodeFormat],
        accurate: bool,
        slot: Duration,
    ) -> (ScanStatus, Vec<Barcode>) {
        let height = canvas.len() / width;
        let luma = LumaView::new(canvas, width as u32, height as u32, width).unwrap();
        let request = DecodeRequest {
            formats: formats.iter().copied().collect(),
            accurate,
            multiple: true,
        };
        let mut found = Vec::new();
        let status = LinearDecoder.decode(&luma, &request, &Deadline::start(slot), &mut found);
        (status, found)
    }

    #[test]
    fn test_confirmation_required_for_weak_symbologies() {
        assert_eq!(confirmations_for(BarcodeFormat::Code39), 2);
        assert_eq!(confirmations_for(BarcodeFormat::Ean13), 2);
        assert_eq!(confirmations_for(BarcodeFormat::UpcE), 2);
        assert_eq!(confirmations_for(BarcodeFormat::Code128), 1);
        assert_eq!(confirmations_for(BarcodeFormat::Rss14), 1);
    }

    #[test]
    fn test_single_line_ean_is_not_reported() {
        let line = testing::paint_line(&upc_ean::testing::encode_ean13("4006381333931"), 11, 2);
        let formats = [BarcodeFormat::Ean13];
        // Read forward and reversed, but still one line
        let (status, found) = decode(&line, line.len(), &formats, false, Duration::from_secs(60));
        assert_eq!(status, ScanStatus::Completed);
        assert!(found.is_empty());
    }

    #[test]
    fn test_ean_confirmed_on_second_line() {
        let line = testing::paint_line(&upc_ean::testing::encode_ean13("4006381333931"), 11, 2);
        let formats = [BarcodeFormat::Ean13];
        let (_, found) =
            decode(&canvas(&line, 3), line.len(), &formats, false, Duration::from_secs(60));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "4006381333931");
        // Placed where it was first read, the middle row
        assert_eq!(found[0].corner_points[0].y, 1.0);
    }

    #[test]
    fn test_spent_slot_reads_only_first_line() {
        let line = testing::paint_line(&upc_ean::testing::encode_ean13("4006381333931"), 11, 2);
        let formats = [BarcodeFormat::Ean13];
        let (status, found) =
            decode(&canvas(&line, 3), line.len(), &formats, false, Duration::ZERO);
        assert_eq!(status, ScanStatus::Truncated);
        assert!(found.is_empty());
    }

    #[test]
    fn test_decoder_reads_databar_rows() {
        let line = testing::paint_line(&databar::testing::RSS14_ELEMENTS[1..], 10, 3);
        let formats = [BarcodeFormat::Rss14, BarcodeFormat::Code128];
        let (_, found) =
            decode(&canvas(&line, 20), line.len(), &formats, false, Duration::from_secs(60));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].format, BarcodeFormat::Rss14);
        assert_eq!(found[0].text, "01234567890128");
        // Halves seen on rows 10 and 9
        assert_eq!(found[0].corner_points[0].y, 9.0);
    }

    #[test]
    fn test_noise_reads_nothing() {
        let (width, height) = (320usize, 240usize);
        let mut seed = 0x2545_f491u32;
        let noise: Vec<u8> = (0..width * height)
            .map(|_| {
                seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (seed >> 24) as u8
            })
            .collect();

        let (status, found) =
            decode(&noise, width, &BarcodeFormat::ALL, true, Duration::from_secs(60));
        assert_eq!(status, ScanStatus::Completed);
        assert!(found.is_empty(), "{found:?}");
    }

    #[test]
    fn test_decoder_reads_painted_rows() {
        // Code 128 "A1" in code set B, painted across every row
        let modules = code128::testing::encode(&[104, 33, 17]);
        let line = testing::paint_line(&modules, 10, 2);
        let (width, height) = (line.len(), 20usize);
        let canvas: Vec<u8> = line.iter().copied().cycle().take(width * height).collect();
        let luma = LumaView::new(&canvas, width as u32, height as u32, width).unwrap();

        let request = DecodeRequest {
            formats: [BarcodeFormat::Code128].into_iter().collect(),
            accurate: false,
            multiple: false,
        };
        let mut found = Vec::new();
        let status = LinearDecoder.decode(
            &luma,
            &request,
            &Deadline::start(Duration::from_secs(60)),
            &mut found,
        );

        assert_eq!(status, ScanStatus::Completed);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "A1");
        assert_eq!(found[0].corner_points.len(), 2);
        assert_eq!(found[0].corner_points[0].y, 10.0);
        assert_eq!(
            found[0].metadata.get(&MetadataKey::Orientation),
            Some(&MetadataValue::Int(0))
        );
    }
}
