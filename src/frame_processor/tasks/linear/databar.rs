// SPDX-License-Identifier: GPL-3.0-only

//! GS1 DataBar readers
//!
//! The RSS-14 reader pairs finder patterns across lines and answers only
//! once both halves were seen on two of them, so one reader lives for a
//! whole scan pass and is fed forward lines. Expanded symbols are read from
//! a single line in either direction.

use super::{LineMatch, Runs};
use crate::frame_processor::tasks::matrix_detector::reader_metadata;
use crate::frame_processor::types::{BarcodeFormat, FormatSet};
use rxing::common::BitArray;
use rxing::oned::OneDReader;
use rxing::oned::rss::RSS14Reader;
use rxing::oned::rss::expanded::RSSExpandedReader;
use rxing::{DecodeHints, RXingResult};
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

pub const FORMATS: &[BarcodeFormat] = &[BarcodeFormat::Rss14, BarcodeFormat::RssExpanded];

/// DataBar readers for one scan pass
pub struct DataBarScan {
    rss14: Option<RSS14Reader>,
    expanded: Option<RSSExpandedReader>,
    hints: DecodeHints,
}

impl DataBarScan {
    /// Readers for the requested DataBar formats, `None` when none is requested
    pub fn for_formats(formats: &FormatSet) -> Option<Self> {
        let rss14 = formats.contains(BarcodeFormat::Rss14).then(RSS14Reader::new);
        let expanded = formats
            .contains(BarcodeFormat::RssExpanded)
            .then(RSSExpandedReader::new);
        if rss14.is_none() && expanded.is_none() {
            return None;
        }
        Some(Self {
            rss14,
            expanded,
            hints: DecodeHints::default(),
        })
    }

    /// First DataBar symbol on scan line `line`
    ///
    /// Positions in the match are along `runs` as given, so reversed lines
    /// report reversed positions like every other line reader.
    pub fn read(&mut self, runs: &Runs, line: u32, reversed: bool) -> Option<LineMatch> {
        let row = bit_row(runs)?;

        if !reversed {
            if let Some(reader) = self.rss14.as_mut() {
                let result = run_row_reader(reader, RSS14Reader::new, line, &row, &self.hints);
                if let Some(result) = result {
                    return Some(line_match(BarcodeFormat::Rss14, &result, runs));
                }
            }
        }

        let reader = self.expanded.as_mut()?;
        let result = run_row_reader(reader, RSSExpandedReader::new, line, &row, &self.hints)?;
        Some(line_match(BarcodeFormat::RssExpanded, &result, runs))
    }
}

/// Bit row with black runs set
fn bit_row(runs: &Runs) -> Option<BitArray> {
    if runs.is_empty() {
        return None;
    }
    let mut row = BitArray::with_size(runs.length() as usize);
    for bar in runs.bars() {
        let start = runs.offset(bar) as usize;
        let end = start + runs.width(bar) as usize;
        row.setRange(start, end).ok()?;
    }
    Some(row)
}

/// One row pass; a reader that panics is replaced by a fresh one
fn run_row_reader<R: OneDReader>(
    reader: &mut R,
    fresh: fn() -> R,
    line: u32,
    row: &BitArray,
    hints: &DecodeHints,
) -> Option<RXingResult> {
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| reader.decode_row(line, row, hints)));
    match attempt {
        Ok(result) => result.ok(),
        Err(_) => {
            debug!(line, "DataBar reader panicked, starting over");
            *reader = fresh();
            None
        }
    }
}

fn line_match(format: BarcodeFormat, result: &RXingResult, runs: &Runs) -> LineMatch {
    let xs = result.getPoints().iter().map(|p| p.x);
    let start = xs.clone().fold(f32::MAX, f32::min);
    let end = xs.fold(f32::MIN, f32::max);
    let (start, end) = if start <= end {
        (start, end)
    } else {
        (0.0, runs.length() as f32)
    };

    let mut hit = LineMatch::new(format, result.getText().to_string(), start, end);
    hit.metadata = reader_metadata(result);
    hit
}
