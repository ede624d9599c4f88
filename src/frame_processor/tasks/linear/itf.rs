// SPDX-License-Identifier: GPL-3.0-only

//! Interleaved 2 of 5 reader
//!
//! Digits come in pairs: the five bars carry the first digit and the five
//! interleaved spaces the second. Only even lengths of six digits or more
//! are accepted, which keeps partial reads of longer symbols out.

use super::{LineMatch, LineReader, Runs, best_match};
use crate::frame_processor::types::{BarcodeFormat, FormatSet};

const MAX_AVG_VARIANCE: f32 = 0.38;
const MAX_INDIVIDUAL_VARIANCE: f32 = 0.5;

/// Quiet zone in narrow modules
const QUIET_MODULES: u32 = 10;

const MIN_LENGTH: usize = 6;

/// Narrow (1) / wide (2) elements per digit
pub(crate) const DIGIT_PATTERNS: [[u32; 5]; 10] = [
    [1, 1, 2, 2, 1], // 0
    [2, 1, 1, 1, 2], // 1
    [1, 2, 1, 1, 2], // 2
    [2, 2, 1, 1, 1], // 3
    [1, 1, 2, 1, 2], // 4
    [2, 1, 2, 1, 1], // 5
    [1, 2, 2, 1, 1], // 6
    [1, 1, 1, 2, 2], // 7
    [2, 1, 1, 2, 1], // 8
    [1, 2, 1, 2, 1], // 9
];

const START_PATTERN: [u32; 4] = [1, 1, 1, 1];
const END_PATTERNS: [[u32; 3]; 2] = [[2, 1, 1], [3, 1, 1]];

/// Digit patterns at both common wide ratios (2:1 and 3:1)
fn digit_patterns() -> impl Iterator<Item = [u32; 5]> {
    let wide3 = DIGIT_PATTERNS.map(|p| p.map(|e| if e == 2 { 3 } else { 1 }));
    DIGIT_PATTERNS.into_iter().chain(wide3)
}

fn decode_digit(counters: &[u32]) -> Option<u8> {
    let patterns: Vec<[u32; 5]> = digit_patterns().collect();
    let index = best_match(
        counters,
        patterns.iter().map(|p| &p[..]),
        MAX_AVG_VARIANCE,
        MAX_INDIVIDUAL_VARIANCE,
    )?;
    Some((index % 10) as u8)
}

fn is_end(runs: &Runs, index: usize, narrow: u32) -> bool {
    let Some(counters) = runs.window(index, 3) else {
        return false;
    };
    best_match(
        counters,
        END_PATTERNS.iter().map(|p| &p[..]),
        MAX_AVG_VARIANCE,
        MAX_INDIVIDUAL_VARIANCE,
    )
    .is_some()
        && runs.quiet_after(index + 3, QUIET_MODULES * narrow)
}

fn decode_at(runs: &Runs, bar: usize) -> Option<LineMatch> {
    let start = runs.window(bar, 4)?;
    best_match(
        start,
        [&START_PATTERN[..]],
        MAX_AVG_VARIANCE,
        MAX_INDIVIDUAL_VARIANCE,
    )?;
    let narrow = (runs.span(bar, 4) / 4).max(1);
    if !runs.quiet_before(bar, QUIET_MODULES * narrow) {
        return None;
    }

    let mut text = String::new();
    let mut index = bar + 4;
    while !is_end(runs, index, narrow) {
        let pair = runs.window(index, 10)?;
        let bars: Vec<u32> = pair.iter().step_by(2).copied().collect();
        let spaces: Vec<u32> = pair.iter().skip(1).step_by(2).copied().collect();
        text.push(char::from(b'0' + decode_digit(&bars)?));
        text.push(char::from(b'0' + decode_digit(&spaces)?));
        index += 10;
    }

    if text.len() < MIN_LENGTH {
        return None;
    }

    Some(LineMatch::new(
        BarcodeFormat::Itf,
        text,
        runs.center(bar, 4),
        runs.center(index, 3),
    ))
}

pub struct ItfReader;

impl LineReader for ItfReader {
    fn formats(&self) -> &'static [BarcodeFormat] {
        &[BarcodeFormat::Itf]
    }

    fn decode_runs(&self, runs: &Runs, _formats: &FormatSet) -> Option<LineMatch> {
        runs.bars().find_map(|bar| decode_at(runs, bar))
    }
}
