// SPDX-License-Identifier: GPL-3.0-only

//! Code 39 reader
//!
//! Each character is five bars and four spaces, exactly three of them wide,
//! followed by a narrow inter-character gap. Symbols are framed by `*`.
//! There is no mandatory check character.

use super::{LineMatch, LineReader, Runs};
use crate::frame_processor::types::{BarcodeFormat, FormatSet};

pub(crate) const ALPHABET: &[u8; 43] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%";

/// Wide/narrow masks, first element in the highest of nine bits
pub(crate) const CHARACTER_ENCODINGS: [u32; 43] = [
    0x034, 0x121, 0x061, 0x160, 0x031, 0x130, 0x070, 0x025, 0x124, 0x064, // 0-9
    0x109, 0x049, 0x148, 0x019, 0x118, 0x058, 0x00D, 0x10C, 0x04C, 0x01C, // A-J
    0x103, 0x043, 0x142, 0x013, 0x112, 0x052, 0x007, 0x106, 0x046, 0x016, // K-T
    0x181, 0x0C1, 0x1C0, 0x091, 0x190, 0x0D0, 0x085, 0x184, 0x0C4, 0x0A8, // U-$
    0x0A2, 0x08A, 0x02A, // /-%
];

pub(crate) const ASTERISK_ENCODING: u32 = 0x094;

/// Narrow/wide mask for nine elements with exactly three wide ones
///
/// Raises the narrow threshold one distinct width at a time until exactly
/// three elements sit above it, then rejects wide elements that dominate
/// the others.
fn to_narrow_wide_pattern(counters: &[u32]) -> Option<u32> {
    let mut max_narrow = 0u32;
    loop {
        let min_counter = counters.iter().copied().filter(|&c| c > max_narrow).min()?;
        max_narrow = min_counter;

        let mut wide_count = 0;
        let mut total_wide = 0;
        let mut pattern = 0u32;
        for &counter in counters {
            pattern <<= 1;
            if counter > max_narrow {
                pattern |= 1;
                wide_count += 1;
                total_wide += counter;
            }
        }

        if wide_count == 3 {
            let balanced = counters
                .iter()
                .filter(|&&c| c > max_narrow)
                .all(|&c| c * 2 < total_wide);
            return balanced.then_some(pattern);
        }
        if wide_count < 3 {
            return None;
        }
    }
}

fn pattern_to_char(pattern: u32) -> Option<char> {
    if pattern == ASTERISK_ENCODING {
        return Some('*');
    }
    CHARACTER_ENCODINGS
        .iter()
        .position(|&e| e == pattern)
        .map(|i| char::from(ALPHABET[i]))
}

fn decode_at(runs: &Runs, bar: usize) -> Option<LineMatch> {
    let start = to_narrow_wide_pattern(runs.window(bar, 9)?)?;
    if start != ASTERISK_ENCODING {
        return None;
    }
    let start_width = runs.span(bar, 9);
    if !runs.quiet_before(bar, start_width / 2) {
        return None;
    }

    let mut text = String::new();
    let mut index = bar + 10;
    loop {
        let counters = runs.window(index, 9)?;
        let ch = pattern_to_char(to_narrow_wide_pattern(counters)?)?;
        if ch == '*' {
            break;
        }
        // A gap as wide as a character means the symbol ended without a stop
        if runs.width(index + 9) >= runs.span(index, 9) / 2 {
            return None;
        }
        text.push(ch);
        index += 10;
    }

    let stop_width = runs.span(index, 9);
    if text.is_empty() || !runs.quiet_after(index + 9, stop_width / 2) {
        return None;
    }

    Some(LineMatch::new(
        BarcodeFormat::Code39,
        text,
        runs.center(bar, 9),
        runs.center(index, 9),
    ))
}

pub struct Code39Reader;

impl LineReader for Code39Reader {
    fn formats(&self) -> &'static [BarcodeFormat] {
        &[BarcodeFormat::Code39]
    }

    fn decode_runs(&self, runs: &Runs, _formats: &FormatSet) -> Option<LineMatch> {
        runs.bars().find_map(|bar| decode_at(runs, bar))
    }
}
