// SPDX-License-Identifier: GPL-3.0-only

//! Codabar reader
//!
//! Seven elements per character (four bars, three spaces), two or three of
//! them wide, separated by narrow gaps. Symbols start and stop with one of
//! `A`..`D`; those guards are stripped from the reported text.

use super::{LineMatch, LineReader, Runs, narrow_wide_bits};
use crate::frame_processor::types::{BarcodeFormat, FormatSet};

pub(crate) const ALPHABET: &[u8; 20] = b"0123456789-$:/.+ABCD";

/// Wide/narrow masks, first element in the highest of seven bits
pub(crate) const CHARACTER_ENCODINGS: [u32; 20] = [
    0x003, 0x006, 0x009, 0x060, 0x012, 0x042, 0x021, 0x024, 0x030, 0x048, // 0-9
    0x00c, 0x018, 0x045, 0x051, 0x054, 0x015, 0x01A, 0x029, 0x00B, 0x00E, // -$:/.+ABCD
];

/// Start/stop characters plus at least one data character
const MIN_CHARACTER_LENGTH: usize = 3;

fn is_guard(c: u8) -> bool {
    (b'A'..=b'D').contains(&c)
}

fn decode_char(runs: &Runs, index: usize) -> Option<u8> {
    let pattern = narrow_wide_bits(runs.window(index, 7)?)?;
    CHARACTER_ENCODINGS
        .iter()
        .position(|&e| e == pattern)
        .map(|i| ALPHABET[i])
}

fn decode_at(runs: &Runs, bar: usize) -> Option<LineMatch> {
    let start = decode_char(runs, bar)?;
    if !is_guard(start) || !runs.quiet_before(bar, runs.span(bar, 7) / 2) {
        return None;
    }

    let mut chars = vec![start];
    let mut index = bar;
    loop {
        let gap = runs.width(index + 7);
        if gap >= runs.span(index, 7) / 2 {
            // Quiet zone reached without a stop character
            return None;
        }
        index += 8;
        let c = decode_char(runs, index)?;
        chars.push(c);
        if is_guard(c) {
            break;
        }
    }

    if chars.len() < MIN_CHARACTER_LENGTH || !runs.quiet_after(index + 7, runs.span(index, 7) / 2) {
        return None;
    }

    let text: String = chars[1..chars.len() - 1].iter().map(|&c| char::from(c)).collect();
    Some(LineMatch::new(
        BarcodeFormat::Codabar,
        text,
        runs.center(bar, 7),
        runs.center(index, 7),
    ))
}

pub struct CodabarReader;

impl LineReader for CodabarReader {
    fn formats(&self) -> &'static [BarcodeFormat] {
        &[BarcodeFormat::Codabar]
    }

    fn decode_runs(&self, runs: &Runs, _formats: &FormatSet) -> Option<LineMatch> {
        runs.bars().find_map(|bar| decode_at(runs, bar))
    }
}
