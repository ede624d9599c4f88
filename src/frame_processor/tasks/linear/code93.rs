// SPDX-License-Identifier: GPL-3.0-only

//! Code 93 reader
//!
//! Characters are three bars and three spaces nine modules wide, with two
//! mod-47 check characters (C and K) before the stop pattern and a final
//! termination bar. Four shift characters extend the set to full ASCII.

use super::{LineMatch, LineReader, Runs};
use crate::frame_processor::types::{BarcodeFormat, FormatSet};

/// `a`..`d` stand for the ($) (%) (/) (+) shift characters
pub(crate) const ALPHABET: &[u8; 48] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%abcd*";

/// Module bitmaps (bar = 1), first module in the highest of nine bits
pub(crate) const CHARACTER_ENCODINGS: [u32; 48] = [
    0x114, 0x148, 0x144, 0x142, 0x128, 0x124, 0x122, 0x150, 0x112, 0x10A, // 0-9
    0x1A8, 0x1A4, 0x1A2, 0x194, 0x192, 0x18A, 0x168, 0x164, 0x162, 0x134, // A-J
    0x11A, 0x158, 0x14C, 0x146, 0x12C, 0x116, 0x1B4, 0x1B2, 0x1AC, 0x1A6, // K-T
    0x196, 0x19A, 0x16C, 0x166, 0x136, 0x13A, // U-Z
    0x12E, 0x1D4, 0x1D2, 0x1CA, 0x16E, 0x176, 0x1AE, // - . space $ / + %
    0x126, 0x1DA, 0x1D6, 0x132, 0x15E, // shifts and *
];

const ASTERISK_INDEX: usize = 47;

/// Module bitmap of six runs, `None` if an element is outside 1..=4 modules
fn to_pattern(counters: &[u32]) -> Option<u32> {
    let total: u32 = counters.iter().sum();
    if total == 0 {
        return None;
    }
    let mut pattern = 0u32;
    let mut modules = 0u32;
    for (i, &counter) in counters.iter().enumerate() {
        let scaled = ((counter * 9) as f32 / total as f32).round() as u32;
        if !(1..=4).contains(&scaled) {
            return None;
        }
        for _ in 0..scaled {
            pattern = (pattern << 1) | u32::from(i % 2 == 0);
        }
        modules += scaled;
    }
    (modules == 9).then_some(pattern)
}

fn decode_char(runs: &Runs, index: usize) -> Option<usize> {
    let pattern = to_pattern(runs.window(index, 6)?)?;
    CHARACTER_ENCODINGS.iter().position(|&e| e == pattern)
}

/// Weighted mod-47 check over `values[..check]`
fn check_value(values: &[usize], check: usize, max_weight: usize) -> usize {
    let mut weight = 1;
    let mut total = 0;
    for &value in values[..check].iter().rev() {
        total += weight * value;
        weight += 1;
        if weight > max_weight {
            weight = 1;
        }
    }
    total % 47
}

/// Expand shift pairs into full ASCII
fn decode_extended(values: &[usize]) -> Option<String> {
    let mut text = String::with_capacity(values.len());
    let mut iter = values.iter().map(|&v| ALPHABET[v]);
    while let Some(c) = iter.next() {
        if !(b'a'..=b'd').contains(&c) {
            text.push(char::from(c));
            continue;
        }
        let next = iter.next()?;
        let decoded = match (c, next) {
            (b'd', b'A'..=b'Z') => next + 32,
            (b'a', b'A'..=b'Z') => next - 64,
            (b'b', b'A'..=b'E') => next - 38,
            (b'b', b'F'..=b'J') => next - 11,
            (b'b', b'K'..=b'O') => next + 16,
            (b'b', b'P'..=b'T') => next + 43,
            (b'b', b'U') => 0,
            (b'b', b'V') => b'@',
            (b'b', b'W') => b'`',
            (b'b', b'X'..=b'Z') => 127,
            (b'c', b'A'..=b'O') => next - 32,
            (b'c', b'Z') => b':',
            _ => return None,
        };
        text.push(char::from(decoded));
    }
    Some(text)
}

fn decode_at(runs: &Runs, bar: usize) -> Option<LineMatch> {
    if decode_char(runs, bar)? != ASTERISK_INDEX {
        return None;
    }
    if !runs.quiet_before(bar, runs.span(bar, 6) / 2) {
        return None;
    }

    let mut values = Vec::new();
    let mut index = bar + 6;
    loop {
        let value = decode_char(runs, index)?;
        if value == ASTERISK_INDEX {
            break;
        }
        values.push(value);
        index += 6;
    }

    // Termination bar right after the stop character
    let termination = index + 6;
    let module = runs.span(index, 6) as f32 / 9.0;
    let bar_modules = runs.width(termination) as f32 / module;
    if !(0.5..=1.5).contains(&bar_modules) {
        return None;
    }
    if !runs.quiet_after(termination + 1, runs.span(index, 6) / 2) {
        return None;
    }

    // Data plus C and K
    if values.len() < 3 {
        return None;
    }
    let length = values.len();
    if check_value(&values, length - 2, 20) != values[length - 2]
        || check_value(&values, length - 1, 15) != values[length - 1]
    {
        return None;
    }
    values.truncate(length - 2);

    let text = decode_extended(&values)?;
    Some(LineMatch::new(
        BarcodeFormat::Code93,
        text,
        runs.center(bar, 6),
        runs.center(index, 7),
    ))
}

pub struct Code93Reader;

impl LineReader for Code93Reader {
    fn formats(&self) -> &'static [BarcodeFormat] {
        &[BarcodeFormat::Code93]
    }

    fn decode_runs(&self, runs: &Runs, _formats: &FormatSet) -> Option<LineMatch> {
        runs.bars().find_map(|bar| decode_at(runs, bar))
    }
}
