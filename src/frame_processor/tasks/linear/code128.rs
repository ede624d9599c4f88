// SPDX-License-Identifier: GPL-3.0-only

//! Code 128 reader
//!
//! Symbols are a start code, data codes, a mod-103 check code and a stop
//! pattern. Each code is three bars and three spaces eleven modules wide.

use super::{LineMatch, LineReader, Runs, best_match};
use crate::constants::scan::{CODE128_MAX_AVG_VARIANCE, MAX_INDIVIDUAL_VARIANCE};
use crate::frame_processor::types::{BarcodeFormat, FormatSet};

/// Element widths of codes 0..=105 plus the stop pattern (106)
pub(crate) static CODE_PATTERNS: [&[u32]; 107] = [
    &[2, 1, 2, 2, 2, 2],
    &[2, 2, 2, 1, 2, 2],
    &[2, 2, 2, 2, 2, 1],
    &[1, 2, 1, 2, 2, 3],
    &[1, 2, 1, 3, 2, 2],
    &[1, 3, 1, 2, 2, 2],
    &[1, 2, 2, 2, 1, 3],
    &[1, 2, 2, 3, 1, 2],
    &[1, 3, 2, 2, 1, 2],
    &[2, 2, 1, 2, 1, 3],
    &[2, 2, 1, 3, 1, 2],
    &[2, 3, 1, 2, 1, 2],
    &[1, 1, 2, 2, 3, 2],
    &[1, 2, 2, 1, 3, 2],
    &[1, 2, 2, 2, 3, 1],
    &[1, 1, 3, 2, 2, 2],
    &[1, 2, 3, 1, 2, 2],
    &[1, 2, 3, 2, 2, 1],
    &[2, 2, 3, 2, 1, 1],
    &[2, 2, 1, 1, 3, 2],
    &[2, 2, 1, 2, 3, 1],
    &[2, 1, 3, 2, 1, 2],
    &[2, 2, 3, 1, 1, 2],
    &[3, 1, 2, 1, 3, 1],
    &[3, 1, 1, 2, 2, 2],
    &[3, 2, 1, 1, 2, 2],
    &[3, 2, 1, 2, 2, 1],
    &[3, 1, 2, 2, 1, 2],
    &[3, 2, 2, 1, 1, 2],
    &[3, 2, 2, 2, 1, 1],
    &[2, 1, 2, 1, 2, 3],
    &[2, 1, 2, 3, 2, 1],
    &[2, 3, 2, 1, 2, 1],
    &[1, 1, 1, 3, 2, 3],
    &[1, 3, 1, 1, 2, 3],
    &[1, 3, 1, 3, 2, 1],
    &[1, 1, 2, 3, 1, 3],
    &[1, 3, 2, 1, 1, 3],
    &[1, 3, 2, 3, 1, 1],
    &[2, 1, 1, 3, 1, 3],
    &[2, 3, 1, 1, 1, 3],
    &[2, 3, 1, 3, 1, 1],
    &[1, 1, 2, 1, 3, 3],
    &[1, 1, 2, 3, 3, 1],
    &[1, 3, 2, 1, 3, 1],
    &[1, 1, 3, 1, 2, 3],
    &[1, 1, 3, 3, 2, 1],
    &[1, 3, 3, 1, 2, 1],
    &[3, 1, 3, 1, 2, 1],
    &[2, 1, 1, 3, 3, 1],
    &[2, 3, 1, 1, 3, 1],
    &[2, 1, 3, 1, 1, 3],
    &[2, 1, 3, 3, 1, 1],
    &[2, 1, 3, 1, 3, 1],
    &[3, 1, 1, 1, 2, 3],
    &[3, 1, 1, 3, 2, 1],
    &[3, 3, 1, 1, 2, 1],
    &[3, 1, 2, 1, 1, 3],
    &[3, 1, 2, 3, 1, 1],
    &[3, 3, 2, 1, 1, 1],
    &[3, 1, 4, 1, 1, 1],
    &[2, 2, 1, 4, 1, 1],
    &[4, 3, 1, 1, 1, 1],
    &[1, 1, 1, 2, 2, 4],
    &[1, 1, 1, 4, 2, 2],
    &[1, 2, 1, 1, 2, 4],
    &[1, 2, 1, 4, 2, 1],
    &[1, 4, 1, 1, 2, 2],
    &[1, 4, 1, 2, 2, 1],
    &[1, 1, 2, 2, 1, 4],
    &[1, 1, 2, 4, 1, 2],
    &[1, 2, 2, 1, 1, 4],
    &[1, 2, 2, 4, 1, 1],
    &[1, 4, 2, 1, 1, 2],
    &[1, 4, 2, 2, 1, 1],
    &[2, 4, 1, 2, 1, 1],
    &[2, 2, 1, 1, 1, 4],
    &[4, 1, 3, 1, 1, 1],
    &[2, 4, 1, 1, 1, 2],
    &[1, 3, 4, 1, 1, 1],
    &[1, 1, 1, 2, 4, 2],
    &[1, 2, 1, 1, 4, 2],
    &[1, 2, 1, 2, 4, 1],
    &[1, 1, 4, 2, 1, 2],
    &[1, 2, 4, 1, 1, 2],
    &[1, 2, 4, 2, 1, 1],
    &[4, 1, 1, 2, 1, 2],
    &[4, 2, 1, 1, 1, 2],
    &[4, 2, 1, 2, 1, 1],
    &[2, 1, 2, 1, 4, 1],
    &[2, 1, 4, 1, 2, 1],
    &[4, 1, 2, 1, 2, 1],
    &[1, 1, 1, 1, 4, 3],
    &[1, 1, 1, 3, 4, 1],
    &[1, 3, 1, 1, 4, 1],
    &[1, 1, 4, 1, 1, 3],
    &[1, 1, 4, 3, 1, 1],
    &[4, 1, 1, 1, 1, 3],
    &[4, 1, 1, 3, 1, 1],
    &[1, 1, 3, 1, 4, 1],
    &[1, 1, 4, 1, 3, 1],
    &[3, 1, 1, 1, 4, 1],
    &[4, 1, 1, 1, 3, 1],
    &[2, 1, 1, 4, 1, 2],
    &[2, 1, 1, 2, 1, 4],
    &[2, 1, 1, 2, 3, 2],
    &[2, 3, 3, 1, 1, 1, 2],
];

const CODE_SHIFT: u32 = 98;
const CODE_CODE_C: u32 = 99;
const CODE_CODE_B: u32 = 100;
const CODE_CODE_A: u32 = 101;
const CODE_FNC_1: u32 = 102;
const CODE_FNC_2: u32 = 97;
const CODE_FNC_3: u32 = 96;
const CODE_FNC_4_A: u32 = 101;
const CODE_FNC_4_B: u32 = 100;
const CODE_START_A: u32 = 103;
const CODE_START_B: u32 = 104;
const CODE_START_C: u32 = 105;
const CODE_STOP: u32 = 106;

/// Group separator emitted for FNC1 after the first position
const GS: char = '\u{1d}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

/// Code value of the six runs at `index`
fn decode_code(runs: &Runs, index: usize) -> Option<u32> {
    let counters = runs.window(index, 6)?;
    let patterns = CODE_PATTERNS.iter().map(|&p| &p[..6]);
    best_match(counters, patterns, CODE128_MAX_AVG_VARIANCE, MAX_INDIVIDUAL_VARIANCE)
        .map(|c| c as u32)
}

fn find_start(runs: &Runs, bar: usize) -> Option<u32> {
    let counters = runs.window(bar, 6)?;
    let starts = [CODE_START_A, CODE_START_B, CODE_START_C].map(|c| CODE_PATTERNS[c as usize]);
    let index = best_match(counters, starts, CODE128_MAX_AVG_VARIANCE, MAX_INDIVIDUAL_VARIANCE)?;
    let width = runs.span(bar, 6);
    runs.quiet_before(bar, width / 2)
        .then_some(CODE_START_A + index as u32)
}

/// Turn a checked code sequence (start code first, check code removed) into
/// text
fn interpret(codes: &[u32]) -> Option<String> {
    let mut code_set = match codes.first()? {
        &CODE_START_A => CodeSet::A,
        &CODE_START_B => CodeSet::B,
        &CODE_START_C => CodeSet::C,
        _ => return None,
    };

    let mut text = String::new();
    let mut upper_mode = false;
    let mut shift_upper_mode = false;
    let mut is_next_shifted = false;

    for (position, &code) in codes.iter().enumerate().skip(1) {
        let unshift = is_next_shifted;
        is_next_shifted = false;

        if (CODE_START_A..=CODE_START_C).contains(&code) {
            return None;
        }

        match code_set {
            CodeSet::A | CodeSet::B if code == CODE_FNC_1 => {
                if position > 1 {
                    text.push(GS);
                }
            }
            CodeSet::A | CodeSet::B if code == CODE_FNC_2 || code == CODE_FNC_3 => {}
            CodeSet::A => match code {
                0..=63 => {
                    let c = u32::from(b' ') + code;
                    push_char(&mut text, c, upper_mode, &mut shift_upper_mode)
                }
                64..=95 => push_char(&mut text, code - 64, upper_mode, &mut shift_upper_mode),
                CODE_FNC_4_A => toggle_fnc4(&mut upper_mode, &mut shift_upper_mode),
                CODE_SHIFT => {
                    is_next_shifted = true;
                    code_set = CodeSet::B;
                }
                CODE_CODE_B => code_set = CodeSet::B,
                CODE_CODE_C => code_set = CodeSet::C,
                _ => return None,
            },
            CodeSet::B => match code {
                0..=95 => {
                    let c = u32::from(b' ') + code;
                    push_char(&mut text, c, upper_mode, &mut shift_upper_mode)
                }
                CODE_FNC_4_B => toggle_fnc4(&mut upper_mode, &mut shift_upper_mode),
                CODE_SHIFT => {
                    is_next_shifted = true;
                    code_set = CodeSet::A;
                }
                CODE_CODE_A => code_set = CodeSet::A,
                CODE_CODE_C => code_set = CodeSet::C,
                _ => return None,
            },
            CodeSet::C => match code {
                0..=99 => {
                    text.push(char::from(b'0' + (code / 10) as u8));
                    text.push(char::from(b'0' + (code % 10) as u8));
                }
                CODE_FNC_1 => {
                    if position > 1 {
                        text.push(GS);
                    }
                }
                CODE_CODE_A => code_set = CodeSet::A,
                CODE_CODE_B => code_set = CodeSet::B,
                _ => return None,
            },
        }

        if unshift {
            code_set = match code_set {
                CodeSet::A => CodeSet::B,
                _ => CodeSet::A,
            };
        }
    }

    (!text.is_empty()).then_some(text)
}

/// Append one character, moved to the upper half while FNC4 is active
fn push_char(text: &mut String, base: u32, upper_mode: bool, shift_upper_mode: &mut bool) {
    let value = if *shift_upper_mode == upper_mode { base } else { base + 128 };
    text.push(char::from_u32(value).unwrap_or(char::REPLACEMENT_CHARACTER));
    *shift_upper_mode = false;
}

/// FNC4 shifts one character into the upper half, twice in a row latches
fn toggle_fnc4(upper_mode: &mut bool, shift_upper_mode: &mut bool) {
    if *shift_upper_mode {
        *upper_mode = !*upper_mode;
        *shift_upper_mode = false;
    } else {
        *shift_upper_mode = true;
    }
}

/// Decode a symbol whose start pattern begins at black run `bar`
fn decode_at(runs: &Runs, bar: usize) -> Option<LineMatch> {
    let start_code = find_start(runs, bar)?;
    let mut codes = vec![start_code];
    let mut index = bar + 6;

    loop {
        let code = decode_code(runs, index)?;
        if code == CODE_STOP {
            break;
        }
        codes.push(code);
        index += 6;
    }

    // Stop pattern has a seventh, two-module bar
    let stop = index;
    let stop_width = runs.span(stop, 7);
    if runs.window(stop, 7).is_none() || !runs.quiet_after(stop + 7, stop_width / 2) {
        return None;
    }
    let module = stop_width as f32 / 13.0;
    let last_bar = runs.width(stop + 6) as f32 / module;
    if !(1.4..=2.6).contains(&last_bar) {
        return None;
    }

    // Start code, at least one data code, and the check code
    if codes.len() < 3 {
        return None;
    }
    let check = codes.pop()?;
    let checksum = codes
        .iter()
        .enumerate()
        .map(|(i, &code)| i.max(1) as u32 * code)
        .sum::<u32>()
        % 103;
    if checksum != check {
        return None;
    }

    let text = interpret(&codes)?;
    Some(LineMatch::new(
        BarcodeFormat::Code128,
        text,
        runs.center(bar, 6),
        runs.center(stop, 7),
    ))
}

pub struct Code128Reader;

impl LineReader for Code128Reader {
    fn formats(&self) -> &'static [BarcodeFormat] {
        &[BarcodeFormat::Code128]
    }

    fn decode_runs(&self, runs: &Runs, _formats: &FormatSet) -> Option<LineMatch> {
        runs.bars().find_map(|bar| decode_at(runs, bar))
    }
}
