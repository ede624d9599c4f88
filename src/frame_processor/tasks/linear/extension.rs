// SPDX-License-Identifier: GPL-3.0-only

//! EAN-2 and EAN-5 add-on symbols
//!
//! The add-on sits to the right of an EAN/UPC symbol, past its quiet zone.
//! It starts with a 1-1-2 guard and separates digits with a 1-1 delimiter.
//! Its check information is carried only by the L/G parity of the digits.

use super::upc_ean::decode_lg;
use super::{Runs, pattern_variance};
use crate::constants::scan::{MAX_INDIVIDUAL_VARIANCE, UPC_EAN_MAX_AVG_VARIANCE};
use crate::frame_processor::types::{Metadata, MetadataKey, MetadataValue};

const START_PATTERN: [u32; 3] = [1, 1, 2];
const SEPARATOR_PATTERN: [u32; 2] = [1, 1];

/// EAN-5 parity by check digit (G digits set bit `4 - position`)
const CHECK_DIGIT_ENCODINGS: [u32; 10] =
    [0x18, 0x14, 0x12, 0x11, 0x0C, 0x06, 0x03, 0x0A, 0x09, 0x05];

/// Right quiet zone of the add-on, in modules
const QUIET_MODULES: u32 = 5;

/// Decoded add-on text and what it means
#[derive(Debug, Clone, PartialEq)]
pub struct Extension {
    pub text: String,
    pub metadata: Metadata,
}

fn is_pattern(runs: &Runs, index: usize, pattern: &[u32]) -> bool {
    runs.window(index, pattern.len()).is_some_and(|counters| {
        pattern_variance(counters, pattern, MAX_INDIVIDUAL_VARIANCE) < UPC_EAN_MAX_AVG_VARIANCE
    })
}

/// Read `count` digits after the start guard at `bar`, returning the text
/// and the parity mask with the first digit in the highest bit
fn read_digits(runs: &Runs, bar: usize, count: usize) -> Option<(String, u32)> {
    let module = (runs.span(bar, 3) / 4).max(1);
    let mut text = String::with_capacity(count);
    let mut parity = 0u32;
    let mut index = bar + 3;
    for x in 0..count {
        let (digit, even) = decode_lg(runs, index)?;
        text.push(char::from(b'0' + digit));
        if even {
            parity |= 1 << (count - 1 - x);
        }
        index += 4;
        if x + 1 < count {
            if !is_pattern(runs, index, &SEPARATOR_PATTERN) {
                return None;
            }
            index += 2;
        }
    }
    runs.quiet_after(index, QUIET_MODULES * module)
        .then_some((text, parity))
}

fn checksum5(text: &str) -> u32 {
    let digits: Vec<u32> = text.bytes().map(|b| (b - b'0') as u32).collect();
    let odd: u32 = digits.iter().step_by(2).sum();
    let even: u32 = digits.iter().skip(1).step_by(2).sum();
    (3 * odd + 9 * even) % 10
}

fn read5(runs: &Runs, bar: usize) -> Option<Extension> {
    let (text, parity) = read_digits(runs, bar, 5)?;
    let check = CHECK_DIGIT_ENCODINGS.iter().position(|&e| e == parity)? as u32;
    if checksum5(&text) != check {
        return None;
    }

    let mut metadata = Metadata::new();
    if let Some(price) = suggested_price(&text) {
        metadata.insert(MetadataKey::SuggestedPrice, MetadataValue::Text(price));
    }
    Some(Extension { text, metadata })
}

fn read2(runs: &Runs, bar: usize) -> Option<Extension> {
    let (text, parity) = read_digits(runs, bar, 2)?;
    let value: u32 = text.parse().ok()?;
    if value % 4 != parity {
        return None;
    }

    let mut metadata = Metadata::new();
    metadata.insert(MetadataKey::IssueNumber, MetadataValue::Int(value as i64));
    Some(Extension { text, metadata })
}

/// Price encoded by an EAN-5 add-on, prefixed with its currency symbol
pub fn suggested_price(raw: &str) -> Option<String> {
    let currency = match raw.as_bytes().first()? {
        b'0' => "£",
        b'5' => "$",
        b'9' => match raw {
            "90000" => return None,
            "99991" => return Some("0.00".to_string()),
            "99990" => return Some("Used".to_string()),
            _ => "",
        },
        _ => "",
    };
    let amount: u32 = raw.get(1..)?.parse().ok()?;
    Some(format!("{currency}{}.{:02}", amount / 100, amount % 100))
}

/// Add-on starting at black run `bar`, five digits tried before two
pub fn read(runs: &Runs, bar: usize) -> Option<Extension> {
    if !is_pattern(runs, bar, &START_PATTERN) {
        return None;
    }
    read5(runs, bar).or_else(|| read2(runs, bar))
}
