// SPDX-License-Identifier: GPL-3.0-only

//! EAN-13, EAN-8, UPC-A and UPC-E reader
//!
//! All four share the 1-1-1 start guard and the seven-module digit
//! patterns. EAN-13 hides its first digit in the L/G parity of the left
//! half; UPC-E hides number system and check digit the same way. UPC-A is
//! an EAN-13 with a leading zero.

use super::extension;
use super::{LineMatch, LineReader, Runs, best_match, pattern_variance};
use crate::constants::scan::{
    MAX_INDIVIDUAL_VARIANCE, UPC_EAN_MAX_AVG_VARIANCE, UPC_EAN_QUIET_MODULES,
};
use crate::frame_processor::types::{BarcodeFormat, FormatSet, MetadataKey, MetadataValue};

const START_END_PATTERN: [u32; 3] = [1, 1, 1];
const MIDDLE_PATTERN: [u32; 5] = [1, 1, 1, 1, 1];
const UPCE_END_PATTERN: [u32; 6] = [1, 1, 1, 1, 1, 1];

/// Left-half odd parity digit widths (space, bar, space, bar)
pub(crate) const L_PATTERNS: [[u32; 4]; 10] = [
    [3, 2, 1, 1], // 0
    [2, 2, 2, 1], // 1
    [2, 1, 2, 2], // 2
    [1, 4, 1, 1], // 3
    [1, 1, 3, 2], // 4
    [1, 2, 3, 1], // 5
    [1, 1, 1, 4], // 6
    [1, 3, 1, 2], // 7
    [1, 2, 1, 3], // 8
    [3, 1, 1, 2], // 9
];

/// Even parity patterns are the odd ones mirrored
pub(crate) fn g_pattern(digit: usize) -> [u32; 4] {
    let mut pattern = L_PATTERNS[digit];
    pattern.reverse();
    pattern
}

/// EAN-13 first digit by left-half parity (G digits set bit `5 - position`)
pub(crate) const FIRST_DIGIT_ENCODINGS: [u32; 10] =
    [0x00, 0x0B, 0x0D, 0x0E, 0x13, 0x19, 0x1C, 0x15, 0x16, 0x1A];

/// UPC-E number system 0 and 1 parity by check digit
pub(crate) const NUMSYS_AND_CHECK_DIGIT_PATTERNS: [[u32; 10]; 2] = [
    [0x38, 0x34, 0x32, 0x31, 0x2C, 0x26, 0x23, 0x2A, 0x29, 0x25],
    [0x07, 0x0B, 0x0D, 0x0E, 0x13, 0x19, 0x1C, 0x15, 0x16, 0x1A],
];

/// GS1 prefix ranges, inclusive
const COUNTRY_PREFIXES: &[(u16, u16, &str)] = &[
    (0, 19, "US/CA"),
    (30, 39, "US"),
    (60, 139, "US/CA"),
    (300, 379, "FR"),
    (380, 380, "BG"),
    (383, 383, "SI"),
    (385, 385, "HR"),
    (387, 387, "BA"),
    (400, 440, "DE"),
    (450, 459, "JP"),
    (460, 469, "RU"),
    (471, 471, "TW"),
    (474, 474, "EE"),
    (475, 475, "LV"),
    (476, 476, "AZ"),
    (477, 477, "LT"),
    (478, 478, "UZ"),
    (479, 479, "LK"),
    (480, 480, "PH"),
    (481, 481, "BY"),
    (482, 482, "UA"),
    (484, 484, "MD"),
    (485, 485, "AM"),
    (486, 486, "GE"),
    (487, 487, "KZ"),
    (489, 489, "HK"),
    (490, 499, "JP"),
    (500, 509, "GB"),
    (520, 520, "GR"),
    (528, 528, "LB"),
    (529, 529, "CY"),
    (531, 531, "MK"),
    (535, 535, "MT"),
    (539, 539, "IE"),
    (540, 549, "BE/LU"),
    (560, 560, "PT"),
    (569, 569, "IS"),
    (570, 579, "DK"),
    (590, 590, "PL"),
    (594, 594, "RO"),
    (599, 599, "HU"),
    (600, 601, "ZA"),
    (603, 603, "GH"),
    (608, 608, "BH"),
    (609, 609, "MU"),
    (611, 611, "MA"),
    (613, 613, "DZ"),
    (616, 616, "KE"),
    (618, 618, "CI"),
    (619, 619, "TN"),
    (621, 621, "SY"),
    (622, 622, "EG"),
    (624, 624, "LY"),
    (625, 625, "JO"),
    (626, 626, "IR"),
    (627, 627, "KW"),
    (628, 628, "SA"),
    (629, 629, "AE"),
    (640, 649, "FI"),
    (690, 695, "CN"),
    (700, 709, "NO"),
    (729, 729, "IL"),
    (730, 739, "SE"),
    (740, 740, "GT"),
    (741, 741, "SV"),
    (742, 742, "HN"),
    (743, 743, "NI"),
    (744, 744, "CR"),
    (745, 745, "PA"),
    (746, 746, "DO"),
    (750, 750, "MX"),
    (754, 755, "CA"),
    (759, 759, "VE"),
    (760, 769, "CH"),
    (770, 770, "CO"),
    (773, 773, "UY"),
    (775, 775, "PE"),
    (777, 777, "BO"),
    (779, 779, "AR"),
    (780, 780, "CL"),
    (784, 784, "PY"),
    (785, 785, "PE"),
    (786, 786, "EC"),
    (789, 790, "BR"),
    (800, 839, "IT"),
    (840, 849, "ES"),
    (850, 850, "CU"),
    (858, 858, "SK"),
    (859, 859, "CZ"),
    (860, 860, "YU"),
    (865, 865, "MN"),
    (867, 867, "KP"),
    (868, 869, "TR"),
    (870, 879, "NL"),
    (880, 880, "KR"),
    (885, 885, "TH"),
    (888, 888, "SG"),
    (890, 890, "IN"),
    (893, 893, "VN"),
    (896, 896, "PK"),
    (899, 899, "ID"),
    (900, 919, "AT"),
    (930, 939, "AU"),
    (940, 949, "AZ"),
    (955, 955, "MY"),
    (958, 958, "MO"),
];

/// Country of issue from the three-digit GS1 prefix
pub fn possible_country(ean13: &str) -> Option<&'static str> {
    let prefix: u16 = ean13.get(..3)?.parse().ok()?;
    COUNTRY_PREFIXES
        .iter()
        .find(|(low, high, _)| (*low..=*high).contains(&prefix))
        .map(|(_, _, country)| *country)
}

/// Check digit for a run of decimal digits, rightmost weighted 3
pub fn check_digit(body: &[u8]) -> u8 {
    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| if i % 2 == 0 { 3 * d as u32 } else { d as u32 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

fn checksum_ok(text: &str) -> bool {
    let digits: Vec<u8> = text.bytes().map(|b| b.wrapping_sub(b'0')).collect();
    match digits.split_last() {
        Some((&check, body)) if digits.iter().all(|&d| d < 10) => check_digit(body) == check,
        _ => false,
    }
}

/// Expand an 8-digit UPC-E string to its 12-digit UPC-A form
pub fn upce_to_upca(upce: &str) -> Option<String> {
    let chars: Vec<char> = upce.chars().collect();
    if chars.len() != 8 {
        return None;
    }
    let body = &chars[1..7];
    let mut out = String::with_capacity(12);
    out.push(chars[0]);
    match body[5] {
        last @ ('0' | '1' | '2') => {
            out.extend(&body[0..2]);
            out.push(last);
            out.push_str("0000");
            out.extend(&body[2..5]);
        }
        '3' => {
            out.extend(&body[0..3]);
            out.push_str("00000");
            out.extend(&body[3..5]);
        }
        '4' => {
            out.extend(&body[0..4]);
            out.push_str("00000");
            out.push(body[4]);
        }
        last => {
            out.extend(&body[0..5]);
            out.push_str("0000");
            out.push(last);
        }
    }
    out.push(chars[7]);
    Some(out)
}

fn guard_matches(runs: &Runs, index: usize, pattern: &[u32]) -> bool {
    runs.window(index, pattern.len())
        .is_some_and(|counters| {
            pattern_variance(counters, pattern, MAX_INDIVIDUAL_VARIANCE) < UPC_EAN_MAX_AVG_VARIANCE
        })
}

/// Digit at `index` against L patterns only
pub(crate) fn decode_l(runs: &Runs, index: usize) -> Option<u8> {
    let counters = runs.window(index, 4)?;
    best_match(
        counters,
        L_PATTERNS.iter().map(|p| &p[..]),
        UPC_EAN_MAX_AVG_VARIANCE,
        MAX_INDIVIDUAL_VARIANCE,
    )
    .map(|d| d as u8)
}

/// Digit at `index` against L and G patterns; `true` marks even parity
pub(crate) fn decode_lg(runs: &Runs, index: usize) -> Option<(u8, bool)> {
    let counters = runs.window(index, 4)?;
    let g_patterns: [[u32; 4]; 10] = std::array::from_fn(g_pattern);
    let index = best_match(
        counters,
        L_PATTERNS.iter().chain(g_patterns.iter()).map(|p| &p[..]),
        UPC_EAN_MAX_AVG_VARIANCE,
        MAX_INDIVIDUAL_VARIANCE,
    )?;
    Some(((index % 10) as u8, index >= 10))
}

fn push_digit(text: &mut String, digit: u8) {
    text.push(char::from(b'0' + digit));
}

/// Pixels of quiet zone needed next to a guard spanning `span` pixels
fn quiet_zone(span: u32, pattern: &[u32]) -> u32 {
    let modules: u32 = pattern.iter().sum();
    span * UPC_EAN_QUIET_MODULES / modules.max(1)
}

/// Start guard at black run `bar` with its quiet zone
fn find_start(runs: &Runs, bar: usize) -> bool {
    guard_matches(runs, bar, &START_END_PATTERN)
        && runs.quiet_before(bar, quiet_zone(runs.span(bar, 3), &START_END_PATTERN))
}

/// Host symbol decoded from one start guard
struct Host {
    text: String,
    /// First run after the end guard
    after: usize,
    end: f32,
}

fn end_guard(runs: &Runs, index: usize, pattern: &[u32]) -> Option<(usize, f32)> {
    let count = pattern.len();
    if !guard_matches(runs, index, pattern) {
        return None;
    }
    if !runs.quiet_after(index + count, quiet_zone(runs.span(index, count), pattern)) {
        return None;
    }
    Some((index + count, runs.center(index, count)))
}

fn decode_ean13(runs: &Runs, start: usize) -> Option<Host> {
    let mut digits = String::with_capacity(13);
    let mut parity = 0u32;
    let mut index = start + 3;
    for x in 0..6 {
        let (digit, even) = decode_lg(runs, index)?;
        push_digit(&mut digits, digit);
        if even {
            parity |= 1 << (5 - x);
        }
        index += 4;
    }
    let first = FIRST_DIGIT_ENCODINGS.iter().position(|&e| e == parity)?;

    if !guard_matches(runs, index, &MIDDLE_PATTERN) {
        return None;
    }
    index += 5;
    for _ in 0..6 {
        push_digit(&mut digits, decode_l(runs, index)?);
        index += 4;
    }

    let (after, end) = end_guard(runs, index, &START_END_PATTERN)?;
    let text = format!("{first}{digits}");
    checksum_ok(&text).then_some(Host { text, after, end })
}

fn decode_ean8(runs: &Runs, start: usize) -> Option<Host> {
    let mut text = String::with_capacity(8);
    let mut index = start + 3;
    for _ in 0..4 {
        push_digit(&mut text, decode_l(runs, index)?);
        index += 4;
    }
    if !guard_matches(runs, index, &MIDDLE_PATTERN) {
        return None;
    }
    index += 5;
    for _ in 0..4 {
        push_digit(&mut text, decode_l(runs, index)?);
        index += 4;
    }

    let (after, end) = end_guard(runs, index, &START_END_PATTERN)?;
    checksum_ok(&text).then_some(Host { text, after, end })
}

fn decode_upce(runs: &Runs, start: usize) -> Option<Host> {
    let mut digits = String::with_capacity(6);
    let mut parity = 0u32;
    let mut index = start + 3;
    for x in 0..6 {
        let (digit, even) = decode_lg(runs, index)?;
        push_digit(&mut digits, digit);
        if even {
            parity |= 1 << (5 - x);
        }
        index += 4;
    }

    let (number_system, check) = NUMSYS_AND_CHECK_DIGIT_PATTERNS
        .iter()
        .enumerate()
        .find_map(|(system, row)| {
            row.iter().position(|&p| p == parity).map(|check| (system, check))
        })?;

    let (after, end) = end_guard(runs, index, &UPCE_END_PATTERN)?;
    let text = format!("{number_system}{digits}{check}");
    let upca = upce_to_upca(&text)?;
    checksum_ok(&upca).then_some(Host { text, after, end })
}

/// Decode any requested EAN/UPC variant starting at black run `bar`
fn decode_at(runs: &Runs, bar: usize, formats: &FormatSet) -> Option<LineMatch> {
    if !find_start(runs, bar) {
        return None;
    }
    let start = runs.center(bar, 3);

    let mut decoded = None;
    if formats.contains_any(&[BarcodeFormat::Ean13, BarcodeFormat::UpcA]) {
        decoded = decode_ean13(runs, bar).and_then(|host| {
            let country = possible_country(&host.text);
            let format = if host.text.starts_with('0') && formats.contains(BarcodeFormat::UpcA) {
                BarcodeFormat::UpcA
            } else if formats.contains(BarcodeFormat::Ean13) {
                BarcodeFormat::Ean13
            } else {
                return None;
            };
            Some((format, host, country))
        });
    }
    if decoded.is_none() && formats.contains(BarcodeFormat::Ean8) {
        decoded = decode_ean8(runs, bar).map(|host| (BarcodeFormat::Ean8, host, None));
    }
    if decoded.is_none() && formats.contains(BarcodeFormat::UpcE) {
        decoded = decode_upce(runs, bar).map(|host| (BarcodeFormat::UpcE, host, None));
    }
    let (format, host, country) = decoded?;

    let text = match format {
        BarcodeFormat::UpcA => host.text[1..].to_string(),
        _ => host.text,
    };
    let mut hit = LineMatch::new(format, text, start, host.end);
    if let Some(country) = country {
        hit.metadata
            .insert(MetadataKey::PossibleCountry, MetadataValue::Text(country.to_string()));
    }
    if let Some(add_on) = extension::read(runs, host.after + 1) {
        hit.metadata
            .insert(MetadataKey::UpcEanExtension, MetadataValue::Text(add_on.text));
        hit.metadata.extend(add_on.metadata);
    }
    Some(hit)
}

pub struct UpcEanReader;

impl LineReader for UpcEanReader {
    fn formats(&self) -> &'static [BarcodeFormat] {
        &[
            BarcodeFormat::Ean13,
            BarcodeFormat::Ean8,
            BarcodeFormat::UpcA,
            BarcodeFormat::UpcE,
        ]
    }

    fn decode_runs(&self, runs: &Runs, formats: &FormatSet) -> Option<LineMatch> {
        runs.bars().find_map(|bar| decode_at(runs, bar, formats))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    fn digits(text: &str) -> Vec<usize> {
        text.bytes().map(|b| (b - b'0') as usize).collect()
    }

    /// Module widths of a full EAN-13 symbol (13 digits incl. check)
    pub fn encode_ean13(text: &str) -> Vec<u32> {
        let digits = digits(text);
        let parity = FIRST_DIGIT_ENCODINGS[digits[0]];
        let mut modules = START_END_PATTERN.to_vec();
        for (x, &digit) in digits[1..7].iter().enumerate() {
            if parity >> (5 - x) & 1 == 1 {
                modules.extend(g_pattern(digit));
            } else {
                modules.extend(L_PATTERNS[digit]);
            }
        }
        modules.extend(MIDDLE_PATTERN);
        for &digit in &digits[7..] {
            modules.extend(L_PATTERNS[digit]);
        }
        modules.extend(START_END_PATTERN);
        modules
    }

    /// Module widths of a full EAN-8 symbol
    pub fn encode_ean8(text: &str) -> Vec<u32> {
        let digits = digits(text);
        let mut modules = START_END_PATTERN.to_vec();
        for &digit in &digits[..4] {
            modules.extend(L_PATTERNS[digit]);
        }
        modules.extend(MIDDLE_PATTERN);
        for &digit in &digits[4..] {
            modules.extend(L_PATTERNS[digit]);
        }
        modules.extend(START_END_PATTERN);
        modules
    }

    /// Module widths of a UPC-E symbol given its 8-digit form
    pub fn encode_upce(text: &str) -> Vec<u32> {
        let digits = digits(text);
        let parity = NUMSYS_AND_CHECK_DIGIT_PATTERNS[digits[0]][digits[7]];
        let mut modules = START_END_PATTERN.to_vec();
        for (x, &digit) in digits[1..7].iter().enumerate() {
            if parity >> (5 - x) & 1 == 1 {
                modules.extend(g_pattern(digit));
            } else {
                modules.extend(L_PATTERNS[digit]);
            }
        }
        modules.extend(UPCE_END_PATTERN);
        modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_processor::tasks::linear::testing::runs_for;

    fn formats(list: &[BarcodeFormat]) -> FormatSet {
        list.iter().copied().collect()
    }

    fn read(modules: &[u32], requested: &[BarcodeFormat]) -> Option<LineMatch> {
        let runs = runs_for(modules, 11, 3);
        UpcEanReader.decode_runs(&runs, &formats(requested))
    }

    #[test]
    fn test_check_digit_known_answers() {
        assert_eq!(check_digit(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3]), 1);
        assert!(checksum_ok("4006381333931"));
        assert!(!checksum_ok("4006381333932"));
        assert!(checksum_ok("96385074"));
        assert!(checksum_ok("036000291452"));
    }

    #[test]
    fn test_reads_ean13() {
        let hit = read(&testing::encode_ean13("4006381333931"), &[BarcodeFormat::Ean13]).unwrap();
        assert_eq!(hit.format, BarcodeFormat::Ean13);
        assert_eq!(hit.text, "4006381333931");
        assert_eq!(
            hit.metadata.get(&MetadataKey::PossibleCountry),
            Some(&MetadataValue::Text("DE".into()))
        );
        // Start guard centered 1.5 modules into the symbol
        assert_eq!(hit.start, 33.0 + 4.5);
    }

    #[test]
    fn test_leading_zero_becomes_upca() {
        let modules = testing::encode_ean13("0036000291452");
        let hit = read(&modules, &[BarcodeFormat::Ean13, BarcodeFormat::UpcA]).unwrap();
        assert_eq!(hit.format, BarcodeFormat::UpcA);
        assert_eq!(hit.text, "036000291452");

        let hit = read(&modules, &[BarcodeFormat::Ean13]).unwrap();
        assert_eq!(hit.format, BarcodeFormat::Ean13);
        assert_eq!(hit.text, "0036000291452");
    }

    #[test]
    fn test_needs_five_module_quiet_zone() {
        let modules = testing::encode_ean13("4006381333931");
        let formats = formats(&[BarcodeFormat::Ean13]);
        assert!(UpcEanReader.decode_runs(&runs_for(&modules, 5, 3), &formats).is_some());

        // A stray bar four modules before the start guard
        let mut widths = vec![30, 3, 12];
        widths.extend(modules.iter().map(|m| m * 3));
        widths.push(33);
        assert!(UpcEanReader.decode_runs(&Runs::from_widths(&widths), &formats).is_none());

        // A stray bar four modules after the end guard
        let mut widths = vec![33];
        widths.extend(modules.iter().map(|m| m * 3));
        widths.push(12);
        widths.push(3);
        widths.push(30);
        assert!(UpcEanReader.decode_runs(&Runs::from_widths(&widths), &formats).is_none());
    }

    #[test]
    fn test_upca_only_skips_other_ean13() {
        let modules = testing::encode_ean13("4006381333931");
        assert!(read(&modules, &[BarcodeFormat::UpcA]).is_none());
    }

    #[test]
    fn test_reads_ean8() {
        let hit = read(&testing::encode_ean8("96385074"), &[BarcodeFormat::Ean8]).unwrap();
        assert_eq!(hit.format, BarcodeFormat::Ean8);
        assert_eq!(hit.text, "96385074");
        assert!(hit.metadata.is_empty());
    }

    #[test]
    fn test_reads_upce() {
        // 0123456 expands to 01234500006, check 5
        assert_eq!(upce_to_upca("01234565").as_deref(), Some("012345000065"));
        let hit = read(&testing::encode_upce("01234565"), &[BarcodeFormat::UpcE]).unwrap();
        assert_eq!(hit.format, BarcodeFormat::UpcE);
        assert_eq!(hit.text, "01234565");
    }

    #[test]
    fn test_upce_expansion_rules() {
        assert_eq!(upce_to_upca("01200003").as_deref(), Some("012000000003"));
        assert_eq!(upce_to_upca("01234534").as_deref(), Some("012300000454"));
        assert_eq!(upce_to_upca("01234544").as_deref(), Some("012340000054"));
        assert_eq!(upce_to_upca("0123").as_deref(), None);
    }

    #[test]
    fn test_corrupted_digit_is_rejected() {
        let mut modules = testing::encode_ean13("4006381333931");
        // Swap the last right-half digit for another valid one
        let at = modules.len() - 3 - 4;
        modules.splice(at..at + 4, L_PATTERNS[2]);
        assert!(read(&modules, &[BarcodeFormat::Ean13]).is_none());
    }

    #[test]
    fn test_country_lookup() {
        assert_eq!(possible_country("4006381333931"), Some("DE"));
        assert_eq!(possible_country("0036000291452"), Some("US/CA"));
        assert_eq!(possible_country("7891000315507"), Some("BR"));
        assert_eq!(possible_country("9780201379624"), None);
    }
}
