// SPDX-License-Identifier: GPL-3.0-only

//! Core types for barcode detection results
//!
//! These types are the detection pipeline's output contract. Geometry is
//! always expressed in source-frame pixel coordinates; rescaling into a
//! display space is the caller's job.

use crate::pipelines::capture::packing;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Barcode symbology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BarcodeFormat {
    /// Aztec 2D barcode format
    Aztec,
    /// CODABAR 1D format
    Codabar,
    /// Code 39 1D format
    Code39,
    /// Code 93 1D format
    Code93,
    /// Code 128 1D format
    Code128,
    /// Data Matrix 2D barcode format
    DataMatrix,
    /// EAN-8 1D format
    Ean8,
    /// EAN-13 1D format
    Ean13,
    /// ITF (Interleaved Two of Five) 1D format
    #[serde(rename = "ITF")]
    Itf,
    /// MaxiCode 2D barcode format
    MaxiCode,
    /// PDF417 format
    #[serde(rename = "PDF417")]
    Pdf417,
    /// QR Code 2D barcode format
    #[serde(rename = "QRCode")]
    QrCode,
    /// GS1 DataBar (RSS-14)
    #[serde(rename = "RSS14")]
    Rss14,
    /// GS1 DataBar Expanded
    #[serde(rename = "RSSExpanded")]
    RssExpanded,
    /// UPC-A 1D format
    #[serde(rename = "UPCA")]
    UpcA,
    /// UPC-E 1D format
    #[serde(rename = "UPCE")]
    UpcE,
    /// UPC/EAN 2- or 5-digit add-on, reported on its host barcode
    #[serde(rename = "UPCEANExtension")]
    UpcEanExtension,
}

impl BarcodeFormat {
    pub const ALL: [BarcodeFormat; 17] = [
        BarcodeFormat::Aztec,
        BarcodeFormat::Codabar,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::Code128,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Ean8,
        BarcodeFormat::Ean13,
        BarcodeFormat::Itf,
        BarcodeFormat::MaxiCode,
        BarcodeFormat::Pdf417,
        BarcodeFormat::QrCode,
        BarcodeFormat::Rss14,
        BarcodeFormat::RssExpanded,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
        BarcodeFormat::UpcEanExtension,
    ];

    /// Name as used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aztec => "Aztec",
            Self::Codabar => "Codabar",
            Self::Code39 => "Code39",
            Self::Code93 => "Code93",
            Self::Code128 => "Code128",
            Self::DataMatrix => "DataMatrix",
            Self::Ean8 => "Ean8",
            Self::Ean13 => "Ean13",
            Self::Itf => "ITF",
            Self::MaxiCode => "MaxiCode",
            Self::Pdf417 => "PDF417",
            Self::QrCode => "QRCode",
            Self::Rss14 => "RSS14",
            Self::RssExpanded => "RSSExpanded",
            Self::UpcA => "UPCA",
            Self::UpcE => "UPCE",
            Self::UpcEanExtension => "UPCEANExtension",
        }
    }

    /// Linear (1D) symbologies are read along scan lines
    pub fn is_linear(&self) -> bool {
        matches!(
            self,
            Self::Codabar
                | Self::Code39
                | Self::Code93
                | Self::Code128
                | Self::Ean8
                | Self::Ean13
                | Self::Itf
                | Self::Rss14
                | Self::RssExpanded
                | Self::UpcA
                | Self::UpcE
                | Self::UpcEanExtension
        )
    }

    /// Number of corner points a full detection reports
    ///
    /// Linear symbologies report the two ends of the decoded scan line,
    /// matrix symbologies the four corners of their quadrilateral.
    pub fn expected_corner_count(&self) -> usize {
        if self.is_linear() { 2 } else { 4 }
    }

    fn bit(&self) -> u32 {
        1 << (*self as u32)
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BarcodeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        BarcodeFormat::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown barcode format: {}", s))
    }
}

/// Set of requested symbologies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatSet(u32);

impl FormatSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        BarcodeFormat::ALL.into_iter().collect()
    }

    pub fn insert(&mut self, format: BarcodeFormat) {
        self.0 |= format.bit();
    }

    pub fn contains(&self, format: BarcodeFormat) -> bool {
        self.0 & format.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True if any of `formats` is in the set
    pub fn contains_any(&self, formats: &[BarcodeFormat]) -> bool {
        formats.iter().any(|f| self.contains(*f))
    }

    pub fn iter(&self) -> impl Iterator<Item = BarcodeFormat> + '_ {
        BarcodeFormat::ALL.into_iter().filter(|f| self.contains(*f))
    }
}

impl FromIterator<BarcodeFormat> for FormatSet {
    fn from_iter<I: IntoIterator<Item = BarcodeFormat>>(iter: I) -> Self {
        let mut set = FormatSet::empty();
        for format in iter {
            set.insert(format);
        }
        set
    }
}

/// A point in source-frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Shift by a region origin
    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Keys of the sparse per-barcode metadata bag
///
/// | key                        | symbologies                        | value   |
/// |----------------------------|------------------------------------|---------|
/// | `orientation`              | linear, MaxiCode, PDF417           | `Int`   |
/// | `errorCorrectionLevel`     | QRCode, Aztec, DataMatrix, PDF417, | `Text`  |
/// |                            | MaxiCode                           |         |
/// | `byteSegments`             | QRCode (binary payloads), Aztec,   | `Bytes` |
/// |                            | DataMatrix                         |         |
/// | `possibleCountry`          | Ean13, UPCA                        | `Text`  |
/// | `UPCEANExtension`          | Ean13, Ean8, UPCA, UPCE            | `Text`  |
/// | `issueNumber`              | EAN-2 add-on                       | `Int`   |
/// | `suggestedPrice`           | EAN-5 add-on                       | `Text`  |
/// | `PDF417ExtraMetadata`      | PDF417 macro blocks (file id)      | `Text`  |
/// | `structuredAppendIndex`    | PDF417 macro blocks                | `Int`   |
/// | `structuredAppendTotal`    | PDF417 macro blocks                | `Int`   |
/// | `other`                    | Aztec, DataMatrix, PDF417, DataBar | `Text`  |
///
/// `other` carries the symbology identifier (`]e0` for DataBar). No reader
/// reports the structured-append sequence or parity keys yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataKey {
    Other,
    Orientation,
    ByteSegments,
    ErrorCorrectionLevel,
    IssueNumber,
    SuggestedPrice,
    PossibleCountry,
    #[serde(rename = "UPCEANExtension")]
    UpcEanExtension,
    #[serde(rename = "PDF417ExtraMetadata")]
    Pdf417ExtraMetadata,
    StructuredAppendSequence,
    StructuredAppendParity,
    StructuredAppendIndex,
    StructuredAppendTotal,
}

/// Typed metadata value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    Int(i64),
    Text(String),
    /// Raw byte segments; serialized as base64 strings
    Bytes(Vec<Vec<u8>>),
}

impl Serialize for MetadataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::Bytes(segments) => {
                serializer.collect_seq(segments.iter().map(|bytes| packing::pack(bytes)))
            }
        }
    }
}

/// Sparse metadata bag
pub type Metadata = BTreeMap<MetadataKey, MetadataValue>;

/// A decoded barcode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    pub text: String,
    pub format: BarcodeFormat,
    /// Empty, or exactly `format.expected_corner_count()` points
    pub corner_points: Vec<Point>,
    pub metadata: Metadata,
}

impl Barcode {
    pub fn new(format: BarcodeFormat, text: impl Into<String>, corner_points: Vec<Point>) -> Self {
        let corner_points = if corner_points.len() == format.expected_corner_count() {
            corner_points
        } else {
            Vec::new()
        };
        Self {
            text: text.into(),
            format,
            corner_points,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: MetadataKey, value: MetadataValue) -> Self {
        self.metadata.insert(key, value);
        self
    }

    /// Move corner points from region to frame coordinates
    pub fn offset(mut self, dx: f32, dy: f32) -> Self {
        for point in &mut self.corner_points {
            *point = point.offset(dx, dy);
        }
        self
    }

    /// Duplicate-suppression key
    pub fn identity(&self) -> (BarcodeFormat, &str) {
        (self.format, &self.text)
    }
}

/// Detection options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectionOptions {
    /// Trade speed for thoroughness (more scan lines, rotated passes)
    pub accurate: bool,
    /// Scan four quadrants plus a center region independently
    pub read_by_quadrant: bool,
    /// Keep scanning after the first barcode
    pub read_multiple: bool,
}

/// Result of one detection call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub barcodes: Vec<Barcode>,
    /// Coordinate space of `corner_points`
    pub width: u32,
    pub height: u32,
    /// JPEG preview of the analysed frame, when enabled
    #[serde(
        rename = "base64JPEG",
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_base64"
    )]
    pub debug_image: Option<Vec<u8>>,
}

impl DetectionResult {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            barcodes: Vec::new(),
            width,
            height,
            debug_image: None,
        }
    }

    pub fn debug_image_base64(&self) -> Option<String> {
        self.debug_image.as_deref().map(packing::pack)
    }
}

fn serialize_base64<S: Serializer>(
    bytes: &Option<Vec<u8>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match bytes {
        Some(bytes) => serializer.serialize_str(&packing::pack(bytes)),
        None => serializer.serialize_none(),
    }
}
