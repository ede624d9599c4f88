// SPDX-License-Identifier: GPL-3.0-only

//! Frame processor module for barcode analysis
//!
//! This module holds the barcode data model, the per-call time budget and
//! the symbol decoders that read one region of a luma frame.

pub mod deadline;
pub mod tasks;
pub mod types;

pub use deadline::Deadline;
pub use tasks::{DecodeRequest, RegionScan, ScanStatus, SymbolDecoder, decode_region};
pub use types::{
    Barcode, BarcodeFormat, DetectionOptions, DetectionResult, FormatSet, Metadata, MetadataKey,
    MetadataValue, Point,
};
