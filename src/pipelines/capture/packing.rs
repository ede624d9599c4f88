// SPDX-License-Identifier: GPL-3.0-only

//! Base64 packing of encoded captures

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Standard (RFC 4648, padded, no line breaks) base64 of `bytes`
pub fn pack(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Inverse of [`pack`], for callers writing the payload back to disk
pub fn unpack(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(encoded)
}
