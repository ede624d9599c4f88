// SPDX-License-Identifier: GPL-3.0-only

//! Pixel format conversion
//!
//! Integer BT.601 full-range (JFIF) math shared by the capture and the
//! detection pipelines. Everything here is a pure function over sample
//! slices; the only allocation is the output buffer of the `frame_to_*`
//! helpers.

use crate::frame::{Frame, PixelFormat};

/// Convert one YUV sample triple to RGB
#[inline]
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as i32;
    let d = u as i32 - 128;
    let e = v as i32 - 128;

    let r = y + ((359 * e + 128) >> 8);
    let g = y - ((88 * d + 183 * e + 128) >> 8);
    let b = y + ((454 * d + 128) >> 8);

    [
        r.clamp(0, 255) as u8,
        g.clamp(0, 255) as u8,
        b.clamp(0, 255) as u8,
    ]
}

/// Luminance of an RGB triple (weights sum to 256)
#[inline]
pub fn rgb_to_luma(r: u8, g: u8, b: u8) -> u8 {
    ((77 * r as u32 + 150 * g as u32 + 29 * b as u32 + 128) >> 8) as u8
}

/// Byte offsets of R, G, B and the pixel size for packed RGB formats
pub fn rgb_layout(format: PixelFormat) -> Option<([usize; 3], usize)> {
    match format {
        PixelFormat::RGBA => Some(([0, 1, 2], 4)),
        PixelFormat::BGRA => Some(([2, 1, 0], 4)),
        PixelFormat::ABGR => Some(([3, 2, 1], 4)),
        PixelFormat::RGB24 => Some(([0, 1, 2], 3)),
        _ => None,
    }
}

/// Byte offsets of Y0, U, Y1, V inside a 4-byte group of packed 4:2:2
pub fn packed_yuv_layout(format: PixelFormat) -> Option<[usize; 4]> {
    match format {
        PixelFormat::YUYV => Some([0, 1, 2, 3]),
        PixelFormat::UYVY => Some([1, 0, 3, 2]),
        PixelFormat::YVYU => Some([0, 3, 2, 1]),
        PixelFormat::VYUY => Some([1, 2, 3, 0]),
        _ => None,
    }
}

/// Convert row `y` of a validated frame into tightly packed RGB24
///
/// `out` must hold `width * 3` bytes.
pub fn convert_row_to_rgb(frame: &Frame<'_>, y: usize, out: &mut [u8]) {
    let width = frame.width as usize;
    let planes = frame.planes();

    if let Some((offsets, bpp)) = rgb_layout(frame.format) {
        let row = planes[0].row(y, width * bpp);
        for (src, dst) in row.chunks_exact(bpp).zip(out.chunks_exact_mut(3)) {
            dst[0] = src[offsets[0]];
            dst[1] = src[offsets[1]];
            dst[2] = src[offsets[2]];
        }
        return;
    }

    if let Some(layout) = packed_yuv_layout(frame.format) {
        let row = planes[0].row(y, width.div_ceil(2) * 4);
        for (x, dst) in out.chunks_exact_mut(3).enumerate().take(width) {
            let group = &row[(x / 2) * 4..(x / 2) * 4 + 4];
            let luma = if x % 2 == 0 { group[layout[0]] } else { group[layout[2]] };
            dst.copy_from_slice(&yuv_to_rgb(luma, group[layout[1]], group[layout[3]]));
        }
        return;
    }

    match frame.format {
        PixelFormat::Gray8 => {
            let row = planes[0].row(y, width);
            for (&luma, dst) in row.iter().zip(out.chunks_exact_mut(3)) {
                dst.fill(luma);
            }
        }
        PixelFormat::NV12 | PixelFormat::NV21 => {
            let (u_index, v_index) = if frame.format == PixelFormat::NV12 {
                (0, 1)
            } else {
                (1, 0)
            };
            let luma_row = planes[0].row(y, width);
            let chroma_row = planes[1].row(y / 2, width.div_ceil(2) * 2);
            for (x, dst) in out.chunks_exact_mut(3).enumerate().take(width) {
                let pair = &chroma_row[(x / 2) * 2..(x / 2) * 2 + 2];
                dst.copy_from_slice(&yuv_to_rgb(luma_row[x], pair[u_index], pair[v_index]));
            }
        }
        PixelFormat::I420 => {
            let chroma_width = width.div_ceil(2);
            let luma_row = planes[0].row(y, width);
            let u_row = planes[1].row(y / 2, chroma_width);
            let v_row = planes[2].row(y / 2, chroma_width);
            for (x, dst) in out.chunks_exact_mut(3).enumerate().take(width) {
                dst.copy_from_slice(&yuv_to_rgb(luma_row[x], u_row[x / 2], v_row[x / 2]));
            }
        }
        // Packed RGB and packed YUV are handled above
        _ => {}
    }
}

/// Convert row `y` of a validated frame into luma samples
///
/// `out` must hold `width` bytes.
pub fn convert_row_to_luma(frame: &Frame<'_>, y: usize, out: &mut [u8]) {
    let width = frame.width as usize;
    let planes = frame.planes();

    if let Some((offsets, bpp)) = rgb_layout(frame.format) {
        let row = planes[0].row(y, width * bpp);
        for (src, dst) in row.chunks_exact(bpp).zip(out.iter_mut()) {
            *dst = rgb_to_luma(src[offsets[0]], src[offsets[1]], src[offsets[2]]);
        }
        return;
    }

    if let Some(layout) = packed_yuv_layout(frame.format) {
        let row = planes[0].row(y, width.div_ceil(2) * 4);
        for (x, dst) in out.iter_mut().enumerate().take(width) {
            let group = &row[(x / 2) * 4..(x / 2) * 4 + 4];
            *dst = if x % 2 == 0 { group[layout[0]] } else { group[layout[2]] };
        }
        return;
    }

    // Gray8 and the Y plane of planar formats are luma already
    out[..width].copy_from_slice(planes[0].row(y, width));
}

/// Convert a validated frame to tightly packed RGB24
pub fn frame_to_rgb(frame: &Frame<'_>) -> Vec<u8> {
    let row_bytes = frame.width as usize * 3;
    let mut rgb = vec![0u8; row_bytes * frame.height as usize];
    for (y, out) in rgb.chunks_exact_mut(row_bytes).enumerate() {
        convert_row_to_rgb(frame, y, out);
    }
    rgb
}

/// Convert a validated frame to tightly packed luma
pub fn frame_to_luma(frame: &Frame<'_>) -> Vec<u8> {
    let row_bytes = frame.width as usize;
    let mut luma = vec![0u8; row_bytes * frame.height as usize];
    for (y, out) in luma.chunks_exact_mut(row_bytes).enumerate() {
        convert_row_to_luma(frame, y, out);
    }
    luma
}
