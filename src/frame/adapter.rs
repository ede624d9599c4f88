// SPDX-License-Identifier: GPL-3.0-only

//! Frame normalization
//!
//! Turns any supported [`Frame`] into the canonical buffer the pipelines work
//! on: luma for detection, RGB (or luma for monochrome sources) for capture.
//! Sources that already match are borrowed instead of copied.

use super::{Frame, PixelFormat};
use crate::errors::FrameError;
use crate::media::conversions::{frame_to_luma, frame_to_rgb};
use std::borrow::Cow;
use tracing::trace;

/// Channel layout of a canonical buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    /// One 8-bit luminance sample per pixel
    Luma,
    /// Three 8-bit samples per pixel, R G B order
    Rgb,
}

impl Channels {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Channels::Luma => 1,
            Channels::Rgb => 3,
        }
    }
}

/// Normalized pixel buffer, borrowed from the frame when possible
#[derive(Debug, Clone)]
pub struct CanonicalImage<'a> {
    pixels: Cow<'a, [u8]>,
    width: u32,
    height: u32,
    stride: usize,
    channels: Channels,
}

impl<'a> CanonicalImage<'a> {
    fn borrowed(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        channels: Channels,
    ) -> Self {
        Self {
            pixels: Cow::Borrowed(data),
            width,
            height,
            stride,
            channels,
        }
    }

    fn owned(data: Vec<u8>, width: u32, height: u32, channels: Channels) -> Self {
        Self {
            pixels: Cow::Owned(data),
            width,
            height,
            stride: width as usize * channels.bytes_per_pixel(),
            channels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// True when the buffer still points into the source frame
    pub fn is_borrowed(&self) -> bool {
        matches!(self.pixels, Cow::Borrowed(_))
    }

    /// Pixels without row padding
    ///
    /// Only copies when the source stride carries padding.
    pub fn packed_pixels(&self) -> Cow<'_, [u8]> {
        let row_bytes = self.width as usize * self.channels.bytes_per_pixel();
        let rows = self.height as usize;
        if self.stride == row_bytes {
            return Cow::Borrowed(&self.pixels[..row_bytes * rows]);
        }

        let mut packed = Vec::with_capacity(row_bytes * rows);
        for y in 0..rows {
            let start = y * self.stride;
            packed.extend_from_slice(&self.pixels[start..start + row_bytes]);
        }
        Cow::Owned(packed)
    }

    /// Stride-aware luma view, `None` for RGB buffers
    pub fn luma_view(&self) -> Option<LumaView<'_>> {
        match self.channels {
            Channels::Luma => LumaView::new(&self.pixels, self.width, self.height, self.stride),
            Channels::Rgb => None,
        }
    }
}

/// Borrowed window over luma samples
#[derive(Debug, Clone, Copy)]
pub struct LumaView<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    stride: usize,
}

impl<'a> LumaView<'a> {
    /// Create a view, checking that `data` covers every row
    pub fn new(data: &'a [u8], width: u32, height: u32, stride: usize) -> Option<Self> {
        if width == 0 || height == 0 || stride < width as usize {
            return None;
        }
        let needed = stride
            .checked_mul(height as usize - 1)?
            .checked_add(width as usize)?;
        (data.len() >= needed).then_some(Self {
            data,
            width,
            height,
            stride,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Sample at (x, y); callers stay inside the view
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    /// Row `y` without padding
    #[inline]
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.stride;
        &self.data[start..start + self.width as usize]
    }

    /// Copy column `x` into `out`, reusing its allocation
    pub fn column_into(&self, x: usize, out: &mut Vec<u8>) {
        out.clear();
        out.extend((0..self.height as usize).map(|y| self.get(x, y)));
    }

    /// Sub-window, clamped to this view; `None` if it would be empty
    pub fn window(&self, x: u32, y: u32, width: u32, height: u32) -> Option<LumaView<'a>> {
        let x = x.min(self.width);
        let y = y.min(self.height);
        let width = width.min(self.width - x);
        let height = height.min(self.height - y);
        if width == 0 || height == 0 {
            return None;
        }
        let offset = y as usize * self.stride + x as usize;
        LumaView::new(&self.data[offset..], width, height, self.stride)
    }
}

/// Normalizes incoming frames into canonical buffers
pub struct PixelBufferAdapter;

impl PixelBufferAdapter {
    /// Luma buffer for detection
    ///
    /// Gray8 frames and the Y plane of NV12/NV21/I420 are borrowed as-is.
    pub fn to_luma<'a>(frame: &Frame<'a>) -> Result<CanonicalImage<'a>, FrameError> {
        frame.validate()?;

        let canonical = match frame.format {
            PixelFormat::Gray8 | PixelFormat::NV12 | PixelFormat::NV21 | PixelFormat::I420 => {
                let plane = frame.planes()[0];
                CanonicalImage::borrowed(
                    plane.data,
                    frame.width,
                    frame.height,
                    plane.stride,
                    Channels::Luma,
                )
            }
            _ => {
                let luma = frame_to_luma(frame);
                CanonicalImage::owned(luma, frame.width, frame.height, Channels::Luma)
            }
        };

        trace!(
            format = %frame.format,
            borrowed = canonical.is_borrowed(),
            "Prepared luma buffer"
        );
        Ok(canonical)
    }

    /// Color buffer for capture
    ///
    /// RGB24 is borrowed; monochrome sources stay single channel so they are
    /// encoded as grayscale instead of being tripled.
    pub fn to_color<'a>(frame: &Frame<'a>) -> Result<CanonicalImage<'a>, FrameError> {
        frame.validate()?;

        let canonical = match frame.format {
            PixelFormat::RGB24 => {
                let plane = frame.planes()[0];
                CanonicalImage::borrowed(
                    plane.data,
                    frame.width,
                    frame.height,
                    plane.stride,
                    Channels::Rgb,
                )
            }
            PixelFormat::Gray8 => return Self::to_luma(frame),
            _ => {
                let rgb = frame_to_rgb(frame);
                CanonicalImage::owned(rgb, frame.width, frame.height, Channels::Rgb)
            }
        };

        trace!(
            format = %frame.format,
            borrowed = canonical.is_borrowed(),
            "Prepared color buffer"
        );
        Ok(canonical)
    }
}
