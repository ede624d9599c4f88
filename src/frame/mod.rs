// SPDX-License-Identifier: GPL-3.0-only

//! Borrowed camera frames
//!
//! A [`Frame`] describes one delivered pixel buffer: its geometry, pixel
//! format and one [`PlaneView`] per plane. The frame only borrows caller
//! memory; nothing in the engine keeps it past the call that received it.

pub mod adapter;

pub use adapter::{CanonicalImage, Channels, LumaView, PixelBufferAdapter};

use crate::errors::FrameError;
use serde::{Deserialize, Serialize};

/// Pixel format of a delivered frame
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (R G B A byte order)
    RGBA,
    /// BGRA - 32-bit with alpha (B G R A byte order)
    BGRA,
    /// ABGR - 32-bit with alpha (A B G R byte order)
    ABGR,
    /// RGB24 - 24-bit RGB, no alpha
    RGB24,
    /// Gray8 - 8-bit single channel luminance
    Gray8,
    /// NV12 - Semi-planar 4:2:0 (Y plane + interleaved UV plane)
    NV12,
    /// NV21 - Semi-planar 4:2:0 (Y plane + interleaved VU plane)
    NV21,
    /// I420 - Planar 4:2:0 (separate Y, U, V planes)
    I420,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V)
    YUYV,
    /// UYVY - Packed 4:2:2 (U Y0 V Y1)
    UYVY,
    /// YVYU - Packed 4:2:2 (Y0 V Y1 U)
    YVYU,
    /// VYUY - Packed 4:2:2 (V Y0 U Y1)
    VYUY,
}

impl PixelFormat {
    /// Check if this is a YUV format
    pub fn is_yuv(&self) -> bool {
        matches!(
            self,
            Self::NV12
                | Self::NV21
                | Self::I420
                | Self::YUYV
                | Self::UYVY
                | Self::YVYU
                | Self::VYUY
        )
    }

    /// Number of planes the format is delivered in
    pub fn plane_count(&self) -> usize {
        match self {
            Self::NV12 | Self::NV21 => 2,
            Self::I420 => 3,
            _ => 1,
        }
    }

    /// Minimum bytes per row and number of rows for one plane
    ///
    /// Chroma planes of 4:2:0 formats round odd dimensions up.
    pub fn plane_geometry(&self, plane: usize, width: u32, height: u32) -> (usize, usize) {
        let w = width as usize;
        let h = height as usize;
        let half_w = w.div_ceil(2);
        let half_h = h.div_ceil(2);
        match (self, plane) {
            (Self::RGBA | Self::BGRA | Self::ABGR, _) => (w * 4, h),
            (Self::RGB24, _) => (w * 3, h),
            (Self::Gray8, _) => (w, h),
            (Self::YUYV | Self::UYVY | Self::YVYU | Self::VYUY, _) => (half_w * 4, h),
            (Self::NV12 | Self::NV21 | Self::I420, 0) => (w, h),
            (Self::NV12 | Self::NV21, _) => (half_w * 2, half_h),
            (Self::I420, _) => (half_w, half_h),
        }
    }

    /// Parse a FourCC or GStreamer format name
    pub fn from_fourcc(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "RGBA" | "RGBX" | "AB24" => Some(Self::RGBA),
            "BGRA" | "BGRX" | "AR24" => Some(Self::BGRA),
            "ABGR" | "XBGR" => Some(Self::ABGR),
            "RGB" | "RGB3" | "RGB24" => Some(Self::RGB24),
            "GRAY8" | "GREY" | "Y8" | "Y800" | "L8" => Some(Self::Gray8),
            "NV12" => Some(Self::NV12),
            "NV21" => Some(Self::NV21),
            "I420" | "YU12" | "IYUV" => Some(Self::I420),
            "YUYV" | "YUY2" => Some(Self::YUYV),
            "UYVY" => Some(Self::UYVY),
            "YVYU" => Some(Self::YVYU),
            "VYUY" => Some(Self::VYUY),
            _ => None,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Read-only view over one plane of a frame
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    /// Plane bytes, starting at the first row
    pub data: &'a [u8],
    /// Bytes per row, including padding
    pub stride: usize,
}

impl<'a> PlaneView<'a> {
    pub fn new(data: &'a [u8], stride: usize) -> Self {
        Self { data, stride }
    }

    /// Row `y` truncated to `len` bytes (empty if out of bounds)
    pub fn row(&self, y: usize, len: usize) -> &'a [u8] {
        let start = y * self.stride;
        self.data.get(start..start + len).unwrap_or(&[])
    }
}

/// A single borrowed camera frame
///
/// Planar formats carry one view per plane in Y, U(V), V order.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    planes: Vec<PlaneView<'a>>,
}

impl<'a> Frame<'a> {
    /// Frame delivered as a single packed plane
    pub fn packed(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
    ) -> Self {
        Self {
            width,
            height,
            format,
            planes: vec![PlaneView::new(data, stride)],
        }
    }

    /// Frame with explicit plane views
    pub fn planar(
        width: u32,
        height: u32,
        format: PixelFormat,
        planes: impl IntoIterator<Item = PlaneView<'a>>,
    ) -> Self {
        Self {
            width,
            height,
            format,
            planes: planes.into_iter().collect(),
        }
    }

    /// Frame whose planes are stored back to back in one buffer
    ///
    /// `stride` is the luma (or packed) row stride. Chroma planes follow the
    /// usual layout: NV12/NV21 share the luma stride, I420 uses half of it.
    /// Plane sizes that overflow `usize` are rejected.
    pub fn contiguous(
        data: &'a [u8],
        width: u32,
        height: u32,
        stride: usize,
        format: PixelFormat,
    ) -> Result<Self, FrameError> {
        let rows = height as usize;
        let chroma_rows = rows.div_ceil(2);
        let tail = |offset: usize| data.get(offset..).unwrap_or(&[]);
        let head = |len: usize| &data[..len.min(data.len())];

        let planes = match format {
            PixelFormat::NV12 | PixelFormat::NV21 => {
                let y_size = stride.checked_mul(rows).ok_or(FrameError::Overflow)?;
                vec![
                    PlaneView::new(head(y_size), stride),
                    PlaneView::new(tail(y_size), stride),
                ]
            }
            PixelFormat::I420 => {
                let y_size = stride.checked_mul(rows).ok_or(FrameError::Overflow)?;
                let c_stride = stride.div_ceil(2);
                let c_size = c_stride
                    .checked_mul(chroma_rows)
                    .ok_or(FrameError::Overflow)?;
                let v_offset = y_size.checked_add(c_size).ok_or(FrameError::Overflow)?;
                let u = tail(y_size);
                vec![
                    PlaneView::new(head(y_size), stride),
                    PlaneView::new(&u[..c_size.min(u.len())], c_stride),
                    PlaneView::new(tail(v_offset), c_stride),
                ]
            }
            _ => vec![PlaneView::new(data, stride)],
        };

        Ok(Self {
            width,
            height,
            format,
            planes,
        })
    }

    /// All plane views in order
    pub fn planes(&self) -> &[PlaneView<'a>] {
        &self.planes
    }

    /// Plane view by index
    pub fn plane(&self, index: usize) -> Option<&PlaneView<'a>> {
        self.planes.get(index)
    }

    /// Check that the planes can hold the declared geometry
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.width == 0 || self.height == 0 {
            return Err(FrameError::ZeroArea {
                width: self.width,
                height: self.height,
            });
        }

        let expected = self.format.plane_count();
        if self.planes.len() != expected {
            return Err(FrameError::PlaneCount {
                format: self.format,
                expected,
                found: self.planes.len(),
            });
        }

        for (index, plane) in self.planes.iter().enumerate() {
            let (row_bytes, rows) = self.format.plane_geometry(index, self.width, self.height);
            if plane.stride < row_bytes {
                return Err(FrameError::StrideTooSmall {
                    plane: index,
                    stride: plane.stride,
                    min: row_bytes,
                });
            }
            let needed = plane
                .stride
                .checked_mul(rows - 1)
                .and_then(|n| n.checked_add(row_bytes))
                .ok_or(FrameError::Overflow)?;
            if plane.data.len() < needed {
                return Err(FrameError::PlaneTooShort {
                    plane: index,
                    len: plane.data.len(),
                    needed,
                });
            }
        }

        Ok(())
    }
}
