// SPDX-License-Identifier: GPL-3.0-only

//! Region partitioning
//!
//! Without quadrant mode the whole frame is one region. With it, the frame
//! is split into four quadrants followed by a center region of the same
//! size, so a symbol straddling a quadrant border still lies wholly inside
//! the center one.

use crate::frame::LumaView;
use std::fmt;

/// Which part of the frame a region covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Full,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionKind::Full => "full",
            RegionKind::TopLeft => "top-left",
            RegionKind::TopRight => "top-right",
            RegionKind::BottomLeft => "bottom-left",
            RegionKind::BottomRight => "bottom-right",
            RegionKind::Center => "center",
        };
        f.write_str(name)
    }
}

/// Scan order in quadrant mode
const QUADRANT_ORDER: [RegionKind; 5] = [
    RegionKind::TopLeft,
    RegionKind::TopRight,
    RegionKind::BottomLeft,
    RegionKind::BottomRight,
    RegionKind::Center,
];

/// Region rectangle in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionBounds {
    pub kind: RegionKind,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RegionBounds {
    /// Bounds of `kind` inside a `width` x `height` frame
    ///
    /// Right and bottom quadrants absorb the odd pixel so the four
    /// quadrants tile the frame exactly.
    pub fn of(kind: RegionKind, width: u32, height: u32) -> Self {
        let (half_w, half_h) = (width / 2, height / 2);
        let (x, y, w, h) = match kind {
            RegionKind::Full => (0, 0, width, height),
            RegionKind::TopLeft => (0, 0, half_w, half_h),
            RegionKind::TopRight => (half_w, 0, width - half_w, half_h),
            RegionKind::BottomLeft => (0, half_h, half_w, height - half_h),
            RegionKind::BottomRight => (half_w, half_h, width - half_w, height - half_h),
            RegionKind::Center => (width / 4, height / 4, half_w, half_h),
        };
        Self {
            kind,
            x,
            y,
            width: w,
            height: h,
        }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// Lazy, single-pass sequence of regions over one luma frame
///
/// Regions that would be empty (frames narrower than two pixels) are
/// skipped.
pub struct Regions<'a> {
    luma: LumaView<'a>,
    kinds: &'static [RegionKind],
    next: usize,
}

impl<'a> Regions<'a> {
    pub fn new(luma: LumaView<'a>, by_quadrant: bool) -> Self {
        let kinds: &'static [RegionKind] = if by_quadrant {
            &QUADRANT_ORDER
        } else {
            &[RegionKind::Full]
        };
        Self {
            luma,
            kinds,
            next: 0,
        }
    }
}

impl<'a> Iterator for Regions<'a> {
    type Item = (RegionBounds, LumaView<'a>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&kind) = self.kinds.get(self.next) {
            self.next += 1;
            let bounds = RegionBounds::of(kind, self.luma.width(), self.luma.height());
            if let Some(view) = self.luma.window(bounds.x, bounds.y, bounds.width, bounds.height) {
                return Some((bounds, view));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(data: &[u8], width: u32, height: u32) -> LumaView<'_> {
        LumaView::new(data, width, height, width as usize).unwrap()
    }

    #[test]
    fn test_single_region_without_quadrants() {
        let data = vec![0u8; 64 * 48];
        let regions: Vec<_> = Regions::new(view(&data, 64, 48), false).collect();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].0, RegionBounds::of(RegionKind::Full, 64, 48));
        assert_eq!((regions[0].1.width(), regions[0].1.height()), (64, 48));
    }

    #[test]
    fn test_quadrant_order_and_geometry() {
        let data = vec![0u8; 640 * 480];
        let bounds: Vec<RegionBounds> = Regions::new(view(&data, 640, 480), true)
            .map(|(bounds, _)| bounds)
            .collect();
        let kinds: Vec<RegionKind> = bounds.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, QUADRANT_ORDER.to_vec());

        let rects: Vec<(u32, u32, u32, u32)> =
            bounds.iter().map(|b| (b.x, b.y, b.width, b.height)).collect();
        assert_eq!(
            rects,
            vec![
                (0, 0, 320, 240),
                (320, 0, 320, 240),
                (0, 240, 320, 240),
                (320, 240, 320, 240),
                (160, 120, 320, 240),
            ]
        );
    }

    #[test]
    fn test_odd_sizes_tile_the_frame() {
        let (width, height) = (101, 77);
        let quadrants = [
            RegionKind::TopLeft,
            RegionKind::TopRight,
            RegionKind::BottomLeft,
            RegionKind::BottomRight,
        ]
        .map(|kind| RegionBounds::of(kind, width, height));

        for y in 0..height {
            for x in 0..width {
                let covering = quadrants.iter().filter(|b| b.contains(x, y)).count();
                assert_eq!(covering, 1, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_center_covers_quadrant_borders() {
        let center = RegionBounds::of(RegionKind::Center, 640, 480);
        assert!(center.contains(320, 240));
        assert!(center.contains(200, 240));
        assert!(center.contains(320, 150));
    }

    #[test]
    fn test_region_views_see_frame_pixels() {
        let mut data = vec![0u8; 8 * 8];
        // Marker at the origin of the bottom-right quadrant
        data[4 * 8 + 4] = 200;
        let (_, bottom_right) = Regions::new(view(&data, 8, 8), true)
            .find(|(bounds, _)| bounds.kind == RegionKind::BottomRight)
            .unwrap();
        assert_eq!(bottom_right.get(0, 0), 200);
    }

    #[test]
    fn test_tiny_frame_skips_empty_regions() {
        let data = vec![0u8; 1];
        let regions: Vec<_> = Regions::new(view(&data, 1, 1), true).collect();
        // Only quadrants with a non-zero size survive
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].0.kind, RegionKind::BottomRight);
    }
}
