// File: crates/digitizer-core/src/mask.rs
// Summary: Packed one-bit-per-pixel foreground mask and grid-line pixel removal.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::geometry::{distance_to_segment, Point2};
use crate::grid::GridLine;
use crate::types::DEFAULT_GRID_REMOVAL_PX;

const WORD_BITS: usize = 64;

/// Width x height bitmap; ON marks a foreground candidate.
#[derive(Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    words: Vec<u64>,
}

impl std::fmt::Debug for BinaryMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryMask")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("on", &self.count_on())
            .finish()
    }
}

impl BinaryMask {
    /// All-OFF mask.
    pub fn new(width: u32, height: u32) -> Self {
        let bits = width as usize * height as usize;
        Self { width, height, words: vec![0; bits.div_ceil(WORD_BITS)] }
    }

    /// Build from a predicate over pixel coordinates.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut m = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    m.set(x, y, true);
                }
            }
        }
        m
    }

    pub const fn width(&self) -> u32 { self.width }
    pub const fn height(&self) -> u32 { self.height }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64
    }

    /// Out-of-bounds reads are OFF.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let i = self.index(x, y);
        (self.words[i / WORD_BITS] >> (i % WORD_BITS)) & 1 == 1
    }

    #[inline]
    pub fn get_signed(&self, x: i64, y: i64) -> bool {
        self.in_bounds(x, y) && self.get(x as u32, y as u32)
    }

    /// Out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.index(x, y);
        let bit = 1u64 << (i % WORD_BITS);
        if on {
            self.words[i / WORD_BITS] |= bit;
        } else {
            self.words[i / WORD_BITS] &= !bit;
        }
    }

    pub fn count_on(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// ON pixels in raster order (ascending y, then x).
    pub fn iter_on(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let w = self.width;
        (0..self.height).flat_map(move |y| (0..w).map(move |x| (x, y))).filter(|&(x, y)| self.get(x, y))
    }

    /// ON = black, OFF = white; handy for debugging dumps.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            if self.get(x, y) { Luma([0]) } else { Luma([255]) }
        })
    }

    /// Force OFF every pixel within `distance` of any grid line.
    /// Returns the number of pixels turned off. `distance <= 0` is a no-op.
    pub fn remove_grid_lines(&mut self, lines: &[GridLine], distance: f64) -> usize {
        if distance <= 0.0 {
            return 0;
        }
        let mut removed = 0usize;
        for line in lines {
            for seg in line.path.windows(2) {
                removed += self.clear_near_segment(seg[0], seg[1], distance);
            }
        }
        tracing::debug!(removed, lines = lines.len(), "grid-line pixels removed");
        removed
    }

    fn clear_near_segment(&mut self, a: Point2, b: Point2, distance: f64) -> usize {
        let x0 = (a.x.min(b.x) - distance).floor().max(0.0);
        let x1 = (a.x.max(b.x) + distance).ceil().min(self.width as f64 - 1.0);
        let y0 = (a.y.min(b.y) - distance).floor().max(0.0);
        let y1 = (a.y.max(b.y) + distance).ceil().min(self.height as f64 - 1.0);
        if x0 > x1 || y0 > y1 {
            return 0;
        }
        let mut removed = 0usize;
        for y in y0 as u32..=y1 as u32 {
            for x in x0 as u32..=x1 as u32 {
                if self.get(x, y)
                    && distance_to_segment(Point2::new(x as f64, y as f64), a, b) <= distance
                {
                    self.set(x, y, false);
                    removed += 1;
                }
            }
        }
        removed
    }
}

/// Grid-line removal step applied after color filtering.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridRemovalSettings {
    pub enabled: bool,
    /// Pixels within this distance of a grid line are forced OFF; <= 0 disables.
    pub distance_px: f64,
}

impl Default for GridRemovalSettings {
    fn default() -> Self {
        Self { enabled: false, distance_px: DEFAULT_GRID_REMOVAL_PX }
    }
}

impl GridRemovalSettings {
    pub fn is_active(&self) -> bool {
        self.enabled && self.distance_px > 0.0
    }
}
