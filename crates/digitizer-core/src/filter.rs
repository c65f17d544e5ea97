// File: crates/digitizer-core/src/filter.rs
// Summary: Color filtering: per-pixel metric, binary mask construction, histogram and mask cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::{DigitizeError, Result};
use crate::grid::GridLine;
use crate::mask::{BinaryMask, GridRemovalSettings};
use crate::types::MAX_RGB_DISTANCE;

/// Scalar used to separate curve pixels from background.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// sqrt(R^2 + G^2 + B^2)
    #[default]
    Intensity,
    /// HSV hue in degrees [0, 360)
    Hue,
    /// HSV saturation in percent [0, 100]
    Saturation,
    /// HSV value in percent [0, 100]
    Value,
    /// RGB distance from the background color.
    Foreground,
}

impl FilterMode {
    pub const ALL: [FilterMode; 5] = [
        FilterMode::Intensity,
        FilterMode::Hue,
        FilterMode::Saturation,
        FilterMode::Value,
        FilterMode::Foreground,
    ];

    /// Inclusive metric range for this mode.
    pub const fn range(self) -> (f64, f64) {
        match self {
            FilterMode::Intensity | FilterMode::Foreground => (0.0, MAX_RGB_DISTANCE),
            FilterMode::Hue => (0.0, 360.0),
            FilterMode::Saturation | FilterMode::Value => (0.0, 100.0),
        }
    }
}

/// Per-curve filter configuration. A pixel is ON iff `low <= metric <= high`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub mode: FilterMode,
    /// Reference color for `Foreground` mode.
    pub background: [u8; 3],
    pub low: f64,
    pub high: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self::for_mode(FilterMode::Intensity)
    }
}

impl FilterSettings {
    /// Default band for a mode, assuming dark curves on a light background.
    pub fn for_mode(mode: FilterMode) -> Self {
        let (lo, hi) = mode.range();
        let (low, high) = match mode {
            FilterMode::Intensity => (lo, hi * 0.5),
            FilterMode::Foreground => (hi * 0.1, hi),
            FilterMode::Hue => (180.0, 360.0),
            FilterMode::Saturation => (50.0, 100.0),
            FilterMode::Value => (0.0, 50.0),
        };
        Self { mode, background: [255, 255, 255], low, high }
    }

    pub fn with_band(mut self, low: f64, high: f64) -> Self {
        self.low = low;
        self.high = high;
        self
    }

    pub fn with_background(mut self, background: [u8; 3]) -> Self {
        self.background = background;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.low <= self.high) {
            return Err(DigitizeError::InvalidSettings(format!(
                "filter band low {} exceeds high {}",
                self.low, self.high
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn metric(&self, px: Rgb<u8>) -> f64 {
        compute_metric(self.mode, px, Rgb(self.background))
    }

    #[inline]
    pub fn is_on(&self, px: Rgb<u8>) -> bool {
        let m = self.metric(px);
        m >= self.low && m <= self.high
    }
}

/// Metric for one pixel under `mode`.
pub fn compute_metric(mode: FilterMode, px: Rgb<u8>, background: Rgb<u8>) -> f64 {
    let [r, g, b] = px.0.map(f64::from);
    match mode {
        FilterMode::Intensity => (r * r + g * g + b * b).sqrt(),
        FilterMode::Foreground => {
            let [rb, gb, bb] = background.0.map(f64::from);
            ((r - rb).powi(2) + (g - gb).powi(2) + (b - bb).powi(2)).sqrt()
        }
        FilterMode::Hue => hsv(r, g, b).0,
        FilterMode::Saturation => hsv(r, g, b).1,
        FilterMode::Value => hsv(r, g, b).2,
    }
}

/// Standard HSV decomposition: hue in degrees, saturation/value in percent.
fn hsv(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let value = max / 255.0 * 100.0;
    let saturation = if max <= 0.0 { 0.0 } else { delta / max * 100.0 };
    let hue = if delta <= 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    (hue, saturation, value)
}

/// Filter `image` into a mask.
pub fn build_mask(image: &RgbImage, settings: &FilterSettings) -> BinaryMask {
    let mask = BinaryMask::from_fn(image.width(), image.height(), |x, y| {
        settings.is_on(*image.get_pixel(x, y))
    });
    tracing::debug!(
        mode = ?settings.mode,
        on = mask.count_on(),
        width = image.width(),
        height = image.height(),
        "mask built"
    );
    mask
}

/// As [`build_mask`], checking `token` between rows. No mask escapes a cancelled build.
pub fn build_mask_cancellable(
    image: &RgbImage,
    settings: &FilterSettings,
    token: &CancelToken,
) -> Result<BinaryMask> {
    let mut mask = BinaryMask::new(image.width(), image.height());
    for y in 0..image.height() {
        token.check()?;
        for x in 0..image.width() {
            if settings.is_on(*image.get_pixel(x, y)) {
                mask.set(x, y, true);
            }
        }
    }
    Ok(mask)
}

/// Bucketed counts of the filter metric across every pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    pub mode: FilterMode,
    pub min: f64,
    pub max: f64,
    pub counts: Vec<u32>,
}

impl Histogram {
    pub fn compute(image: &RgbImage, settings: &FilterSettings, buckets: usize) -> Self {
        let buckets = buckets.max(1);
        let (min, max) = settings.mode.range();
        let mut counts = vec![0u32; buckets];
        for px in image.pixels() {
            let i = bucket_index(settings.metric(*px), min, max, buckets);
            counts[i] += 1;
        }
        Self { mode: settings.mode, min, max, counts }
    }

    pub fn bucket_width(&self) -> f64 {
        (self.max - self.min) / self.counts.len() as f64
    }

    /// Lower bound of bucket `i`.
    pub fn bucket_start(&self, i: usize) -> f64 {
        self.min + self.bucket_width() * i as f64
    }

    pub fn bucket_of(&self, metric: f64) -> usize {
        bucket_index(metric, self.min, self.max, self.counts.len())
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Largest bucket count, for normalising a plot.
    pub fn peak(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

fn bucket_index(metric: f64, min: f64, max: f64, buckets: usize) -> usize {
    let span = (max - min).max(f64::EPSILON);
    let t = ((metric - min) / span).clamp(0.0, 1.0);
    ((t * buckets as f64) as usize).min(buckets - 1)
}

/// Most common color after quantising each channel to 16 levels.
/// Used as the default reference for `Foreground` mode.
pub fn estimate_background(image: &RgbImage) -> [u8; 3] {
    let mut counts: HashMap<[u8; 3], u32> = HashMap::new();
    for px in image.pixels() {
        let key = px.0.map(|c| c & 0xF0);
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(key, _)| key.map(|c| c | 0x08))
        .unwrap_or([255, 255, 255])
}

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

/// RGB raster with a revision stamp; each replacement gets a fresh revision.
#[derive(Clone, Debug)]
pub struct SourceImage {
    revision: u64,
    rgb: Arc<RgbImage>,
}

impl SourceImage {
    pub fn new(rgb: RgbImage) -> Self {
        Self { revision: NEXT_REVISION.fetch_add(1, Ordering::Relaxed), rgb: Arc::new(rgb) }
    }

    pub fn replace(&mut self, rgb: RgbImage) {
        *self = Self::new(rgb);
    }

    pub fn revision(&self) -> u64 { self.revision }
    pub fn rgb(&self) -> &RgbImage { &self.rgb }
    pub fn width(&self) -> u32 { self.rgb.width() }
    pub fn height(&self) -> u32 { self.rgb.height() }
}

#[derive(Clone, Debug)]
struct CachedMask {
    revision: u64,
    mask: Arc<BinaryMask>,
}

/// Owns one curve's filter settings and its lazily built mask.
#[derive(Clone, Debug, Default)]
pub struct MaskCache {
    settings: FilterSettings,
    removal: GridRemovalSettings,
    grid_lines: Vec<GridLine>,
    cached: Option<CachedMask>,
}

impl MaskCache {
    pub fn new(settings: FilterSettings) -> Self {
        Self { settings, ..Self::default() }
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: FilterSettings) -> Result<()> {
        settings.validate()?;
        if settings != self.settings {
            self.settings = settings;
            self.invalidate();
        }
        Ok(())
    }

    /// Configure grid-line removal; `lines` come from the grid module.
    pub fn set_grid_removal(&mut self, removal: GridRemovalSettings, lines: Vec<GridLine>) {
        self.removal = removal;
        self.grid_lines = lines;
        self.invalidate();
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn is_valid_for(&self, image: &SourceImage) -> bool {
        self.cached.as_ref().is_some_and(|c| c.revision == image.revision())
    }

    /// Mask for `image`, rebuilt only when stale.
    pub fn mask(&mut self, image: &SourceImage) -> Arc<BinaryMask> {
        if let Some(c) = self.cached.as_ref().filter(|c| c.revision == image.revision()) {
            return Arc::clone(&c.mask);
        }
        let mut mask = build_mask(image.rgb(), &self.settings);
        self.apply_grid_removal(&mut mask);
        self.store(image, mask)
    }

    /// As [`MaskCache::mask`]; a cancelled rebuild leaves the cache as it was.
    pub fn mask_cancellable(&mut self, image: &SourceImage, token: &CancelToken) -> Result<Arc<BinaryMask>> {
        if let Some(c) = self.cached.as_ref().filter(|c| c.revision == image.revision()) {
            return Ok(Arc::clone(&c.mask));
        }
        let mut mask = build_mask_cancellable(image.rgb(), &self.settings, token)?;
        token.check()?;
        self.apply_grid_removal(&mut mask);
        Ok(self.store(image, mask))
    }

    fn apply_grid_removal(&self, mask: &mut BinaryMask) {
        if self.removal.is_active() {
            mask.remove_grid_lines(&self.grid_lines, self.removal.distance_px);
        }
    }

    fn store(&mut self, image: &SourceImage, mask: BinaryMask) -> Arc<BinaryMask> {
        let mask = Arc::new(mask);
        self.cached = Some(CachedMask { revision: image.revision(), mask: Arc::clone(&mask) });
        tracing::info!(revision = image.revision(), mode = ?self.settings.mode, "curve mask rebuilt");
        mask
    }
}
