// File: crates/digitizer-core/src/point_match.rs
// Summary: Point match session: sample a marker blob, then propose similar blobs one at a time.

use std::convert::Infallible;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::{DigitizeError, Result};
use crate::geometry::{Point2, RectI32};
use crate::mask::BinaryMask;
use crate::segment::resolve_seed;
use crate::types::{DEFAULT_MAX_POINT_SIZE, DEFAULT_SIZE_TOLERANCE};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointMatchSettings {
    /// Largest accepted blob bounding box edge, in pixels.
    pub max_point_size: u32,
    /// Accepted relative deviation of a candidate's pixel count from the template's.
    pub size_tolerance: f64,
}

impl Default for PointMatchSettings {
    fn default() -> Self {
        Self { max_point_size: DEFAULT_MAX_POINT_SIZE, size_tolerance: DEFAULT_SIZE_TOLERANCE }
    }
}

impl PointMatchSettings {
    pub fn validate(&self) -> Result<()> {
        if self.max_point_size == 0 {
            return Err(DigitizeError::InvalidSettings("max point size must be positive".into()));
        }
        if !(self.size_tolerance >= 0.0) {
            return Err(DigitizeError::InvalidSettings("size tolerance must be non-negative".into()));
        }
        Ok(())
    }
}

/// Size/shape summary of one connected blob.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Blob {
    pub pixel_count: usize,
    pub bbox: RectI32,
    pub centroid: Point2,
}

/// The sampled marker.
pub type Template = Blob;
/// A blob proposed as another instance of the template.
pub type Candidate = Blob;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MatchStep {
    Candidate(Candidate),
    /// Every component has been visited. Normal termination.
    Done,
}

const CANCEL_POLL: usize = 4096;

const NEIGHBORS: [(i64, i64); 8] = [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

/// Interactive matching state. Each component is examined at most once and a
/// candidate is returned at most once.
#[derive(Clone, Debug)]
pub struct PointMatchSession {
    mask: Arc<BinaryMask>,
    settings: PointMatchSettings,
    template: Template,
    visited: BinaryMask,
    /// Next raster index to scan.
    cursor: usize,
    pending: Option<Candidate>,
    accepted: Vec<Point2>,
    rejected: usize,
    /// Points already on the curve; blobs whose box holds one are skipped.
    existing: Vec<Point2>,
}

impl PointMatchSession {
    /// Capture the component under `sample`, clipped to a `max_point_size` box, as the template.
    pub fn start(mask: Arc<BinaryMask>, sample: (u32, u32), settings: PointMatchSettings) -> Result<Self> {
        Self::start_excluding(mask, sample, settings, &[])
    }

    /// As [`PointMatchSession::start`]; components whose bounding box holds one of the
    /// `existing` points are never proposed, so hollow markers are caught as well as solid ones.
    pub fn start_excluding(
        mask: Arc<BinaryMask>,
        sample: (u32, u32),
        settings: PointMatchSettings,
        existing: &[Point2],
    ) -> Result<Self> {
        settings.validate()?;
        let origin = resolve_seed(&mask, sample)?;
        // The sampled blob stays unvisited so it is proposed like any other.
        let mut scratch = BinaryMask::new(mask.width(), mask.height());
        let pixels = infallible(flood(&mask, &mut scratch, origin, &mut never_cancelled));

        let half = i64::from(settings.max_point_size / 2);
        let window = RectI32::from_ltwh(
            (i64::from(origin.0) - half) as i32,
            (i64::from(origin.1) - half) as i32,
            settings.max_point_size as i32,
            settings.max_point_size as i32,
        );
        let inside: Vec<(u32, u32)> = pixels
            .into_iter()
            .filter(|&(x, y)| window.contains(x as i32, y as i32))
            .collect();
        let template = summarize(&inside).unwrap_or(Blob {
            pixel_count: 1,
            bbox: RectI32::from_pixel(origin.0 as i32, origin.1 as i32),
            centroid: Point2::new(f64::from(origin.0), f64::from(origin.1)),
        });

        tracing::debug!(
            pixels = template.pixel_count,
            width = template.bbox.width(),
            height = template.bbox.height(),
            existing = existing.len(),
            "point match template captured"
        );
        let visited = BinaryMask::new(mask.width(), mask.height());
        Ok(Self {
            mask,
            settings,
            template,
            visited,
            cursor: 0,
            pending: None,
            accepted: Vec::new(),
            rejected: 0,
            existing: existing.to_vec(),
        })
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn settings(&self) -> &PointMatchSettings {
        &self.settings
    }

    /// Current candidate, scanning forward for a new one when none is pending.
    /// Repeated calls without accept/reject return the same pending candidate.
    pub fn next(&mut self) -> MatchStep {
        infallible(self.scan(&mut never_cancelled))
    }

    pub fn next_cancellable(&mut self, token: &CancelToken) -> Result<MatchStep> {
        self.scan(&mut || token.check())
    }

    /// Accept the pending candidate, returning its centroid for curve insertion.
    pub fn accept(&mut self) -> Option<Point2> {
        let c = self.pending.take()?;
        self.accepted.push(c.centroid);
        Some(c.centroid)
    }

    /// Discard the pending candidate.
    pub fn reject(&mut self) -> Option<Candidate> {
        let c = self.pending.take()?;
        self.rejected += 1;
        Some(c)
    }

    pub fn accepted(&self) -> &[Point2] {
        &self.accepted
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_none() && self.cursor >= self.raster_len()
    }

    fn raster_len(&self) -> usize {
        self.mask.width() as usize * self.mask.height() as usize
    }

    fn matches(&self, blob: &Blob) -> bool {
        let max = self.settings.max_point_size as i32;
        if blob.bbox.width() > max || blob.bbox.height() > max {
            return false;
        }
        let t = self.template.pixel_count as f64;
        let diff = (blob.pixel_count as f64 - t).abs();
        diff <= self.settings.size_tolerance * t
    }

    fn holds_existing(&self, blob: &Blob) -> bool {
        let b = &blob.bbox;
        // one pixel of slack around the box
        self.existing.iter().any(|p| {
            (f64::from(b.left - 1)..=f64::from(b.right)).contains(&p.x)
                && (f64::from(b.top - 1)..=f64::from(b.bottom)).contains(&p.y)
        })
    }

    fn scan<E>(
        &mut self,
        poll: &mut impl FnMut() -> std::result::Result<(), E>,
    ) -> std::result::Result<MatchStep, E> {
        if let Some(c) = self.pending {
            return Ok(MatchStep::Candidate(c));
        }
        let width = self.mask.width() as usize;
        let total = self.raster_len();
        let mut skipped = 0usize;
        while self.cursor < total {
            if self.cursor % CANCEL_POLL == 0 {
                poll()?;
            }
            let x = (self.cursor % width) as u32;
            let y = (self.cursor / width) as u32;
            if !self.mask.get(x, y) || self.visited.get(x, y) {
                self.cursor += 1;
                continue;
            }
            let pixels = flood(&self.mask, &mut self.visited, (x, y), &mut *poll)?;
            self.cursor += 1;
            let Some(blob) = summarize(&pixels) else { continue };
            if self.holds_existing(&blob) {
                skipped += 1;
                continue;
            }
            if self.matches(&blob) {
                tracing::debug!(x = blob.centroid.x, y = blob.centroid.y, skipped, "point match candidate");
                self.pending = Some(blob);
                return Ok(MatchStep::Candidate(blob));
            }
            skipped += 1;
        }
        tracing::debug!(accepted = self.accepted.len(), rejected = self.rejected, "point match done");
        Ok(MatchStep::Done)
    }
}

fn never_cancelled() -> std::result::Result<(), Infallible> {
    Ok(())
}

fn infallible<T>(r: std::result::Result<T, Infallible>) -> T {
    match r {
        Ok(v) => v,
        Err(never) => match never {},
    }
}

/// Flood the 8-connected component at `start`, marking it visited.
/// A cancelled flood unmarks what it marked.
fn flood<E>(
    mask: &BinaryMask,
    visited: &mut BinaryMask,
    start: (u32, u32),
    poll: &mut impl FnMut() -> std::result::Result<(), E>,
) -> std::result::Result<Vec<(u32, u32)>, E> {
    let mut pixels = vec![start];
    visited.set(start.0, start.1, true);
    let mut head = 0usize;
    while head < pixels.len() {
        if head % CANCEL_POLL == CANCEL_POLL - 1 {
            if let Err(e) = poll() {
                for &(x, y) in &pixels {
                    visited.set(x, y, false);
                }
                return Err(e);
            }
        }
        let (x, y) = pixels[head];
        head += 1;
        for (dx, dy) in NEIGHBORS {
            let (nx, ny) = (i64::from(x) + dx, i64::from(y) + dy);
            if mask.get_signed(nx, ny) && !visited.get_signed(nx, ny) {
                visited.set(nx as u32, ny as u32, true);
                pixels.push((nx as u32, ny as u32));
            }
        }
    }
    Ok(pixels)
}

fn summarize(pixels: &[(u32, u32)]) -> Option<Blob> {
    let &(x0, y0) = pixels.first()?;
    let mut bbox = RectI32::from_pixel(x0 as i32, y0 as i32);
    let (mut sx, mut sy) = (0.0f64, 0.0f64);
    for &(x, y) in pixels {
        bbox.include(x as i32, y as i32);
        sx += f64::from(x);
        sy += f64::from(y);
    }
    let n = pixels.len() as f64;
    Some(Blob { pixel_count: pixels.len(), bbox, centroid: Point2::new(sx / n, sy / n) })
}
