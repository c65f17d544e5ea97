// File: crates/digitizer-core/src/segment.rs
// Summary: Segment fill: flood the stroke under a seed pixel, walk its centerline and emit
//          evenly spaced points.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::error::{DigitizeError, Result};
use crate::geometry::Point2;
use crate::mask::BinaryMask;
use crate::types::{DEFAULT_MIN_SEGMENT_LENGTH, DEFAULT_POINT_SEPARATION, SEED_SEARCH_RADIUS};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentFillSettings {
    /// Arc length between emitted points, in pixels.
    pub point_separation: f64,
    /// Segments yielding fewer points are discarded as noise.
    pub min_segment_length: usize,
    /// Always emit a point at curvature peaks.
    pub fill_corners: bool,
}

impl Default for SegmentFillSettings {
    fn default() -> Self {
        Self {
            point_separation: DEFAULT_POINT_SEPARATION,
            min_segment_length: DEFAULT_MIN_SEGMENT_LENGTH,
            fill_corners: false,
        }
    }
}

impl SegmentFillSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.point_separation > 0.0) {
            return Err(DigitizeError::InvalidSettings(format!(
                "point separation {} must be positive",
                self.point_separation
            )));
        }
        Ok(())
    }
}

/// Chamfer weights approximating 1 and sqrt(2).
const ORTHO_COST: u32 = 5;
const DIAG_COST: u32 = 7;

/// Steps between curvature samples when looking for corners.
const CORNER_WINDOW: usize = 4;
/// Turning angle (radians) above which a path pixel may be a corner.
const CORNER_ANGLE: f64 = 40.0 * std::f64::consts::PI / 180.0;

/// How often long loops poll the cancel token.
const CANCEL_POLL: usize = 4096;

const NEIGHBORS: [(i64, i64, u32); 8] = [
    (-1, -1, DIAG_COST),
    (0, -1, ORTHO_COST),
    (1, -1, DIAG_COST),
    (-1, 0, ORTHO_COST),
    (1, 0, ORTHO_COST),
    (-1, 1, DIAG_COST),
    (0, 1, ORTHO_COST),
    (1, 1, DIAG_COST),
];

/// Tracer over a read-only mask.
#[derive(Clone, Copy, Debug, Default)]
pub struct SegmentFillTracer {
    pub settings: SegmentFillSettings,
}

impl SegmentFillTracer {
    pub fn new(settings: SegmentFillSettings) -> Self {
        Self { settings }
    }

    /// Ordered screen points along the stroke under `seed`.
    pub fn trace(&self, mask: &BinaryMask, seed: (u32, u32)) -> Result<Vec<Point2>> {
        self.run(mask, seed, None)
    }

    pub fn trace_cancellable(&self, mask: &BinaryMask, seed: (u32, u32), token: &CancelToken) -> Result<Vec<Point2>> {
        self.run(mask, seed, Some(token))
    }

    /// Pixel centerline of the stroke under `seed`, from the end nearest the seed.
    /// Closed strokes end on their first pixel.
    pub fn centerline(&self, mask: &BinaryMask, seed: (u32, u32)) -> Result<Vec<(u32, u32)>> {
        let start = resolve_seed(mask, seed)?;
        let region = Region::flood(mask, start, None)?;
        Ok(region.centerline(start, None)?.pixels)
    }

    fn run(&self, mask: &BinaryMask, seed: (u32, u32), token: Option<&CancelToken>) -> Result<Vec<Point2>> {
        self.settings.validate()?;
        let start = resolve_seed(mask, seed)?;
        let region = Region::flood(mask, start, token)?;
        let path = region.centerline(start, token)?;
        let mut points = emit_points(&path.pixels, &self.settings);
        if path.closed && points.len() > 1 && points.first() == points.last() {
            points.pop();
        }
        tracing::debug!(
            region = region.pixels.len(),
            path = path.pixels.len(),
            closed = path.closed,
            emitted = points.len(),
            "segment fill traced"
        );
        if points.len() < self.settings.min_segment_length {
            tracing::debug!(
                emitted = points.len(),
                min = self.settings.min_segment_length,
                "segment shorter than minimum; discarded"
            );
            return Ok(Vec::new());
        }
        Ok(points)
    }
}

/// Free-function form of [`SegmentFillTracer::trace`].
pub fn trace_segment(mask: &BinaryMask, seed: (u32, u32), settings: &SegmentFillSettings) -> Result<Vec<Point2>> {
    SegmentFillTracer::new(*settings).trace(mask, seed)
}

/// The seed itself, or the nearest ON pixel within a small neighborhood.
pub(crate) fn resolve_seed(mask: &BinaryMask, seed: (u32, u32)) -> Result<(u32, u32)> {
    if mask.get(seed.0, seed.1) {
        return Ok(seed);
    }
    let (sx, sy) = (i64::from(seed.0), i64::from(seed.1));
    let r = i64::from(SEED_SEARCH_RADIUS);
    let mut best: Option<(i64, (u32, u32))> = None;
    for dy in -r..=r {
        for dx in -r..=r {
            let (x, y) = (sx + dx, sy + dy);
            if !mask.get_signed(x, y) {
                continue;
            }
            let d2 = dx * dx + dy * dy;
            if best.map_or(true, |(bd, _)| d2 < bd) {
                best = Some((d2, (x as u32, y as u32)));
            }
        }
    }
    best.map(|(_, p)| p).ok_or(DigitizeError::NoForegroundPixel { x: seed.0, y: seed.1 })
}

/// 8-connected ON region with a dense index over its bounding box.
struct Region {
    pixels: Vec<(u32, u32)>,
    left: u32,
    top: u32,
    box_w: usize,
    box_h: usize,
    index: Vec<u32>,
}

const NO_PIXEL: u32 = u32::MAX;

impl Region {
    fn flood(mask: &BinaryMask, start: (u32, u32), token: Option<&CancelToken>) -> Result<Self> {
        let mut visited = BinaryMask::new(mask.width(), mask.height());
        let mut pixels = vec![start];
        visited.set(start.0, start.1, true);
        let mut head = 0usize;
        while head < pixels.len() {
            if head % CANCEL_POLL == 0 {
                poll(token)?;
            }
            let (x, y) = pixels[head];
            head += 1;
            for (dx, dy, _) in NEIGHBORS {
                let (nx, ny) = (i64::from(x) + dx, i64::from(y) + dy);
                if mask.get_signed(nx, ny) && !visited.get_signed(nx, ny) {
                    visited.set(nx as u32, ny as u32, true);
                    pixels.push((nx as u32, ny as u32));
                }
            }
        }

        let left = pixels.iter().map(|p| p.0).min().unwrap_or(start.0);
        let right = pixels.iter().map(|p| p.0).max().unwrap_or(start.0);
        let top = pixels.iter().map(|p| p.1).min().unwrap_or(start.1);
        let bottom = pixels.iter().map(|p| p.1).max().unwrap_or(start.1);
        let box_w = (right - left + 1) as usize;
        let box_h = (bottom - top + 1) as usize;
        let mut index = vec![NO_PIXEL; box_w * box_h];
        for (i, &(x, y)) in pixels.iter().enumerate() {
            index[(y - top) as usize * box_w + (x - left) as usize] = i as u32;
        }
        Ok(Self { pixels, left, top, box_w, box_h, index })
    }

    fn lookup(&self, x: i64, y: i64) -> Option<usize> {
        let lx = x - i64::from(self.left);
        let ly = y - i64::from(self.top);
        if lx < 0 || ly < 0 || lx >= self.box_w as i64 || ly >= self.box_h as i64 {
            return None;
        }
        let i = self.index[ly as usize * self.box_w + lx as usize];
        (i != NO_PIXEL).then_some(i as usize)
    }

    fn id_of(&self, p: (u32, u32)) -> usize {
        self.lookup(i64::from(p.0), i64::from(p.1)).unwrap_or(0)
    }

    /// Chamfer-distance Dijkstra from `source`, skipping `blocked` pixels; returns (distances, parents).
    fn geodesic(
        &self,
        source: usize,
        blocked: Option<&[bool]>,
        token: Option<&CancelToken>,
    ) -> Result<(Vec<u32>, Vec<u32>)> {
        let n = self.pixels.len();
        let mut dist = vec![u32::MAX; n];
        let mut parent = vec![NO_PIXEL; n];
        let mut heap = BinaryHeap::new();
        dist[source] = 0;
        heap.push(Reverse((0u32, source as u32)));
        let mut pops = 0usize;
        while let Some(Reverse((d, u))) = heap.pop() {
            pops += 1;
            if pops % CANCEL_POLL == 0 {
                poll(token)?;
            }
            let u = u as usize;
            if d > dist[u] {
                continue;
            }
            let (x, y) = self.pixels[u];
            for (dx, dy, cost) in NEIGHBORS {
                let Some(v) = self.lookup(i64::from(x) + dx, i64::from(y) + dy) else { continue };
                if blocked.is_some_and(|b| b[v]) {
                    continue;
                }
                let nd = d + cost;
                if nd < dist[v] {
                    dist[v] = nd;
                    parent[v] = u as u32;
                    heap.push(Reverse((nd, v as u32)));
                }
            }
        }
        Ok((dist, parent))
    }

    /// Farthest pixel by geodesic distance; ties go to the earliest-found pixel.
    fn farthest(dist: &[u32]) -> usize {
        let mut best = 0usize;
        for (i, &d) in dist.iter().enumerate() {
            if d != u32::MAX && d > dist[best] {
                best = i;
            }
        }
        best
    }

    /// Centerline of the region. Open strokes run between their two extremal ends,
    /// starting from the end nearest the seed. Closed loops run once around,
    /// starting and ending at the loop pixel nearest the seed.
    fn centerline(&self, seed: (u32, u32), token: Option<&CancelToken>) -> Result<Centerline> {
        let seed_id = self.id_of(seed);
        let (from_seed, _) = self.geodesic(seed_id, None, token)?;
        let end_a = Self::farthest(&from_seed);
        let (from_a, parent) = self.geodesic(end_a, None, token)?;
        let end_b = Self::farthest(&from_a);

        // b -> a
        let mut path = self.walk(&parent, end_b, end_a);

        if let Some(route) = self.closing_route(&path, from_a[end_b], end_a, end_b, token)? {
            path.extend_from_slice(&route[1..]);
            return Ok(Centerline { pixels: close_at_seed(path, seed), closed: true });
        }

        // orient from the end nearest the seed, then raster order
        let (first, last) = (path[0], path[path.len() - 1]);
        let flip = match dist2(last, seed).partial_cmp(&dist2(first, seed)) {
            Some(std::cmp::Ordering::Less) => true,
            Some(std::cmp::Ordering::Equal) => (last.1, last.0) < (first.1, first.0),
            _ => false,
        };
        if flip {
            path.reverse();
        }
        Ok(Centerline { pixels: path, closed: false })
    }

    /// Pixels from `from` up the parent tree to `to`.
    fn walk(&self, parent: &[u32], from: usize, to: usize) -> Vec<(u32, u32)> {
        let mut path = Vec::new();
        let mut cur = from;
        loop {
            path.push(self.pixels[cur]);
            if cur == to {
                break;
            }
            let p = parent[cur];
            if p == NO_PIXEL {
                break;
            }
            cur = p as usize;
        }
        path
    }

    /// Route from `end_a` back to `end_b` around the far side of a loop, if one exists.
    ///
    /// A disc wider than the stroke is cut out around the middle of `path` (b -> a);
    /// the ends stay connected only when the stroke closes on itself.
    fn closing_route(
        &self,
        path: &[(u32, u32)],
        path_cost: u32,
        end_a: usize,
        end_b: usize,
        token: Option<&CancelToken>,
    ) -> Result<Option<Vec<(u32, u32)>>> {
        let length = f64::from(path_cost) / f64::from(ORTHO_COST);
        // region area over centerline length approximates the stroke width
        let radius = (2.0 * self.pixels.len() as f64 / length.max(1.0)).max(2.0);
        if length < 3.0 * radius {
            return Ok(None);
        }
        let mid = path[path.len() / 2];
        let blocked: Vec<bool> = self.pixels.iter().map(|&p| dist2(p, mid) <= radius * radius).collect();
        let (dist, parent) = self.geodesic(end_b, Some(blocked.as_slice()), token)?;
        if dist[end_a] == u32::MAX {
            return Ok(None);
        }
        tracing::debug!(radius, "closed stroke detected");
        Ok(Some(self.walk(&parent, end_a, end_b)))
    }
}

/// Traced pixel path; closed paths end on their first pixel.
struct Centerline {
    pixels: Vec<(u32, u32)>,
    closed: bool,
}

fn dist2(p: (u32, u32), q: (u32, u32)) -> f64 {
    let dx = f64::from(p.0) - f64::from(q.0);
    let dy = f64::from(p.1) - f64::from(q.1);
    dx * dx + dy * dy
}

/// Rotate a closed path (first pixel == last pixel) to start at the pixel nearest
/// `seed`, heading toward the raster-earlier neighbor.
fn close_at_seed(mut path: Vec<(u32, u32)>, seed: (u32, u32)) -> Vec<(u32, u32)> {
    path.pop();
    let n = path.len();
    let mut start = 0usize;
    for (i, &p) in path.iter().enumerate() {
        if dist2(p, seed) < dist2(path[start], seed) {
            start = i;
        }
    }
    path.rotate_left(start);
    if n > 2 {
        let (next, prev) = (path[1], path[n - 1]);
        if (prev.1, prev.0) < (next.1, next.0) {
            path[1..].reverse();
        }
    }
    if let Some(&first) = path.first() {
        path.push(first);
    }
    path
}

fn poll(token: Option<&CancelToken>) -> Result<()> {
    match token {
        Some(t) => t.check(),
        None => Ok(()),
    }
}

fn to_point(p: (u32, u32)) -> Point2 {
    Point2::new(f64::from(p.0), f64::from(p.1))
}

/// Walk the path by arc length, emitting one point per `point_separation` and,
/// when enabled, one at every corner.
fn emit_points(path: &[(u32, u32)], settings: &SegmentFillSettings) -> Vec<Point2> {
    let Some(&first) = path.first() else { return Vec::new() };
    let corners = if settings.fill_corners { corner_flags(path) } else { vec![false; path.len()] };
    let mut out = vec![to_point(first)];
    let mut acc = 0.0f64;
    let tol = 1e-9 * settings.point_separation;
    for i in 1..path.len() {
        acc += to_point(path[i - 1]).distance(to_point(path[i]));
        if corners[i] || acc + tol >= settings.point_separation {
            out.push(to_point(path[i]));
            acc = 0.0;
        }
    }
    out
}

fn turning_angle(a: Point2, b: Point2, c: Point2) -> f64 {
    let v1 = b.sub(a);
    let v2 = c.sub(b);
    let n = v1.norm() * v2.norm();
    if n <= f64::EPSILON {
        return 0.0;
    }
    (v1.dot(v2) / n).clamp(-1.0, 1.0).acos()
}

/// Local turning-angle maxima above `CORNER_ANGLE`; path ends are never corners.
fn corner_flags(path: &[(u32, u32)]) -> Vec<bool> {
    let n = path.len();
    let mut flags = vec![false; n];
    if n < 2 * CORNER_WINDOW + 1 {
        return flags;
    }
    let angles: Vec<f64> = (0..n)
        .map(|i| {
            if i < CORNER_WINDOW || i + CORNER_WINDOW >= n {
                0.0
            } else {
                turning_angle(
                    to_point(path[i - CORNER_WINDOW]),
                    to_point(path[i]),
                    to_point(path[i + CORNER_WINDOW]),
                )
            }
        })
        .collect();
    for i in CORNER_WINDOW..n - CORNER_WINDOW {
        if angles[i] < CORNER_ANGLE {
            continue;
        }
        let lo = i.saturating_sub(CORNER_WINDOW);
        let hi = (i + CORNER_WINDOW).min(n - 1);
        // first maximum in the window wins
        let is_peak = (lo..=hi).all(|j| angles[j] < angles[i] || (angles[j] == angles[i] && j >= i));
        flags[i] = is_peak;
    }
    flags
}
