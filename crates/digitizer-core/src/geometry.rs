// File: crates/digitizer-core/src/geometry.rs
// Summary: Lightweight geometry helpers for pixel math.

use serde::{Deserialize, Serialize};

/// Screen-space position in pixels (x right, y down).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn sub(self, o: Point2) -> Point2 {
        Point2::new(self.x - o.x, self.y - o.y)
    }

    #[inline]
    pub fn add(self, o: Point2) -> Point2 {
        Point2::new(self.x + o.x, self.y + o.y)
    }

    #[inline]
    pub fn scale(self, k: f64) -> Point2 {
        Point2::new(self.x * k, self.y * k)
    }

    #[inline]
    pub fn dot(self, o: Point2) -> f64 {
        self.x * o.x + self.y * o.y
    }

    #[inline]
    pub fn cross(self, o: Point2) -> f64 {
        self.x * o.y - self.y * o.x
    }

    #[inline]
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[inline]
    pub fn distance(self, o: Point2) -> f64 {
        self.sub(o).norm()
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Projection of a point onto a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentProjection {
    /// Parameter along the segment, clamped to [0, 1].
    pub t: f64,
    /// Distance from the point to the clamped foot.
    pub distance: f64,
    /// True when the unclamped foot lies strictly inside the segment span.
    pub interior: bool,
}

/// Project `p` onto segment `a..b`. Degenerate segments project onto `a`.
pub fn project_onto_segment(p: Point2, a: Point2, b: Point2) -> SegmentProjection {
    let d = b.sub(a);
    let len2 = d.dot(d);
    if len2 <= f64::EPSILON {
        return SegmentProjection { t: 0.0, distance: p.distance(a), interior: false };
    }
    let raw = p.sub(a).dot(d) / len2;
    let t = raw.clamp(0.0, 1.0);
    let foot = a.add(d.scale(t));
    SegmentProjection { t, distance: p.distance(foot), interior: (0.0..=1.0).contains(&raw) }
}

#[inline]
pub fn distance_to_segment(p: Point2, a: Point2, b: Point2) -> f64 {
    project_onto_segment(p, a, b).distance
}

/// Twice the signed area of triangle (a, b, c), normalised by the largest squared edge.
/// Returns 0 when all three points coincide.
pub fn normalized_triangle_area(a: Point2, b: Point2, c: Point2) -> f64 {
    let ab = b.sub(a);
    let ac = c.sub(a);
    let bc = c.sub(b);
    let span = ab.dot(ab).max(ac.dot(ac)).max(bc.dot(bc));
    if span <= f64::EPSILON {
        return 0.0;
    }
    ab.cross(ac).abs() / span
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectI32 {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl RectI32 {
    pub const fn from_ltwh(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self { left, top, right: left + width, bottom: top + height }
    }
    /// Rectangle covering a single pixel.
    pub const fn from_pixel(x: i32, y: i32) -> Self {
        Self { left: x, top: y, right: x + 1, bottom: y + 1 }
    }
    pub const fn width(&self) -> i32 { self.right - self.left }
    pub const fn height(&self) -> i32 { self.bottom - self.top }

    /// Grow to include pixel (x, y).
    pub fn include(&mut self, x: i32, y: i32) {
        self.left = self.left.min(x);
        self.top = self.top.min(y);
        self.right = self.right.max(x + 1);
        self.bottom = self.bottom.max(y + 1);
    }

    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// Clip the infinite line through `a` and `b` to the rectangle [0, w] x [0, h].
/// Returns `None` when the line misses the rectangle or `a == b`.
pub fn clip_line_to_rect(a: Point2, b: Point2, w: f64, h: f64) -> Option<(Point2, Point2)> {
    let d = b.sub(a);
    if d.dot(d) <= f64::EPSILON {
        return None;
    }
    // Liang-Barsky over an unbounded parameter range.
    let mut t0 = f64::NEG_INFINITY;
    let mut t1 = f64::INFINITY;
    let checks = [(-d.x, a.x), (d.x, w - a.x), (-d.y, a.y), (d.y, h - a.y)];
    for (p, q) in checks {
        if p.abs() <= f64::EPSILON {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
    }
    if t0 > t1 || !t0.is_finite() || !t1.is_finite() {
        return None;
    }
    Some((a.add(d.scale(t0)), a.add(d.scale(t1))))
}

/// Clip the ray starting at `origin` through `through` to [0, w] x [0, h].
pub fn clip_ray_to_rect(origin: Point2, through: Point2, w: f64, h: f64) -> Option<(Point2, Point2)> {
    let (p, q) = clip_line_to_rect(origin, through, w, h)?;
    let d = through.sub(origin);
    let tp = p.sub(origin).dot(d);
    let tq = q.sub(origin).dot(d);
    if tq < 0.0 {
        return None;
    }
    let start = if tp < 0.0 { origin } else { p };
    Some((start, q))
}
