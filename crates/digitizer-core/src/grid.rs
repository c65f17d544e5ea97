// File: crates/digitizer-core/src/grid.rs
// Summary: Grid-line value computation and projection of grid lines into screen space.

use serde::{Deserialize, Serialize};

use crate::axis::{AxisMode, CoordModel, GraphPoint};
use crate::error::{AxisId, DigitizeError, Result};
use crate::geometry::{clip_line_to_rect, clip_ray_to_rect, Point2};
use crate::scale::AxisScale;
use crate::transform::CoordinateTransform;
use crate::types::DEFAULT_MAX_GRID_LINES;

/// Which of the four grid parameters is derived from the other three.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridDisable {
    #[default]
    Count,
    Start,
    Step,
    Stop,
}

/// Grid parameters for one axis. For log axes `step` is a multiplicative factor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridAxisSettings {
    pub disable: GridDisable,
    pub count: u32,
    pub start: f64,
    pub step: f64,
    pub stop: f64,
}

impl Default for GridAxisSettings {
    fn default() -> Self {
        Self { disable: GridDisable::Count, count: 11, start: 0.0, step: 1.0, stop: 10.0 }
    }
}

/// Values produced for one axis.
#[derive(Clone, Debug, PartialEq)]
pub struct GridValues {
    pub values: Vec<f64>,
    /// Set when the implied count exceeded the configured maximum.
    pub truncated: bool,
}

const GRID_EPS: f64 = 1e-9;

impl GridAxisSettings {
    pub const fn new(disable: GridDisable, count: u32, start: f64, step: f64, stop: f64) -> Self {
        Self { disable, count, start, step, stop }
    }

    /// Recompute the disabled parameter from the other three, then validate.
    pub fn normalized(&self, scale: AxisScale) -> Result<Self> {
        let mut s = *self;
        s.check_inputs(scale)?;
        match (s.disable, scale) {
            (GridDisable::Count, AxisScale::Linear) => {
                s.count = count_from_ratio((s.stop - s.start) / s.step);
            }
            (GridDisable::Count, AxisScale::Log) => {
                s.count = count_from_ratio((s.stop / s.start).ln() / s.step.ln());
            }
            (GridDisable::Stop, AxisScale::Linear) => {
                s.stop = s.start + f64::from(s.count - 1) * s.step;
            }
            (GridDisable::Stop, AxisScale::Log) => {
                s.stop = s.start * s.step.powi(s.count as i32 - 1);
            }
            (GridDisable::Start, AxisScale::Linear) => {
                s.start = s.stop - f64::from(s.count - 1) * s.step;
            }
            (GridDisable::Start, AxisScale::Log) => {
                s.start = s.stop / s.step.powi(s.count as i32 - 1);
            }
            (GridDisable::Step, AxisScale::Linear) => {
                if s.count > 1 {
                    s.step = (s.stop - s.start) / f64::from(s.count - 1);
                }
            }
            (GridDisable::Step, AxisScale::Log) => {
                if s.count > 1 {
                    s.step = (s.stop / s.start).powf(1.0 / f64::from(s.count - 1));
                }
            }
        }
        s.check_invariants(scale)?;
        Ok(s)
    }

    /// Checks on the parameters the user actually supplied.
    fn check_inputs(&self, scale: AxisScale) -> Result<()> {
        if self.disable != GridDisable::Count && self.count == 0 {
            return Err(DigitizeError::InvalidGridSettings("count must be at least 1".into()));
        }
        if self.disable != GridDisable::Step {
            check_step(self.step, scale)?;
        }
        if matches!(self.disable, GridDisable::Count | GridDisable::Step) && self.start > self.stop {
            return Err(DigitizeError::InvalidGridSettings(format!(
                "start {} must not exceed stop {}",
                self.start, self.stop
            )));
        }
        if scale.is_log() {
            let start_bad = self.disable != GridDisable::Start && self.start <= 0.0;
            let stop_bad = self.disable != GridDisable::Stop && self.stop <= 0.0;
            if start_bad || stop_bad {
                return Err(DigitizeError::InvalidGridSettings(
                    "log grid start and stop must be positive".into(),
                ));
            }
        }
        for v in [self.start, self.step, self.stop] {
            if !v.is_finite() {
                return Err(DigitizeError::InvalidGridSettings("values must be finite".into()));
            }
        }
        Ok(())
    }

    fn check_invariants(&self, scale: AxisScale) -> Result<()> {
        if self.count == 0 {
            return Err(DigitizeError::InvalidGridSettings("count must be at least 1".into()));
        }
        if self.count > 1 {
            check_step(self.step, scale)?;
        }
        if self.start > self.stop {
            return Err(DigitizeError::InvalidGridSettings(format!(
                "start {} must not exceed stop {}",
                self.start, self.stop
            )));
        }
        Ok(())
    }

    /// `start, start+step, ... <= stop` (linear) or `start, start*step, ...` (log),
    /// clamped to `max_lines`.
    pub fn values(&self, scale: AxisScale, max_lines: usize) -> Result<GridValues> {
        let s = self.normalized(scale)?;
        let tol = GRID_EPS * s.stop.abs().max(s.step.abs()).max(1.0);
        let mut values = Vec::new();
        let mut truncated = false;
        for i in 0..s.count {
            let v = match scale {
                AxisScale::Linear => s.start + f64::from(i) * s.step,
                AxisScale::Log => s.start * s.step.powi(i as i32),
            };
            if v > s.stop + tol {
                break;
            }
            if values.len() == max_lines {
                truncated = true;
                break;
            }
            values.push(v);
        }
        if truncated {
            tracing::warn!(
                requested = s.count,
                max_lines,
                "grid line count exceeds maximum; line set truncated"
            );
        }
        Ok(GridValues { values, truncated })
    }
}

fn check_step(step: f64, scale: AxisScale) -> Result<()> {
    match scale {
        AxisScale::Linear if step <= 0.0 => {
            Err(DigitizeError::InvalidGridSettings(format!("step {step} must be positive")))
        }
        AxisScale::Log if step <= 1.0 => Err(DigitizeError::InvalidGridSettings(format!(
            "log step factor {step} must be greater than 1"
        ))),
        _ => Ok(()),
    }
}

fn count_from_ratio(ratio: f64) -> u32 {
    let n = (ratio + GRID_EPS).floor() + 1.0;
    if n >= u32::MAX as f64 { u32::MAX } else { n.max(1.0) as u32 }
}

/// Grid configuration for both axes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridLineSettings {
    /// X lines, or theta spokes in polar mode.
    pub x: GridAxisSettings,
    /// Y lines, or radius circles in polar mode.
    pub y: GridAxisSettings,
    /// Maximum lines per axis.
    pub max_lines: usize,
}

impl Default for GridLineSettings {
    fn default() -> Self {
        Self { x: GridAxisSettings::default(), y: GridAxisSettings::default(), max_lines: DEFAULT_MAX_GRID_LINES }
    }
}

/// One projected grid line. Cartesian lines and polar spokes are 2-point
/// segments clipped to the image; polar circles are sampled polylines.
#[derive(Clone, Debug, PartialEq)]
pub struct GridLine {
    pub axis: AxisId,
    pub value: f64,
    pub path: Vec<Point2>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GridLineSet {
    pub lines: Vec<GridLine>,
    pub truncated: bool,
}

impl GridLineSet {
    pub fn axis_lines(&self, axis: AxisId) -> impl Iterator<Item = &GridLine> {
        self.lines.iter().filter(move |l| l.axis == axis)
    }
}

const CIRCLE_SEGMENTS: usize = 90;

/// Compute grid values for both axes and project them onto a `width x height` image.
pub fn compute_grid_lines(
    transform: &CoordinateTransform,
    settings: &GridLineSettings,
    width: u32,
    height: u32,
) -> Result<GridLineSet> {
    let cs = transform.settings();
    let xs = settings.x.values(cs.x_scale, settings.max_lines)?;
    let ys = settings.y.values(cs.y_scale, settings.max_lines)?;
    let (w, h) = (f64::from(width), f64::from(height));
    let mut lines = Vec::with_capacity(xs.values.len() + ys.values.len());

    let shared_polar = cs.model == CoordModel::Polar && cs.axis_mode == AxisMode::Shared;
    for &v in &xs.values {
        let segment = if shared_polar {
            let a = cs.theta_units.to_radians(v);
            let origin = transform.fit_to_screen(Point2::new(0.0, 0.0));
            let through = transform.fit_to_screen(Point2::new(a.cos(), a.sin()));
            clip_ray_to_rect(origin, through, w, h)
        } else {
            let fx = cs.x_scale.to_fit(AxisId::X, v)?;
            let a = transform.fit_to_screen(Point2::new(fx, 0.0));
            let b = transform.fit_to_screen(Point2::new(fx, 1.0));
            clip_line_to_rect(a, b, w, h)
        };
        if let Some((p, q)) = segment {
            lines.push(GridLine { axis: AxisId::X, value: v, path: vec![p, q] });
        }
    }

    for &v in &ys.values {
        if shared_polar {
            let d = cs.y_scale.radius_to_fit(v, cs.origin_radius)?;
            if d <= 0.0 {
                continue;
            }
            let path: Vec<Point2> = (0..=CIRCLE_SEGMENTS)
                .map(|i| {
                    let phi = i as f64 / CIRCLE_SEGMENTS as f64 * std::f64::consts::TAU;
                    transform.fit_to_screen(Point2::new(d * phi.cos(), d * phi.sin()))
                })
                .collect();
            if path.iter().any(|p| p.x >= 0.0 && p.x <= w && p.y >= 0.0 && p.y <= h) {
                lines.push(GridLine { axis: AxisId::Y, value: v, path });
            }
        } else {
            let fy = match cs.model {
                CoordModel::Polar => cs.y_scale.radius_to_fit(v, cs.origin_radius)?,
                CoordModel::Cartesian => cs.y_scale.to_fit(AxisId::Y, v)?,
            };
            let a = transform.fit_to_screen(Point2::new(0.0, fy));
            let b = transform.fit_to_screen(Point2::new(1.0, fy));
            if let Some((p, q)) = clip_line_to_rect(a, b, w, h) {
                lines.push(GridLine { axis: AxisId::Y, value: v, path: vec![p, q] });
            }
        }
    }

    tracing::debug!(lines = lines.len(), "grid lines projected");
    Ok(GridLineSet { lines, truncated: xs.truncated || ys.truncated })
}

/// Round step (1, 2 or 5 times a power of ten) at least as large as `raw`.
fn nice_step(raw: f64) -> f64 {
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let exp = raw.log10().floor();
    let base = 10f64.powf(exp);
    let f = raw / base;
    let nice = if f <= 1.0 { 1.0 } else if f <= 2.0 { 2.0 } else if f <= 5.0 { 5.0 } else { 10.0 };
    nice * base
}

const INITIAL_INTERVALS: f64 = 10.0;

fn initial_axis(scale: AxisScale, min: f64, max: f64) -> GridAxisSettings {
    match scale {
        AxisScale::Linear => {
            let step = nice_step((max - min) / INITIAL_INTERVALS);
            let start = (min / step).ceil() * step;
            let stop = (max / step).floor() * step;
            if start > stop {
                return GridAxisSettings::new(GridDisable::Count, 1, min, step, min);
            }
            let count = ((stop - start) / step).round() as u32 + 1;
            GridAxisSettings::new(GridDisable::Count, count, start, step, stop)
        }
        AxisScale::Log => {
            let min = min.max(f64::MIN_POSITIVE);
            let start = 10f64.powf(min.log10().ceil());
            let stop = 10f64.powf(max.max(min).log10().floor());
            if start > stop {
                return GridAxisSettings::new(GridDisable::Count, 1, min, 10.0, min);
            }
            let count = (stop / start).log10().round() as u32 + 1;
            GridAxisSettings::new(GridDisable::Count, count, start, 10.0, stop)
        }
    }
}

impl GridLineSettings {
    /// Settings covering the visible image with round values.
    pub fn initial(transform: &CoordinateTransform, width: u32, height: u32) -> Self {
        let cs = transform.settings();
        let (w, h) = (f64::from(width), f64::from(height));
        let samples: Vec<_> = [0.0, 0.5, 1.0]
            .iter()
            .flat_map(|&fx| [0.0, 0.5, 1.0].map(|fy| transform.to_graph(Point2::new(fx * w, fy * h))))
            .collect();
        let range = |f: fn(&GraphPoint) -> f64| {
            samples.iter().map(f).fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
        };
        let (y_min, y_max) = range(|g: &GraphPoint| g.y);

        let x = if cs.model == CoordModel::Polar && cs.axis_mode == AxisMode::Shared {
            let period = cs.theta_units.period();
            let step = period / 12.0;
            GridAxisSettings::new(GridDisable::Count, 12, 0.0, step, period - step)
        } else {
            let (x_min, x_max) = range(|g: &GraphPoint| g.x);
            initial_axis(cs.x_scale, x_min, x_max)
        };
        let y = if cs.model == CoordModel::Polar && cs.axis_mode == AxisMode::Shared {
            initial_axis(cs.y_scale, cs.origin_radius, y_max)
        } else {
            initial_axis(cs.y_scale, y_min, y_max)
        };
        Self { x, y, max_lines: DEFAULT_MAX_GRID_LINES }
    }
}
