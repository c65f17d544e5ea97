// File: crates/digitizer-core/src/transform.rs
// Summary: Pixel <-> graph coordinate transform built from calibration axis points.
// Notes:
// - Screen coordinates are first mapped by an affine matrix into "fit space":
//   per-axis log10 for log axes, and for shared-axis polar a Cartesian plane
//   whose origin is the polar origin. Per-axis scales and units are applied
//   after the affine step.

use nalgebra::{Matrix3, Vector3};

use crate::axis::{points_of_kind, AxisMode, AxisPoint, AxisPointKind, CoordModel, CoordSettings, GraphPoint};
use crate::error::{AxisId, DigitizeError, Result};
use crate::geometry::{normalized_triangle_area, Point2};
use crate::scale::AxisScale;
use crate::types::DEGENERATE_TOLERANCE;

/// Mutual (approximate) inverse maps between screen and graph space.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateTransform {
    settings: CoordSettings,
    /// screen -> fit space
    forward: Matrix3<f64>,
    /// fit space -> screen
    inverse: Matrix3<f64>,
}

impl CoordinateTransform {
    /// Build from a complete set of axis points.
    pub fn new(settings: &CoordSettings, points: &[AxisPoint]) -> Result<Self> {
        settings.validate()?;
        let need = settings.axis_mode.required_points();
        if points.len() < need {
            return Err(DigitizeError::NeedMoreAxisPoints { have: points.len(), need });
        }
        crate::axis::validate_points(settings, points)?;

        let forward = match settings.axis_mode {
            AxisMode::Shared => fit_shared(settings, points)?,
            AxisMode::Split => fit_split(settings, points)?,
        };
        let inverse = forward
            .try_inverse()
            .ok_or_else(|| DigitizeError::AxisDegenerate("calibration matrix is singular".into()))?;

        tracing::info!(
            model = ?settings.model,
            mode = ?settings.axis_mode,
            "coordinate transform built"
        );
        Ok(Self { settings: *settings, forward, inverse })
    }

    pub fn settings(&self) -> &CoordSettings {
        &self.settings
    }

    pub fn is_polar(&self) -> bool {
        self.settings.is_polar()
    }

    pub fn to_graph(&self, screen: Point2) -> GraphPoint {
        let fit = apply(&self.forward, screen);
        self.fit_to_graph(fit)
    }

    pub fn to_screen(&self, graph: GraphPoint) -> Result<Point2> {
        let fit = graph_to_fit(&self.settings, graph)?;
        Ok(apply(&self.inverse, fit))
    }

    /// Independent variable used for function-curve ordering (x, or theta in polar).
    pub fn independent_value(&self, screen: Point2) -> f64 {
        self.to_graph(screen).x
    }

    /// Screen position of the polar origin. Only defined for shared-axis polar.
    pub fn polar_origin(&self) -> Option<Point2> {
        if self.settings.model == CoordModel::Polar && self.settings.axis_mode == AxisMode::Shared {
            Some(apply(&self.inverse, Point2::new(0.0, 0.0)))
        } else {
            None
        }
    }

    /// Screen position of a fit-space point.
    pub(crate) fn fit_to_screen(&self, fit: Point2) -> Point2 {
        apply(&self.inverse, fit)
    }

    fn fit_to_graph(&self, fit: Point2) -> GraphPoint {
        let s = &self.settings;
        match (s.model, s.axis_mode) {
            (CoordModel::Cartesian, _) => {
                GraphPoint::new(s.x_scale.from_fit(fit.x), s.y_scale.from_fit(fit.y))
            }
            (CoordModel::Polar, AxisMode::Shared) => {
                let theta = s.theta_units.from_radians(fit.y.atan2(fit.x));
                let radius = s.y_scale.radius_from_fit(fit.x.hypot(fit.y), s.origin_radius);
                GraphPoint::new(theta, radius)
            }
            (CoordModel::Polar, AxisMode::Split) => {
                GraphPoint::new(fit.x, s.y_scale.radius_from_fit(fit.y, s.origin_radius))
            }
        }
    }
}

#[inline]
fn apply(m: &Matrix3<f64>, p: Point2) -> Point2 {
    let v = m * Vector3::new(p.x, p.y, 1.0);
    Point2::new(v.x, v.y)
}

/// Map a graph point into fit space; fails for non-positive values on log axes.
fn graph_to_fit(s: &CoordSettings, g: GraphPoint) -> Result<Point2> {
    match (s.model, s.axis_mode) {
        (CoordModel::Cartesian, _) => Ok(Point2::new(
            s.x_scale.to_fit(AxisId::X, g.x)?,
            s.y_scale.to_fit(AxisId::Y, g.y)?,
        )),
        (CoordModel::Polar, AxisMode::Shared) => {
            let d = polar_distance(s, g.y)?;
            let a = s.theta_units.to_radians(g.x);
            Ok(Point2::new(d * a.cos(), d * a.sin()))
        }
        (CoordModel::Polar, AxisMode::Split) => {
            Ok(Point2::new(g.x, s.y_scale.radius_to_fit(g.y, s.origin_radius)?))
        }
    }
}

/// Fit-space distance of a radius from the shared polar origin. Radii inside
/// `origin_radius` would land on the opposite side of the origin and are rejected.
pub(crate) fn polar_distance(s: &CoordSettings, radius: f64) -> Result<f64> {
    let d = s.y_scale.radius_to_fit(radius, s.origin_radius)?;
    if d < 0.0 {
        return Err(match s.y_scale {
            AxisScale::Log => DigitizeError::LogDomain { axis: AxisId::Y, value: radius },
            AxisScale::Linear => DigitizeError::InvalidSettings(format!(
                "radius {radius} is below the origin radius {}",
                s.origin_radius
            )),
        });
    }
    Ok(d)
}

fn fit_shared(settings: &CoordSettings, points: &[AxisPoint]) -> Result<Matrix3<f64>> {
    let (a, b, c) = (points[0], points[1], points[2]);
    if normalized_triangle_area(a.screen, b.screen, c.screen) <= DEGENERATE_TOLERANCE {
        return Err(DigitizeError::AxisDegenerate("screen points are collinear".into()));
    }
    let fa = graph_to_fit(settings, a.graph)?;
    let fb = graph_to_fit(settings, b.graph)?;
    let fc = graph_to_fit(settings, c.graph)?;
    if normalized_triangle_area(fa, fb, fc) <= DEGENERATE_TOLERANCE {
        return Err(DigitizeError::AxisDegenerate("graph points are collinear".into()));
    }

    #[rustfmt::skip]
    let screen = Matrix3::new(
        a.screen.x, b.screen.x, c.screen.x,
        a.screen.y, b.screen.y, c.screen.y,
        1.0, 1.0, 1.0,
    );
    #[rustfmt::skip]
    let fit = Matrix3::new(
        fa.x, fb.x, fc.x,
        fa.y, fb.y, fc.y,
        1.0, 1.0, 1.0,
    );
    let screen_inv = screen
        .try_inverse()
        .ok_or_else(|| DigitizeError::AxisDegenerate("screen points are collinear".into()))?;
    Ok(fit * screen_inv)
}

/// Two independent 1-D fits: screen x -> x/theta, screen y -> y/radius.
fn fit_split(settings: &CoordSettings, points: &[AxisPoint]) -> Result<Matrix3<f64>> {
    let xs = points_of_kind(points, AxisPointKind::X);
    let ys = points_of_kind(points, AxisPointKind::Y);
    if xs.len() != 2 || ys.len() != 2 {
        return Err(DigitizeError::NeedMoreAxisPoints {
            have: xs.len().min(2) + ys.len().min(2),
            need: settings.axis_mode.required_points(),
        });
    }

    let fx = |p: &AxisPoint| graph_to_fit(settings, GraphPoint::new(p.graph.x, split_y_placeholder(settings)));
    let fy = |p: &AxisPoint| graph_to_fit(settings, GraphPoint::new(split_x_placeholder(settings), p.graph.y));

    let (ax, bx) = linear_fit_1d(
        (xs[0].screen.x, fx(&xs[0])?.x),
        (xs[1].screen.x, fx(&xs[1])?.x),
        AxisId::X,
    )?;
    let (ay, by) = linear_fit_1d(
        (ys[0].screen.y, fy(&ys[0])?.y),
        (ys[1].screen.y, fy(&ys[1])?.y),
        AxisId::Y,
    )?;

    #[rustfmt::skip]
    let m = Matrix3::new(
        ax, 0.0, bx,
        0.0, ay, by,
        0.0, 0.0, 1.0,
    );
    Ok(m)
}

// Split-mode points leave one coordinate undefined; substitute a value that is
// valid under the other axis' scale so only the defined coordinate is fitted.
fn split_x_placeholder(s: &CoordSettings) -> f64 {
    if s.x_scale.is_log() { 1.0 } else { 0.0 }
}

fn split_y_placeholder(s: &CoordSettings) -> f64 {
    match (s.model, s.y_scale.is_log()) {
        (CoordModel::Polar, true) => s.origin_radius.max(f64::MIN_POSITIVE),
        (_, true) => 1.0,
        _ => 0.0,
    }
}

/// Solve `fit = a * screen + b` through two samples.
fn linear_fit_1d(p: (f64, f64), q: (f64, f64), axis: AxisId) -> Result<(f64, f64)> {
    let ds = q.0 - p.0;
    let df = q.1 - p.1;
    let span = p.0.abs().max(q.0.abs()).max(1.0);
    if ds.abs() <= DEGENERATE_TOLERANCE * span {
        return Err(DigitizeError::AxisDegenerate(format!(
            "both {axis} axis points share the same screen coordinate"
        )));
    }
    if df.abs() <= DEGENERATE_TOLERANCE * p.1.abs().max(q.1.abs()).max(1.0) {
        return Err(DigitizeError::AxisDegenerate(format!(
            "both {axis} axis points share the same graph value"
        )));
    }
    let a = df / ds;
    Ok((a, p.1 - a * p.0))
}
