// File: crates/digitizer-core/src/axis.rs
// Summary: Calibration model: axis points, coordinate settings and the owning CoordSystem.

use serde::{Deserialize, Serialize};

use crate::datetime::AxisUnits;
use crate::error::{AxisId, DigitizeError, Result};
use crate::geometry::Point2;
use crate::scale::{AxisScale, ThetaUnits};
use crate::transform::CoordinateTransform;
use crate::types::{SHARED_AXIS_POINTS, SPLIT_AXIS_POINTS};

/// Graph-space position. In polar mode `x` is theta and `y` is radius.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphPoint {
    pub x: f64,
    pub y: f64,
}

impl GraphPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordModel {
    #[default]
    Cartesian,
    Polar,
}

/// How many coordinates each axis point carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisMode {
    /// Three points, each with both graph coordinates.
    #[default]
    Shared,
    /// Four points: two define the x/theta axis, two the y/radius axis.
    Split,
}

impl AxisMode {
    pub const fn required_points(self) -> usize {
        match self {
            AxisMode::Shared => SHARED_AXIS_POINTS,
            AxisMode::Split => SPLIT_AXIS_POINTS,
        }
    }
}

/// Which graph coordinates an axis point defines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisPointKind {
    #[default]
    Both,
    /// Split mode: only `graph.x` is meaningful.
    X,
    /// Split mode: only `graph.y` is meaningful.
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisPoint {
    pub screen: Point2,
    pub graph: GraphPoint,
    #[serde(default)]
    pub kind: AxisPointKind,
}

impl AxisPoint {
    pub const fn new(screen: Point2, graph: GraphPoint) -> Self {
        Self { screen, graph, kind: AxisPointKind::Both }
    }

    pub const fn x_only(screen: Point2, x: f64) -> Self {
        Self { screen, graph: GraphPoint::new(x, 0.0), kind: AxisPointKind::X }
    }

    pub const fn y_only(screen: Point2, y: f64) -> Self {
        Self { screen, graph: GraphPoint::new(0.0, y), kind: AxisPointKind::Y }
    }

    /// Build from user text, parsing each coordinate under the configured units.
    pub fn from_text(
        settings: &CoordSettings,
        screen: Point2,
        x_text: &str,
        y_text: &str,
    ) -> Result<Self> {
        let x = settings.x_units.parse(x_text)?;
        let y = settings.y_units.parse(y_text)?;
        Ok(Self::new(screen, GraphPoint::new(x, y)))
    }

    fn defines_x(&self) -> bool {
        matches!(self.kind, AxisPointKind::Both | AxisPointKind::X)
    }

    fn defines_y(&self) -> bool {
        matches!(self.kind, AxisPointKind::Both | AxisPointKind::Y)
    }
}

/// Scale and unit configuration of a coordinate system.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordSettings {
    pub model: CoordModel,
    pub axis_mode: AxisMode,
    /// X scale, or theta scale in polar mode (must stay linear).
    pub x_scale: AxisScale,
    /// Y scale, or radius scale in polar mode.
    pub y_scale: AxisScale,
    pub x_units: AxisUnits,
    pub y_units: AxisUnits,
    pub theta_units: ThetaUnits,
    /// Radius value at the polar origin.
    pub origin_radius: f64,
}

impl Default for CoordSettings {
    fn default() -> Self {
        Self {
            model: CoordModel::Cartesian,
            axis_mode: AxisMode::Shared,
            x_scale: AxisScale::Linear,
            y_scale: AxisScale::Linear,
            x_units: AxisUnits::Number,
            y_units: AxisUnits::Number,
            theta_units: ThetaUnits::Degrees,
            origin_radius: 0.0,
        }
    }
}

impl CoordSettings {
    pub fn is_polar(&self) -> bool {
        self.model == CoordModel::Polar
    }

    pub fn scale(&self, axis: AxisId) -> AxisScale {
        match axis {
            AxisId::X => self.x_scale,
            AxisId::Y => self.y_scale,
        }
    }

    pub fn units(&self, axis: AxisId) -> AxisUnits {
        match axis {
            AxisId::X => self.x_units,
            AxisId::Y => self.y_units,
        }
    }

    /// Config-time checks that do not need axis points.
    pub fn validate(&self) -> Result<()> {
        self.x_units.validate()?;
        self.y_units.validate()?;
        if self.is_polar() {
            if self.x_scale.is_log() {
                return Err(DigitizeError::ThetaLogScale);
            }
            if self.x_units.is_date_time() || self.y_units.is_date_time() {
                return Err(DigitizeError::InvalidSettings(
                    "date/time units are only available on Cartesian axes".into(),
                ));
            }
            if self.y_scale.is_log() && self.origin_radius <= 0.0 {
                return Err(DigitizeError::LogDomain { axis: AxisId::Y, value: self.origin_radius });
            }
        }
        for axis in [AxisId::X, AxisId::Y] {
            if self.scale(axis).is_log() && self.units(axis).is_date_time() {
                return Err(DigitizeError::InvalidSettings(format!(
                    "log scale is not available on date/time {axis} axis"
                )));
            }
        }
        Ok(())
    }

    /// Format a graph point for display/export, honouring per-axis units.
    pub fn format(&self, g: GraphPoint) -> (String, String) {
        (self.x_units.format(g.x), self.y_units.format(g.y))
    }
}

/// Serializable calibration document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub settings: CoordSettings,
    pub axis_points: Vec<AxisPoint>,
}

/// Axis points, settings and the transform derived from them.
///
/// The transform is rebuilt on every mutation. A mutation that would leave a
/// complete but degenerate calibration is rejected and prior state is kept.
#[derive(Clone, Debug)]
pub struct CoordSystem {
    settings: CoordSettings,
    axis_points: Vec<AxisPoint>,
    transform: Option<CoordinateTransform>,
}

impl CoordSystem {
    pub fn new(settings: CoordSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings, axis_points: Vec::new(), transform: None })
    }

    pub fn from_calibration(cal: &Calibration) -> Result<Self> {
        let mut cs = Self::new(cal.settings)?;
        cs.commit(cal.settings, cal.axis_points.clone())?;
        Ok(cs)
    }

    pub fn calibration(&self) -> Calibration {
        Calibration { settings: self.settings, axis_points: self.axis_points.clone() }
    }

    pub fn settings(&self) -> &CoordSettings {
        &self.settings
    }

    pub fn axis_points(&self) -> &[AxisPoint] {
        &self.axis_points
    }

    pub fn is_calibrated(&self) -> bool {
        self.transform.is_some()
    }

    /// Current transform; unavailable until the calibration is complete.
    pub fn transform(&self) -> Result<&CoordinateTransform> {
        self.transform.as_ref().ok_or(DigitizeError::NeedMoreAxisPoints {
            have: self.axis_points.len(),
            need: self.settings.axis_mode.required_points(),
        })
    }

    /// Append an axis point; returns its index.
    pub fn add_axis_point(&mut self, point: AxisPoint) -> Result<usize> {
        let mut points = self.axis_points.clone();
        points.push(point);
        self.commit(self.settings, points)?;
        Ok(self.axis_points.len() - 1)
    }

    /// Replace the axis point at `index`.
    pub fn edit_axis_point(&mut self, index: usize, point: AxisPoint) -> Result<()> {
        let mut points = self.axis_points.clone();
        let slot = points
            .get_mut(index)
            .ok_or_else(|| DigitizeError::InvalidSettings(format!("no axis point {index}")))?;
        *slot = point;
        self.commit(self.settings, points)
    }

    /// Move the axis point at `index` to a new screen position.
    pub fn move_axis_point(&mut self, index: usize, screen: Point2) -> Result<()> {
        let mut point = *self
            .axis_points
            .get(index)
            .ok_or_else(|| DigitizeError::InvalidSettings(format!("no axis point {index}")))?;
        point.screen = screen;
        self.edit_axis_point(index, point)
    }

    pub fn remove_axis_point(&mut self, index: usize) -> Result<AxisPoint> {
        if index >= self.axis_points.len() {
            return Err(DigitizeError::InvalidSettings(format!("no axis point {index}")));
        }
        let mut points = self.axis_points.clone();
        let removed = points.remove(index);
        self.commit(self.settings, points)?;
        Ok(removed)
    }

    pub fn set_settings(&mut self, settings: CoordSettings) -> Result<()> {
        settings.validate()?;
        self.commit(settings, self.axis_points.clone())
    }

    /// Validate the candidate state and swap it in only when everything succeeds.
    fn commit(&mut self, settings: CoordSettings, points: Vec<AxisPoint>) -> Result<()> {
        validate_points(&settings, &points)?;
        let transform = if points.len() == settings.axis_mode.required_points() {
            Some(CoordinateTransform::new(&settings, &points)?)
        } else {
            None
        };
        self.settings = settings;
        self.axis_points = points;
        self.transform = transform;
        Ok(())
    }
}

const SAME_POSITION_EPS: f64 = 1e-9;

/// Checks that apply to partial calibrations too.
pub(crate) fn validate_points(settings: &CoordSettings, points: &[AxisPoint]) -> Result<()> {
    match settings.axis_mode {
        AxisMode::Shared => {
            if points.iter().any(|p| p.kind != AxisPointKind::Both) {
                return Err(DigitizeError::InvalidSettings(
                    "shared-axis calibration points must define both coordinates".into(),
                ));
            }
            if points.len() > SHARED_AXIS_POINTS {
                return Err(DigitizeError::InvalidSettings(format!(
                    "shared-axis calibration takes exactly {SHARED_AXIS_POINTS} points"
                )));
            }
        }
        AxisMode::Split => {
            if points.iter().any(|p| p.kind == AxisPointKind::Both) {
                return Err(DigitizeError::InvalidSettings(
                    "split-axis calibration points must define exactly one coordinate".into(),
                ));
            }
            if points.iter().filter(|p| p.kind == AxisPointKind::X).count() > 2 {
                return Err(DigitizeError::TooManyAxisPoints { axis: AxisId::X });
            }
            if points.iter().filter(|p| p.kind == AxisPointKind::Y).count() > 2 {
                return Err(DigitizeError::TooManyAxisPoints { axis: AxisId::Y });
            }
        }
    }

    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            if a.screen.distance(b.screen) <= SAME_POSITION_EPS {
                return Err(DigitizeError::AxisDegenerate(format!(
                    "two axis points share screen position ({}, {})",
                    a.screen.x, a.screen.y
                )));
            }
            if settings.axis_mode == AxisMode::Shared
                && (a.graph.x - b.graph.x).abs() <= SAME_POSITION_EPS
                && (a.graph.y - b.graph.y).abs() <= SAME_POSITION_EPS
            {
                return Err(DigitizeError::AxisDegenerate(format!(
                    "two axis points share graph position ({}, {})",
                    a.graph.x, a.graph.y
                )));
            }
        }
    }

    let shared_polar = settings.model == CoordModel::Polar && settings.axis_mode == AxisMode::Shared;
    for p in points {
        if p.defines_x() {
            settings.x_scale.to_fit(AxisId::X, p.graph.x)?;
        }
        if p.defines_y() {
            settings.y_scale.to_fit(AxisId::Y, p.graph.y)?;
            if shared_polar {
                crate::transform::polar_distance(settings, p.graph.y)?;
            }
        }
    }
    Ok(())
}

pub(crate) fn points_of_kind(points: &[AxisPoint], kind: AxisPointKind) -> Vec<AxisPoint> {
    points.iter().copied().filter(|p| p.kind == kind).collect()
}
