// File: crates/digitizer-core/src/scale.rs
// Summary: Per-axis scale transforms (linear/log) and polar angle units.

use serde::{Deserialize, Serialize};

use crate::error::{AxisId, DigitizeError, Result};

/// Axis scale. Log axes are fitted in log10 space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

impl AxisScale {
    /// Map a graph value into the space where the affine fit happens.
    #[inline]
    pub fn to_fit(self, axis: AxisId, value: f64) -> Result<f64> {
        match self {
            AxisScale::Linear => Ok(value),
            AxisScale::Log => {
                if value <= 0.0 || !value.is_finite() {
                    return Err(DigitizeError::LogDomain { axis, value });
                }
                Ok(value.log10())
            }
        }
    }

    /// Inverse of [`AxisScale::to_fit`]. Always defined.
    #[inline]
    pub fn from_fit(self, fitted: f64) -> f64 {
        match self {
            AxisScale::Linear => fitted,
            AxisScale::Log => 10f64.powf(fitted),
        }
    }

    /// Distance from the polar origin in fit space for a radius value.
    ///
    /// Linear radii are offset by `origin_radius`; log radii are taken relative
    /// to it, so `origin_radius` must itself be positive.
    pub fn radius_to_fit(self, radius: f64, origin_radius: f64) -> Result<f64> {
        match self {
            AxisScale::Linear => Ok(radius - origin_radius),
            AxisScale::Log => {
                let r = self.to_fit(AxisId::Y, radius)?;
                let o = self.to_fit(AxisId::Y, origin_radius)?;
                Ok(r - o)
            }
        }
    }

    pub fn radius_from_fit(self, distance: f64, origin_radius: f64) -> f64 {
        match self {
            AxisScale::Linear => distance + origin_radius,
            AxisScale::Log => origin_radius * 10f64.powf(distance),
        }
    }

    /// Advance a grid value by one step: additive for linear, multiplicative for log.
    #[inline]
    pub fn step(self, value: f64, step: f64) -> f64 {
        match self {
            AxisScale::Linear => value + step,
            AxisScale::Log => value * step,
        }
    }

    pub fn is_log(self) -> bool {
        matches!(self, AxisScale::Log)
    }
}

/// Units of the polar angle coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThetaUnits {
    #[default]
    Degrees,
    Radians,
    Gradians,
    Turns,
}

impl ThetaUnits {
    /// Numeric span of one full revolution.
    pub const fn period(self) -> f64 {
        match self {
            ThetaUnits::Degrees => 360.0,
            ThetaUnits::Radians => std::f64::consts::TAU,
            ThetaUnits::Gradians => 400.0,
            ThetaUnits::Turns => 1.0,
        }
    }

    #[inline]
    pub fn to_radians(self, theta: f64) -> f64 {
        theta / self.period() * std::f64::consts::TAU
    }

    /// Convert radians to these units, normalised to [0, period).
    #[inline]
    pub fn from_radians(self, radians: f64) -> f64 {
        let period = self.period();
        let v = radians / std::f64::consts::TAU * period;
        let v = v.rem_euclid(period);
        // rem_euclid can round up to exactly `period`
        if v >= period { 0.0 } else { v }
    }
}
