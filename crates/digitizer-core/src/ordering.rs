// File: crates/digitizer-core/src/ordering.rs
// Summary: Inserts new points into a curve under function or relation ordering rules.

use std::cmp::Ordering;

use crate::axis::CoordSystem;
use crate::curve::{ConnectAs, Curve, PointId};
use crate::error::Result;
use crate::geometry::{project_onto_segment, Point2};
use crate::types::DEFAULT_RELATION_TOLERANCE_PX;

/// Where a point landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Insertion {
    pub id: PointId,
    pub index: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveOrderer {
    /// A relation point within this many pixels of an existing segment is
    /// inserted inside that segment instead of at the end.
    pub relation_tolerance_px: f64,
}

impl Default for CurveOrderer {
    fn default() -> Self {
        Self { relation_tolerance_px: DEFAULT_RELATION_TOLERANCE_PX }
    }
}

impl CurveOrderer {
    pub fn new(relation_tolerance_px: f64) -> Self {
        Self { relation_tolerance_px }
    }

    /// Index at which `screen` would be inserted, without mutating the curve.
    /// Function curves need a calibrated `coords`.
    pub fn insert_index(&self, curve: &Curve, screen: Point2, coords: &CoordSystem) -> Result<usize> {
        let points = curve.points();
        match curve.connect_as() {
            ConnectAs::FunctionSmooth | ConnectAs::FunctionStraight => {
                let transform = coords.transform()?;
                let x_new = transform.independent_value(screen);
                // after any equal values
                Ok(points.partition_point(|p| transform.independent_value(p.screen()) <= x_new))
            }
            ConnectAs::RelationSmooth | ConnectAs::RelationStraight => {
                Ok(self.nearest_segment(curve, screen).map_or(points.len(), |i| i + 1))
            }
            ConnectAs::AxisCurve => Ok(points.len()),
        }
    }

    pub fn insert(&self, curve: &mut Curve, screen: Point2, coords: &CoordSystem) -> Result<Insertion> {
        let index = self.insert_index(curve, screen, coords)?;
        let id = curve.insert_at(index, screen);
        tracing::debug!(curve = curve.name(), index, "point inserted");
        Ok(Insertion { id, index })
    }

    /// Insert every point or none: calibration is checked before the first insert.
    pub fn insert_all(&self, curve: &mut Curve, screens: &[Point2], coords: &CoordSystem) -> Result<Vec<PointId>> {
        if curve.connect_as().is_function() {
            coords.transform()?;
        }
        let mut ids = Vec::with_capacity(screens.len());
        for &s in screens {
            ids.push(self.insert(curve, s, coords)?.id);
        }
        Ok(ids)
    }

    /// Re-establish ascending independent-variable order after the transform
    /// changed. Relation and axis curves keep their order.
    pub fn resort(&self, curve: &mut Curve, coords: &CoordSystem) -> Result<()> {
        if !curve.connect_as().is_function() {
            return Ok(());
        }
        let transform = coords.transform()?;
        curve.points_mut().sort_by(|a, b| {
            let xa = transform.independent_value(a.screen());
            let xb = transform.independent_value(b.screen());
            xa.partial_cmp(&xb).unwrap_or(Ordering::Equal)
        });
        curve.renumber();
        Ok(())
    }

    /// Segment `(P_i, P_i+1)` nearest to `screen` within tolerance, if any.
    /// Ties go to the earlier segment.
    fn nearest_segment(&self, curve: &Curve, screen: Point2) -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        for (i, pair) in curve.points().windows(2).enumerate() {
            let proj = project_onto_segment(screen, pair[0].screen(), pair[1].screen());
            if !proj.interior || proj.distance > self.relation_tolerance_px {
                continue;
            }
            if best.map_or(true, |(d, _)| proj.distance < d) {
                best = Some((proj.distance, i));
            }
        }
        best.map(|(_, i)| i)
    }
}
