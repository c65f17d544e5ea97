// File: crates/digitizer-core/src/curve.rs
// Summary: Curve model: connect mode, ordered points and the curve's filter/mask cache.
// Notes:
// - Point lists change through `CurveOrderer` (insertion/re-sort) and
//   `Curve::remove_point` only; every change renumbers ordinals.

use serde::{Deserialize, Serialize};

use crate::axis::GraphPoint;
use crate::filter::{FilterSettings, MaskCache};
use crate::geometry::Point2;
use crate::transform::CoordinateTransform;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectAs {
    #[default]
    FunctionSmooth,
    FunctionStraight,
    RelationSmooth,
    RelationStraight,
    /// Holds calibration points; positional only.
    AxisCurve,
}

impl ConnectAs {
    pub const fn is_function(self) -> bool {
        matches!(self, ConnectAs::FunctionSmooth | ConnectAs::FunctionStraight)
    }

    pub const fn is_relation(self) -> bool {
        matches!(self, ConnectAs::RelationSmooth | ConnectAs::RelationStraight)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointId(pub u64);

/// A digitized point. Graph coordinates are derived on demand.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    id: PointId,
    screen: Point2,
    ordinal: f64,
}

impl Point {
    pub fn id(&self) -> PointId { self.id }
    pub fn screen(&self) -> Point2 { self.screen }
    /// Ordering key; equals the point's position in its curve.
    pub fn ordinal(&self) -> f64 { self.ordinal }

    pub fn graph(&self, transform: &CoordinateTransform) -> GraphPoint {
        transform.to_graph(self.screen)
    }
}

#[derive(Clone, Debug)]
pub struct Curve {
    name: String,
    connect_as: ConnectAs,
    filter: MaskCache,
    points: Vec<Point>,
    next_id: u64,
}

impl Curve {
    pub fn new(name: impl Into<String>, connect_as: ConnectAs) -> Self {
        Self {
            name: name.into(),
            connect_as,
            filter: MaskCache::new(FilterSettings::default()),
            points: Vec::new(),
            next_id: 0,
        }
    }

    pub fn with_filter(mut self, settings: FilterSettings) -> Self {
        self.filter = MaskCache::new(settings);
        self
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn connect_as(&self) -> ConnectAs { self.connect_as }

    /// Change connect mode. Callers re-sort with `CurveOrderer::resort` when
    /// switching to a function mode.
    pub fn set_connect_as(&mut self, connect_as: ConnectAs) {
        self.connect_as = connect_as;
    }

    pub fn points(&self) -> &[Point] { &self.points }
    pub fn len(&self) -> usize { self.points.len() }
    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    pub fn point(&self, id: PointId) -> Option<&Point> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn index_of(&self, id: PointId) -> Option<usize> {
        self.points.iter().position(|p| p.id == id)
    }

    pub fn screen_points(&self) -> Vec<Point2> {
        self.points.iter().map(|p| p.screen).collect()
    }

    pub fn graph_points(&self, transform: &CoordinateTransform) -> Vec<GraphPoint> {
        self.points.iter().map(|p| p.graph(transform)).collect()
    }

    pub fn filter(&self) -> &MaskCache { &self.filter }
    pub fn filter_mut(&mut self) -> &mut MaskCache { &mut self.filter }

    pub fn remove_point(&mut self, id: PointId) -> Option<Point> {
        let index = self.index_of(id)?;
        let removed = self.points.remove(index);
        self.renumber();
        Some(removed)
    }

    pub(crate) fn insert_at(&mut self, index: usize, screen: Point2) -> PointId {
        let id = PointId(self.next_id);
        self.next_id += 1;
        let index = index.min(self.points.len());
        self.points.insert(index, Point { id, screen, ordinal: index as f64 });
        self.renumber();
        id
    }

    pub(crate) fn points_mut(&mut self) -> &mut Vec<Point> {
        &mut self.points
    }

    pub(crate) fn renumber(&mut self) {
        for (i, p) in self.points.iter_mut().enumerate() {
            p.ordinal = i as f64;
        }
    }
}
