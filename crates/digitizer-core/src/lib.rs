// File: crates/digitizer-core/src/lib.rs
// Summary: Core library entry point; calibration transforms, color filtering and
//          automated point extraction for digitizing plotted graphs.

pub mod error;
pub mod types;
pub mod geometry;
pub mod scale;
pub mod datetime;
pub mod axis;
pub mod transform;
pub mod grid;
pub mod mask;
pub mod filter;
pub mod segment;
pub mod point_match;
pub mod curve;
pub mod ordering;
pub mod cancel;
pub mod config;

pub use error::{AxisId, DigitizeError, Result};
pub use geometry::Point2;
pub use scale::{AxisScale, ThetaUnits};
pub use datetime::{AxisUnits, DateFormat, TimeFormat};
pub use axis::{AxisMode, AxisPoint, AxisPointKind, Calibration, CoordModel, CoordSettings, CoordSystem, GraphPoint};
pub use transform::CoordinateTransform;
pub use grid::{compute_grid_lines, GridAxisSettings, GridDisable, GridLine, GridLineSet, GridLineSettings};
pub use mask::{BinaryMask, GridRemovalSettings};
pub use filter::{build_mask, compute_metric, FilterMode, FilterSettings, Histogram, MaskCache, SourceImage};
pub use segment::{trace_segment, SegmentFillSettings, SegmentFillTracer};
pub use point_match::{Candidate, MatchStep, PointMatchSession, PointMatchSettings, Template};
pub use curve::{ConnectAs, Curve, Point, PointId};
pub use ordering::{CurveOrderer, Insertion};
pub use cancel::{BackgroundJob, CancelToken};
pub use config::DigitizerConfig;
