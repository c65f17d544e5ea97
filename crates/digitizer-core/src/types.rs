// File: crates/digitizer-core/src/types.rs
// Summary: Shared constants (defaults and numeric tolerances).

/// Axis points needed in shared-axis mode (each point knows both coordinates).
pub const SHARED_AXIS_POINTS: usize = 3;
/// Axis points needed in split-axis mode (two per axis).
pub const SPLIT_AXIS_POINTS: usize = 4;

/// Relative tolerance for collinearity / coincidence tests.
/// Contract: compared against a triangle area normalised by the squared span.
pub const DEGENERATE_TOLERANCE: f64 = 1e-9;

/// Default spacing between emitted segment-fill points, in pixels.
pub const DEFAULT_POINT_SEPARATION: f64 = 25.0;
/// Default minimum number of points a traced segment must produce.
pub const DEFAULT_MIN_SEGMENT_LENGTH: usize = 2;
/// Radius searched around a seed pixel that is itself off.
pub const SEED_SEARCH_RADIUS: i32 = 2;

/// Default bounding box edge accepted for a point-match blob, in pixels.
pub const DEFAULT_MAX_POINT_SIZE: u32 = 48;
/// Default relative pixel-count tolerance for point-match candidates.
pub const DEFAULT_SIZE_TOLERANCE: f64 = 0.5;

/// Default distance within which a relation point snaps onto a segment.
pub const DEFAULT_RELATION_TOLERANCE_PX: f64 = 4.0;

/// Default cap on grid lines per axis.
pub const DEFAULT_MAX_GRID_LINES: usize = 100;
/// Default distance for grid-line pixel removal.
pub const DEFAULT_GRID_REMOVAL_PX: f64 = 2.0;

/// Default histogram bucket count.
pub const DEFAULT_HISTOGRAM_BUCKETS: usize = 64;

/// Largest metric value for RGB-distance based modes: sqrt(3) * 255.
pub const MAX_RGB_DISTANCE: f64 = 441.672_955_930_063_7;
