// File: crates/digitizer-core/tests/common/mod.rs
// Purpose: Shared fixtures for integration tests (calibrations, synthetic masks).

#![allow(dead_code)]

use digitizer_core::{AxisPoint, BinaryMask, CoordSettings, CoordSystem, GraphPoint, Point2};

/// Origin at screen (100, 400), 40 px per x unit and 60 px per y unit.
pub fn cartesian_points() -> [AxisPoint; 3] {
    [
        AxisPoint::new(Point2::new(100.0, 400.0), GraphPoint::new(0.0, 0.0)),
        AxisPoint::new(Point2::new(500.0, 400.0), GraphPoint::new(10.0, 0.0)),
        AxisPoint::new(Point2::new(100.0, 100.0), GraphPoint::new(0.0, 5.0)),
    ]
}

/// Graph x equals screen x; graph y grows upward from screen y = 100.
pub fn identity_x_system() -> CoordSystem {
    let mut cs = CoordSystem::new(CoordSettings::default()).expect("default settings");
    cs.add_axis_point(AxisPoint::new(Point2::new(0.0, 100.0), GraphPoint::new(0.0, 0.0)))
        .expect("p0");
    cs.add_axis_point(AxisPoint::new(Point2::new(100.0, 100.0), GraphPoint::new(100.0, 0.0)))
        .expect("p1");
    cs.add_axis_point(AxisPoint::new(Point2::new(0.0, 0.0), GraphPoint::new(0.0, 100.0)))
        .expect("p2");
    cs
}

pub fn hline(mask: &mut BinaryMask, y: u32, x0: u32, x1: u32) {
    for x in x0..=x1 {
        mask.set(x, y, true);
    }
}

pub fn vline(mask: &mut BinaryMask, x: u32, y0: u32, y1: u32) {
    for y in y0..=y1 {
        mask.set(x, y, true);
    }
}

/// Filled square with top-left corner (x, y).
pub fn square(mask: &mut BinaryMask, x: u32, y: u32, size: u32) {
    for yy in y..y + size {
        for xx in x..x + size {
            mask.set(xx, yy, true);
        }
    }
}

pub fn approx(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}
