// File: crates/digitizer-core/tests/grid.rs
// Purpose: Grid value generation, derived parameters and projection into screen space.

mod common;

use common::{approx, vline};
use digitizer_core::{
    compute_grid_lines, AxisId, AxisPoint, AxisScale, BinaryMask, CoordModel, CoordSettings, CoordinateTransform,
    DigitizeError, GridAxisSettings, GridDisable, GridLineSettings, GraphPoint, Point2,
};

/// 120x120 image, 10 px per unit on both axes, origin at screen (10, 110).
fn square_transform() -> CoordinateTransform {
    let points = [
        AxisPoint::new(Point2::new(10.0, 110.0), GraphPoint::new(0.0, 0.0)),
        AxisPoint::new(Point2::new(110.0, 110.0), GraphPoint::new(10.0, 0.0)),
        AxisPoint::new(Point2::new(10.0, 10.0), GraphPoint::new(0.0, 10.0)),
    ];
    CoordinateTransform::new(&CoordSettings::default(), &points).expect("transform")
}

#[test]
fn linear_values_from_count_start_step_stop() {
    for disable in [GridDisable::Count, GridDisable::Stop, GridDisable::Start, GridDisable::Step] {
        let s = GridAxisSettings::new(disable, 5, 0.0, 2.0, 8.0);
        let v = s.values(AxisScale::Linear, 100).expect("valid grid");
        assert_eq!(v.values, vec![0.0, 2.0, 4.0, 6.0, 8.0], "{disable:?}");
        assert!(!v.truncated);
    }
}

#[test]
fn disabled_parameter_is_recomputed() {
    let s = GridAxisSettings::new(GridDisable::Step, 5, 0.0, 123.0, 8.0)
        .normalized(AxisScale::Linear)
        .expect("step derived");
    assert_eq!(s.step, 2.0);

    let s = GridAxisSettings::new(GridDisable::Count, 999, 0.0, 2.5, 10.0)
        .normalized(AxisScale::Linear)
        .expect("count derived");
    assert_eq!(s.count, 5);

    let s = GridAxisSettings::new(GridDisable::Start, 4, -50.0, 2.0, 8.0)
        .normalized(AxisScale::Linear)
        .expect("start derived");
    assert_eq!(s.start, 2.0);
}

#[test]
fn start_after_stop_is_rejected() {
    let s = GridAxisSettings::new(GridDisable::Count, 5, 10.0, 2.0, 0.0);
    assert!(matches!(s.values(AxisScale::Linear, 100), Err(DigitizeError::InvalidGridSettings(_))));
}

#[test]
fn non_positive_step_is_rejected() {
    let s = GridAxisSettings::new(GridDisable::Count, 5, 0.0, 0.0, 8.0);
    assert!(matches!(s.values(AxisScale::Linear, 100), Err(DigitizeError::InvalidGridSettings(_))));
    let s = GridAxisSettings::new(GridDisable::Stop, 0, 0.0, 1.0, 8.0);
    assert!(matches!(s.values(AxisScale::Linear, 100), Err(DigitizeError::InvalidGridSettings(_))));
}

#[test]
fn log_values_step_multiplicatively() {
    let s = GridAxisSettings::new(GridDisable::Count, 0, 1.0, 10.0, 1000.0);
    let v = s.values(AxisScale::Log, 100).expect("log grid");
    assert_eq!(v.values.len(), 4);
    for (got, want) in v.values.iter().zip([1.0, 10.0, 100.0, 1000.0]) {
        assert!(approx(*got, want, 1e-9 * want), "{got} vs {want}");
    }

    let flat = GridAxisSettings::new(GridDisable::Count, 0, 1.0, 1.0, 1000.0);
    assert!(matches!(flat.values(AxisScale::Log, 100), Err(DigitizeError::InvalidGridSettings(_))));
    let zero = GridAxisSettings::new(GridDisable::Count, 0, 0.0, 10.0, 1000.0);
    assert!(matches!(zero.values(AxisScale::Log, 100), Err(DigitizeError::InvalidGridSettings(_))));
}

#[test]
fn too_many_lines_are_truncated() {
    let s = GridAxisSettings::new(GridDisable::Count, 0, 0.0, 1.0, 499.0);
    let v = s.values(AxisScale::Linear, 100).expect("truncated, not an error");
    assert!(v.truncated);
    assert_eq!(v.values.len(), 100);
    assert_eq!(v.values[99], 99.0);

    let settings = GridLineSettings { x: s, y: GridAxisSettings::default(), max_lines: 100 };
    let set = compute_grid_lines(&square_transform(), &settings, 120, 120).expect("grid lines");
    assert!(set.truncated);
}

#[test]
fn cartesian_lines_span_the_image() {
    let step2 = GridAxisSettings::new(GridDisable::Count, 0, 0.0, 2.0, 10.0);
    let settings = GridLineSettings { x: step2, y: step2, max_lines: 100 };
    let set = compute_grid_lines(&square_transform(), &settings, 120, 120).expect("grid lines");
    assert!(!set.truncated);
    assert_eq!(set.axis_lines(AxisId::X).count(), 6);
    assert_eq!(set.axis_lines(AxisId::Y).count(), 6);

    let x2 = set.axis_lines(AxisId::X).find(|l| l.value == 2.0).expect("x = 2 line");
    assert_eq!(x2.path.len(), 2);
    assert!(x2.path.iter().all(|p| approx(p.x, 30.0, 1e-9)));
    let (y_lo, y_hi) = (x2.path[0].y.min(x2.path[1].y), x2.path[0].y.max(x2.path[1].y));
    assert!(approx(y_lo, 0.0, 1e-9) && approx(y_hi, 120.0, 1e-9));

    let y4 = set.axis_lines(AxisId::Y).find(|l| l.value == 4.0).expect("y = 4 line");
    assert!(y4.path.iter().all(|p| approx(p.y, 70.0, 1e-9)));
}

#[test]
fn removal_erases_grid_but_keeps_curve() {
    let step2 = GridAxisSettings::new(GridDisable::Count, 0, 0.0, 2.0, 10.0);
    let settings = GridLineSettings { x: step2, y: step2, max_lines: 100 };
    let set = compute_grid_lines(&square_transform(), &settings, 120, 120).expect("grid lines");

    let mut mask = BinaryMask::new(120, 120);
    vline(&mut mask, 30, 0, 119);
    mask.set(55, 55, true);
    let removed = mask.remove_grid_lines(&set.lines, 1.5);
    assert_eq!(removed, 120);
    assert_eq!(mask.iter_on().collect::<Vec<_>>(), vec![(55, 55)]);
    assert_eq!(mask.remove_grid_lines(&set.lines, 0.0), 0);
}

#[test]
fn polar_grid_has_spokes_and_circles() {
    let settings = CoordSettings { model: CoordModel::Polar, ..CoordSettings::default() };
    let points = [
        AxisPoint::new(Point2::new(300.0, 200.0), GraphPoint::new(0.0, 100.0)),
        AxisPoint::new(Point2::new(200.0, 100.0), GraphPoint::new(90.0, 100.0)),
        AxisPoint::new(Point2::new(150.0, 200.0), GraphPoint::new(180.0, 50.0)),
    ];
    let t = CoordinateTransform::new(&settings, &points).expect("polar transform");
    let grid = GridLineSettings {
        x: GridAxisSettings::new(GridDisable::Count, 0, 0.0, 90.0, 270.0),
        y: GridAxisSettings::new(GridDisable::Count, 0, 0.0, 50.0, 100.0),
        max_lines: 100,
    };
    let set = compute_grid_lines(&t, &grid, 400, 400).expect("polar grid");

    assert_eq!(set.axis_lines(AxisId::X).count(), 4);
    let spoke = set.axis_lines(AxisId::X).find(|l| l.value == 0.0).expect("theta 0");
    assert!(spoke.path[0].distance(Point2::new(200.0, 200.0)) < 1e-6);
    assert!(spoke.path[1].distance(Point2::new(400.0, 200.0)) < 1e-6);

    // the zero-radius circle collapses onto the origin and is skipped
    let circles: Vec<_> = set.axis_lines(AxisId::Y).collect();
    assert_eq!(circles.len(), 2);
    let outer = circles.iter().find(|l| l.value == 100.0).expect("r = 100");
    assert!(outer.path.len() > 8);
    assert!(outer.path.iter().all(|p| approx(p.distance(Point2::new(200.0, 200.0)), 100.0, 1e-6)));
}

#[test]
fn initial_settings_cover_the_image() {
    // visible range is -1..11 on both axes
    let s = GridLineSettings::initial(&square_transform(), 120, 120);
    for axis in [s.x, s.y] {
        assert!([1.0, 2.0].contains(&axis.step), "step {}", axis.step);
        let values = axis.values(AxisScale::Linear, s.max_lines).expect("initial grid is valid");
        assert!(values.values.len() >= 5);
        assert!(values.values.iter().all(|&v| (-1.0 - 1e-9..=11.0 + 1e-9).contains(&v)));
    }
}
