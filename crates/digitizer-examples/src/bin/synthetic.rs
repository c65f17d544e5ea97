// File: crates/digitizer-examples/src/bin/synthetic.rs
// Summary: Draws a synthetic plot, calibrates it and extracts a curve and its markers.

use digitizer_core::{
    AxisPoint, ConnectAs, CoordSettings, CoordSystem, Curve, CurveOrderer, FilterMode, FilterSettings, GraphPoint,
    MatchStep, Point2, PointMatchSession, PointMatchSettings, SegmentFillSettings, SegmentFillTracer, SourceImage,
};
use image::{Rgb, RgbImage};

const W: u32 = 420;
const H: u32 = 320;

/// Graph x in [0, 10] spans screen x 10..410; graph y = 0 sits at screen y 160.
fn to_screen(x: f64, y: f64) -> (f64, f64) {
    (10.0 + x * 40.0, 160.0 - y * 140.0)
}

fn draw_plot() -> RgbImage {
    let mut img = RgbImage::from_pixel(W, H, Rgb([255, 255, 255]));
    // dark curve y = sin(x), two pixels thick
    for i in 0..=4000 {
        let x = i as f64 / 400.0;
        let (sx, sy) = to_screen(x, x.sin());
        for dy in 0..2 {
            img.put_pixel(sx.round() as u32, (sy.round() as u32 + dy).min(H - 1), Rgb([10, 10, 10]));
        }
    }
    // square markers below the curve's range
    for k in 1..10 {
        let (cx, cy) = to_screen(k as f64, -1.1);
        for dx in 0..5 {
            for dy in 0..5 {
                img.put_pixel(cx as u32 + dx - 2, cy as u32 + dy - 2, Rgb([10, 10, 10]));
            }
        }
    }
    img
}

fn calibration() -> CoordSystem {
    let mut coords = CoordSystem::new(CoordSettings::default()).expect("settings");
    for (gx, gy) in [(0.0, 0.0), (10.0, 0.0), (0.0, 1.0)] {
        let (sx, sy) = to_screen(gx, gy);
        coords
            .add_axis_point(AxisPoint::new(Point2::new(sx, sy), GraphPoint::new(gx, gy)))
            .expect("axis point");
    }
    coords
}

fn main() {
    let image = SourceImage::new(draw_plot());
    let coords = calibration();
    let transform = coords.transform().expect("calibrated");
    let orderer = CurveOrderer::default();

    let mut curve = Curve::new("sine", ConnectAs::FunctionSmooth).with_filter(FilterSettings::for_mode(FilterMode::Intensity));
    let mask = curve.filter_mut().mask(&image);

    let out = std::path::PathBuf::from("target/out/example_synthetic_mask.png");
    std::fs::create_dir_all(out.parent().unwrap()).unwrap();
    mask.to_gray_image().save(&out).expect("save mask");
    println!("Wrote {}", out.display());

    let tracer = SegmentFillTracer::new(SegmentFillSettings { point_separation: 20.0, fill_corners: true, ..Default::default() });
    let (sx, sy) = to_screen(0.5, 0.5_f64.sin());
    let traced = tracer.trace(&mask, (sx.round() as u32, sy.round() as u32)).expect("trace");
    orderer.insert_all(&mut curve, &traced, &coords).expect("insert");

    println!("Curve '{}': {} points", curve.name(), curve.len());
    for g in curve.graph_points(transform) {
        println!("  x = {:>6.3}  y = {:>6.3}  (sin x = {:>6.3})", g.x, g.y, g.x.sin());
    }

    let mut markers = Curve::new("markers", ConnectAs::FunctionStraight);
    let (mx, my) = to_screen(1.0, -1.1);
    let mut session = PointMatchSession::start(mask, (mx as u32, my as u32), PointMatchSettings::default())
        .expect("sample marker");
    while let MatchStep::Candidate(c) = session.next() {
        // the curve itself is far bigger than a marker and never proposed
        println!("  candidate at ({:.1}, {:.1}), {} px", c.centroid.x, c.centroid.y, c.pixel_count);
        session.accept();
    }
    orderer.insert_all(&mut markers, session.accepted(), &coords).expect("insert markers");

    println!("Curve '{}': {} points", markers.name(), markers.len());
    for g in markers.graph_points(transform) {
        println!("  x = {:>6.3}  y = {:>6.3}", g.x, g.y);
    }
}
