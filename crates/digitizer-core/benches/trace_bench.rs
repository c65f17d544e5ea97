use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, black_box};
use digitizer_core::{BinaryMask, MatchStep, PointMatchSession, PointMatchSettings, SegmentFillSettings, SegmentFillTracer};

/// Thick sine stroke across a `w`-wide mask; returns the mask and a seed on it.
fn gen_stroke(w: u32, h: u32) -> (BinaryMask, (u32, u32)) {
    let mask = BinaryMask::from_fn(w, h, |x, y| {
        let cy = h as f64 * 0.5 + (x as f64 * 0.01).sin() * h as f64 * 0.3;
        (y as f64 - cy).abs() <= 1.5
    });
    let seed_y = (h as f64 * 0.5).round() as u32;
    (mask, (0, seed_y))
}

fn gen_markers(cols: u32, rows: u32) -> BinaryMask {
    BinaryMask::from_fn(cols * 20, rows * 20, |x, y| x % 20 < 4 && y % 20 < 4)
}

fn bench_segment_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("segment_fill");
    for &w in &[1_000u32, 4_000u32] {
        let (mask, seed) = gen_stroke(w, 400);
        let tracer = SegmentFillTracer::new(SegmentFillSettings { fill_corners: true, ..SegmentFillSettings::default() });
        group.bench_with_input(BenchmarkId::from_parameter(format!("w{w}")), &seed, |b, &s| {
            b.iter(|| black_box(tracer.trace(&mask, s)));
        });
    }
    group.finish();
}

fn bench_point_match(c: &mut Criterion) {
    let mask = Arc::new(gen_markers(50, 40));
    c.bench_function("point_match_2000_markers", |b| {
        b.iter_batched(
            || Arc::clone(&mask),
            |m| {
                let mut session = match PointMatchSession::start(m, (1, 1), PointMatchSettings::default()) {
                    Ok(s) => s,
                    Err(_) => return 0usize,
                };
                let mut n = 0usize;
                while let MatchStep::Candidate(_) = session.next() {
                    session.accept();
                    n += 1;
                }
                black_box(n)
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_segment_fill, bench_point_match);
criterion_main!(benches);
