use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, black_box};
use digitizer_core::{build_mask, FilterMode, FilterSettings, Histogram};
use image::{Rgb, RgbImage};

fn gen_plot(w: u32, h: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(w, h, Rgb([250, 250, 250]));
    for x in 0..w {
        // sine trace with a faint grid every 50 px
        let y = (h as f64 * 0.5 + (x as f64 * 0.02).sin() * h as f64 * 0.3) as u32;
        img.put_pixel(x, y.min(h - 1), Rgb([20, 20, 200]));
        if x % 50 == 0 {
            for yy in 0..h {
                img.put_pixel(x, yy, Rgb([200, 200, 200]));
            }
        }
    }
    img
}

fn bench_mask(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_mask");
    for &(w, h) in &[(800u32, 600u32), (2000, 1500)] {
        let img = gen_plot(w, h);
        for mode in [FilterMode::Intensity, FilterMode::Hue, FilterMode::Foreground] {
            let settings = FilterSettings::for_mode(mode);
            group.bench_with_input(BenchmarkId::from_parameter(format!("{w}x{h}_{mode:?}")), &settings, |b, s| {
                b.iter(|| black_box(build_mask(&img, s)));
            });
        }
    }
    group.finish();
}

fn bench_histogram(c: &mut Criterion) {
    let img = gen_plot(2000, 1500);
    let settings = FilterSettings::for_mode(FilterMode::Value);
    c.bench_function("histogram_2000x1500", |b| {
        b.iter(|| black_box(Histogram::compute(&img, &settings, 64)));
    });
}

criterion_group!(benches, bench_mask, bench_histogram);
criterion_main!(benches);
