// File: crates/digitizer-core/tests/filter.rs
// Purpose: Color metrics, inclusive band masks, histograms and mask cache invalidation.

mod common;

use std::sync::Arc;

use common::approx;
use digitizer_core::filter::{build_mask_cancellable, estimate_background};
use digitizer_core::types::MAX_RGB_DISTANCE;
use digitizer_core::{
    build_mask, compute_metric, AxisId, CancelToken, DigitizeError, FilterMode, FilterSettings, GridLine,
    GridRemovalSettings, Histogram, MaskCache, Point2, SourceImage,
};
use image::{Rgb, RgbImage};

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// White canvas with a black vertical stroke at x = 5 and a red dot at (2, 2).
fn sample_image() -> RgbImage {
    let mut img = RgbImage::from_pixel(10, 10, WHITE);
    for y in 0..10 {
        img.put_pixel(5, y, Rgb([0, 0, 0]));
    }
    img.put_pixel(2, 2, Rgb([255, 0, 0]));
    img
}

#[test]
fn metrics_follow_their_definitions() {
    assert!(approx(compute_metric(FilterMode::Intensity, Rgb([3, 4, 0]), WHITE), 5.0, 1e-12));
    assert!(approx(compute_metric(FilterMode::Intensity, WHITE, WHITE), MAX_RGB_DISTANCE, 1e-9));
    assert_eq!(compute_metric(FilterMode::Foreground, WHITE, WHITE), 0.0);
    assert!(approx(compute_metric(FilterMode::Foreground, Rgb([0, 0, 0]), WHITE), MAX_RGB_DISTANCE, 1e-9));

    assert_eq!(compute_metric(FilterMode::Hue, Rgb([255, 0, 0]), WHITE), 0.0);
    assert!(approx(compute_metric(FilterMode::Hue, Rgb([0, 255, 0]), WHITE), 120.0, 1e-9));
    assert!(approx(compute_metric(FilterMode::Hue, Rgb([0, 0, 255]), WHITE), 240.0, 1e-9));
    assert!(approx(compute_metric(FilterMode::Saturation, Rgb([255, 0, 0]), WHITE), 100.0, 1e-9));
    assert_eq!(compute_metric(FilterMode::Saturation, Rgb([128, 128, 128]), WHITE), 0.0);
    assert!(approx(compute_metric(FilterMode::Value, WHITE, WHITE), 100.0, 1e-9));
}

#[test]
fn every_mode_stays_in_its_range() {
    let colors = [Rgb([0, 0, 0]), WHITE, Rgb([12, 200, 77]), Rgb([255, 0, 128]), Rgb([9, 9, 250])];
    for mode in FilterMode::ALL {
        let (lo, hi) = mode.range();
        for px in colors {
            let m = compute_metric(mode, px, Rgb([40, 40, 40]));
            assert!(m >= lo && m <= hi + 1e-9, "{mode:?} {px:?} -> {m}");
        }
    }
}

#[test]
fn band_edges_are_inclusive() {
    let settings = FilterSettings::for_mode(FilterMode::Intensity).with_band(5.0, 5.0);
    assert!(settings.is_on(Rgb([3, 4, 0])));
    assert!(!settings.is_on(Rgb([0, 0, 0])));
    assert!(!settings.is_on(Rgb([6, 0, 0])));
}

#[test]
fn default_intensity_mask_picks_dark_stroke() {
    let img = sample_image();
    let mask = build_mask(&img, &FilterSettings::default());
    assert_eq!(mask.width(), 10);
    assert_eq!(mask.height(), 10);
    // the pure red dot has intensity 255, above the default band
    assert_eq!(mask.count_on(), 10);
    assert!((0..10).all(|y| mask.get(5, y)));
    assert!(!mask.get(2, 2));
}

#[test]
fn hue_mask_picks_red_dot() {
    let img = sample_image();
    let settings = FilterSettings::for_mode(FilterMode::Hue).with_band(0.0, 10.0);
    let mask = build_mask(&img, &settings);
    // achromatic pixels report hue 0 and match as well
    assert!(mask.get(2, 2));
    let sat = build_mask(&img, &FilterSettings::for_mode(FilterMode::Saturation));
    assert_eq!(sat.iter_on().collect::<Vec<_>>(), vec![(2, 2)]);
}

#[test]
fn foreground_mode_uses_background_reference() {
    let img = sample_image();
    let bg = estimate_background(&img);
    assert!(bg.iter().all(|&c| c >= 0xF0));
    let settings = FilterSettings::for_mode(FilterMode::Foreground)
        .with_background([255, 255, 255])
        .with_band(50.0, 500.0);
    let mask = build_mask(&img, &settings);
    assert_eq!(mask.count_on(), 11);
    let near_red = settings.with_background([255, 0, 0]).with_band(0.0, 1.0);
    assert_eq!(build_mask(&img, &near_red).iter_on().collect::<Vec<_>>(), vec![(2, 2)]);
}

#[test]
fn histogram_counts_every_pixel() {
    let img = sample_image();
    let settings = FilterSettings::default();
    let h = Histogram::compute(&img, &settings, 16);
    assert_eq!(h.counts.len(), 16);
    assert_eq!(h.total(), 100);
    assert_eq!(h.counts[0], 10);
    assert_eq!(h.counts[15], 89);
    assert_eq!(h.peak(), 89);
    assert_eq!(h.bucket_of(255.0), 9);
    assert_eq!(h.counts[9], 1);
    assert!(approx(h.bucket_width() * 16.0, MAX_RGB_DISTANCE, 1e-9));
}

#[test]
fn inverted_band_is_rejected() {
    let mut cache = MaskCache::new(FilterSettings::default());
    let bad = FilterSettings::default().with_band(10.0, 1.0);
    assert!(matches!(cache.set_settings(bad), Err(DigitizeError::InvalidSettings(_))));
    assert_eq!(*cache.settings(), FilterSettings::default());
}

#[test]
fn cache_reuses_mask_until_inputs_change() {
    let mut image = SourceImage::new(sample_image());
    let mut cache = MaskCache::new(FilterSettings::default());
    assert!(!cache.is_valid_for(&image));

    let first = cache.mask(&image);
    assert!(cache.is_valid_for(&image));
    let again = cache.mask(&image);
    assert!(Arc::ptr_eq(&first, &again));

    // identical settings keep the cache
    cache.set_settings(FilterSettings::default()).expect("same settings");
    assert!(cache.is_valid_for(&image));

    cache.set_settings(FilterSettings::for_mode(FilterMode::Saturation)).expect("saturation");
    assert!(!cache.is_valid_for(&image));
    let sat = cache.mask(&image);
    assert_eq!(sat.count_on(), 1);

    let old_revision = image.revision();
    image.replace(RgbImage::from_pixel(10, 10, Rgb([255, 0, 0])));
    assert_ne!(image.revision(), old_revision);
    assert!(!cache.is_valid_for(&image));
    assert_eq!(cache.mask(&image).count_on(), 100);
}

#[test]
fn grid_removal_clears_pixels_near_lines() {
    let image = SourceImage::new(sample_image());
    let mut cache = MaskCache::new(FilterSettings::default());
    let line = GridLine { axis: AxisId::Y, value: 0.0, path: vec![Point2::new(0.0, 4.0), Point2::new(10.0, 4.0)] };
    cache.set_grid_removal(GridRemovalSettings { enabled: true, distance_px: 1.0 }, vec![line.clone()]);
    let mask = cache.mask(&image);
    assert_eq!(mask.count_on(), 7);
    assert!(!mask.get(5, 3) && !mask.get(5, 4) && !mask.get(5, 5));
    assert!(mask.get(5, 2) && mask.get(5, 6));

    // zero distance is a no-op
    cache.set_grid_removal(GridRemovalSettings { enabled: true, distance_px: 0.0 }, vec![line]);
    assert_eq!(cache.mask(&image).count_on(), 10);
}

#[test]
fn cancelled_build_leaves_cache_untouched() {
    let image = SourceImage::new(sample_image());
    let token = CancelToken::new();
    token.cancel();

    let err = build_mask_cancellable(image.rgb(), &FilterSettings::default(), &token).expect_err("cancelled");
    assert!(matches!(err, DigitizeError::Cancelled));

    let mut cache = MaskCache::new(FilterSettings::default());
    assert!(matches!(cache.mask_cancellable(&image, &token), Err(DigitizeError::Cancelled)));
    assert!(!cache.is_valid_for(&image));

    let live = CancelToken::new();
    let mask = cache.mask_cancellable(&image, &live).expect("not cancelled");
    assert_eq!(mask.count_on(), 10);
    assert!(cache.is_valid_for(&image));
}
