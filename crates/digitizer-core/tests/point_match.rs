// File: crates/digitizer-core/tests/point_match.rs
// Purpose: Point match sessions over synthetic marker blobs.

mod common;

use std::sync::Arc;

use common::{hline, square, vline};
use digitizer_core::{BinaryMask, CancelToken, DigitizeError, MatchStep, Point2, PointMatchSession, PointMatchSettings};

/// Five 3x3 markers on one row, plus a long bar and a single noise pixel.
fn markers() -> Arc<BinaryMask> {
    let mut mask = BinaryMask::new(100, 40);
    for x in [5, 25, 45, 65, 85] {
        square(&mut mask, x, 5, 3);
    }
    for y in 30..33 {
        hline(&mut mask, y, 20, 79);
    }
    mask.set(50, 20, true);
    Arc::new(mask)
}

fn drain(session: &mut PointMatchSession, accept_every_other: bool) -> Vec<Point2> {
    let mut seen = Vec::new();
    let mut i = 0;
    while let MatchStep::Candidate(c) = session.next() {
        seen.push(c.centroid);
        if !accept_every_other || i % 2 == 0 {
            assert_eq!(session.accept(), Some(c.centroid));
        } else {
            assert_eq!(session.reject(), Some(c));
        }
        i += 1;
        assert!(i <= 10, "session did not terminate");
    }
    seen
}

#[test]
fn proposes_each_marker_exactly_once() {
    let mut session = PointMatchSession::start(markers(), (26, 6), PointMatchSettings::default()).expect("start");
    assert_eq!(session.template().pixel_count, 9);

    let seen = drain(&mut session, true);
    let expected: Vec<Point2> = [6.0, 26.0, 46.0, 66.0, 86.0].iter().map(|&x| Point2::new(x, 6.0)).collect();
    assert_eq!(seen, expected);
    assert_eq!(session.accepted().len(), 3);
    assert_eq!(session.rejected_count(), 2);

    assert!(session.is_done());
    assert_eq!(session.next(), MatchStep::Done);
    assert_eq!(session.accept(), None);
}

#[test]
fn pending_candidate_is_stable_until_answered() {
    let mut session = PointMatchSession::start(markers(), (6, 6), PointMatchSettings::default()).expect("start");
    let first = session.next();
    assert_eq!(session.next(), first);
    session.reject();
    assert_ne!(session.next(), first);
}

#[test]
fn existing_points_are_not_proposed_again() {
    let existing = [Point2::new(46.0, 6.0), Point2::new(86.2, 5.8)];
    let mut session =
        PointMatchSession::start_excluding(markers(), (6, 6), PointMatchSettings::default(), &existing)
            .expect("start");
    let seen = drain(&mut session, false);
    assert_eq!(seen, vec![Point2::new(6.0, 6.0), Point2::new(26.0, 6.0), Point2::new(66.0, 6.0)]);
}

/// 9x9 open square outline with its top-left corner at (x, y).
fn hollow_square(mask: &mut BinaryMask, x: u32, y: u32) {
    hline(mask, y, x, x + 8);
    hline(mask, y + 8, x, x + 8);
    vline(mask, x, y, y + 8);
    vline(mask, x + 8, y, y + 8);
}

#[test]
fn hollow_marker_with_existing_point_is_not_proposed() {
    let mut mask = BinaryMask::new(60, 20);
    hollow_square(&mut mask, 5, 5);
    hollow_square(&mut mask, 35, 5);
    let mask = Arc::new(mask);

    let mut session = PointMatchSession::start(Arc::clone(&mask), (5, 5), PointMatchSettings::default()).expect("start");
    assert_eq!(session.template().pixel_count, 32);
    assert_eq!(drain(&mut session, false), vec![Point2::new(9.0, 9.0), Point2::new(39.0, 9.0)]);

    // the existing centroid sits on an OFF pixel inside the outline
    assert!(!mask.get(9, 9));
    let mut session =
        PointMatchSession::start_excluding(mask, (5, 5), PointMatchSettings::default(), &[Point2::new(9.0, 9.0)])
            .expect("start");
    assert_eq!(drain(&mut session, false), vec![Point2::new(39.0, 9.0)]);
}

#[test]
fn template_window_is_centred_on_the_snapped_sample() {
    let settings = PointMatchSettings { max_point_size: 4, ..PointMatchSettings::default() };
    // two rows below the bar; snaps to (50, 32)
    let session = PointMatchSession::start(markers(), (50, 34), settings).expect("start");
    let t = session.template();
    assert_eq!(t.pixel_count, 12);
    assert_eq!((t.bbox.width(), t.bbox.height()), (4, 3));
}

#[test]
fn size_tolerance_filters_candidates() {
    let mut mask = BinaryMask::new(60, 20);
    square(&mut mask, 5, 5, 3);
    square(&mut mask, 20, 5, 4);
    square(&mut mask, 40, 5, 3);
    let settings = PointMatchSettings { size_tolerance: 0.0, ..PointMatchSettings::default() };
    let mut session = PointMatchSession::start(Arc::new(mask), (6, 6), settings).expect("start");
    let seen = drain(&mut session, false);
    assert_eq!(seen, vec![Point2::new(6.0, 6.0), Point2::new(41.0, 6.0)]);
}

#[test]
fn template_is_clipped_to_max_point_size() {
    let settings = PointMatchSettings { max_point_size: 20, ..PointMatchSettings::default() };
    let session = PointMatchSession::start(markers(), (50, 31), settings).expect("start");
    let t = session.template();
    assert!(t.bbox.width() <= 20 && t.bbox.height() <= 20);
    assert_eq!(t.pixel_count, 20 * 3);
}

#[test]
fn sample_off_the_mask_fails() {
    let err = PointMatchSession::start(markers(), (50, 12), PointMatchSettings::default()).expect_err("background");
    assert!(matches!(err, DigitizeError::NoForegroundPixel { x: 50, y: 12 }));
}

#[test]
fn invalid_settings_are_rejected() {
    let settings = PointMatchSettings { max_point_size: 0, ..PointMatchSettings::default() };
    let err = PointMatchSession::start(markers(), (6, 6), settings).expect_err("zero size");
    assert!(matches!(err, DigitizeError::InvalidSettings(_)));
}

#[test]
fn cancelled_scan_loses_no_candidates() {
    let mut session = PointMatchSession::start(markers(), (6, 6), PointMatchSettings::default()).expect("start");
    let token = CancelToken::new();
    token.cancel();
    assert!(matches!(session.next_cancellable(&token), Err(DigitizeError::Cancelled)));
    assert_eq!(drain(&mut session, false).len(), 5);
}
