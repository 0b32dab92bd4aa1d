use super::*;

fn fix(t: f64, lat: f64, lon: f64) -> Sample {
    Sample {
        timestamp: t,
        latitude: lat,
        longitude: lon,
        ..Sample::default()
    }
}

fn segment(samples: Vec<Sample>) -> Segment {
    let mut seg = Segment::from_samples(0.0, 0.0, samples);
    seg.update_distances();
    seg.update_bearing();
    seg
}

#[test]
fn push_rejects_time_going_backwards() {
    let mut seg = Segment::new(0.0, 0.0);
    seg.push(fix(10.0, 0.0, 0.0)).unwrap();
    seg.push(fix(10.0, 0.0, 0.0)).unwrap();
    assert!(seg.push(fix(9.0, 0.0, 0.0)).is_err());
    assert_eq!(seg.len(), 2);
}

#[test]
fn cumulative_distance_matches_deltas() {
    let mut seg = Segment::from_samples(
        1000.0,
        0.0,
        vec![
            fix(0.0, 46.0, 6.0),
            fix(1.0, 46.0001, 6.0002),
            fix(2.0, 46.0003, 6.0002),
            fix(3.0, 46.0003, 6.0002),
        ],
    );
    seg.update_distances();

    let s = seg.samples();
    assert_eq!(s[0].distance_delta, 0.0);
    assert_eq!(s[0].total_distance, 1000.0);
    for i in 1..s.len() {
        assert!(s[i].distance_delta >= 0.0);
        assert_eq!(s[i].total_distance, s[i - 1].total_distance + s[i].distance_delta);
    }
    assert_eq!(s[3].distance_delta, 0.0);
}

#[test]
fn bearing_carries_forward_over_degenerate_pairs() {
    let seg = segment(vec![
        fix(0.0, 0.0, 0.0),
        fix(1.0, 0.0, 0.001),
        fix(2.0, 0.0, 0.001),
        fix(3.0, 0.0, 0.002),
    ]);
    let s = seg.samples();
    assert!((s[0].bearing - 90.0).abs() < 1e-6);
    // Sample 1 -> 2 does not move: keeps heading of sample 0.
    assert!((s[1].bearing - 90.0).abs() < 1e-6);
    assert!((s[2].bearing - 90.0).abs() < 1e-6);
    // Last sample has no successor.
    assert!((s[3].bearing - 90.0).abs() < 1e-6);
}

#[test]
fn bearing_of_leading_degenerate_pair_stays_zero() {
    let seg = segment(vec![fix(0.0, 5.0, 5.0), fix(1.0, 5.0, 5.0), fix(2.0, 5.0, 5.1)]);
    assert_eq!(seg.samples()[0].bearing, 0.0);
    assert!((seg.samples()[1].bearing - 90.0).abs() < 0.1);
}

#[test]
fn grade_uses_window_on_both_sides() {
    // ~11.1 m between fixes, climbing 1 m each step: the window spans 5 steps per side.
    let samples = (0..20)
        .map(|i| {
            let mut s = fix(i as f64, i as f64 * 0.0001, 0.0);
            s.elevation = i as f64;
            s
        })
        .collect();
    let mut seg = segment(samples);
    seg.update_grade();

    let mid = &seg.samples()[10];
    assert!(mid.grade > 7.0 && mid.grade < 7.4, "{}", mid.grade);
    assert_eq!(seg.last().unwrap().grade, 0.0);
}

#[test]
fn grade_is_zero_without_movement() {
    let mut seg = segment(vec![fix(0.0, 1.0, 1.0), fix(1.0, 1.0, 1.0), fix(2.0, 1.0, 1.0)]);
    seg.samples_mut()[1].elevation = 50.0;
    seg.update_grade();
    assert!(seg.iter().all(|s| s.grade == 0.0));
}

#[test]
fn interpolate_two_points_at_one_hz() {
    let seg = segment(vec![fix(0.0, 10.0, 20.0), fix(10.0, 10.001, 20.001)]);
    let out = seg.interpolate(1.0).unwrap();

    assert_eq!(out.len(), 10);
    let first = out.first().unwrap();
    assert_eq!(first.latitude, 10.0);
    assert_eq!(first.longitude, 20.0);
    assert_eq!(first.timestamp, 0.0);

    for (k, s) in out.iter().enumerate() {
        let expect_lat = 10.0 + 0.001 * k as f64 / 10.0;
        let expect_lon = 20.0 + 0.001 * k as f64 / 10.0;
        assert!((s.latitude - expect_lat).abs() < 1e-12);
        assert!((s.longitude - expect_lon).abs() < 1e-12);
        assert!((s.timestamp - k as f64).abs() < 1e-12);
    }
    for w in out.samples().windows(2) {
        assert!(w[1].total_distance > w[0].total_distance);
    }
    assert_eq!(out.frequency(), 1.0);
}

#[test]
fn interpolate_frame_count_rounds() {
    let seg = segment(vec![fix(0.0, 0.0, 0.0), fix(2.5, 0.0, 0.001)]);
    let fps = 60000.0 / 1001.0;
    let out = seg.interpolate(fps).unwrap();
    assert_eq!(out.len(), (2.5 * fps).round() as usize);
}

#[test]
fn interpolate_bearing_takes_shortest_turn() {
    let mut a = fix(0.0, 0.0, 0.0);
    a.bearing = 350.0;
    let mut b = fix(4.0, 0.0, 0.0001);
    b.bearing = 10.0;
    let seg = Segment::from_samples(0.0, 0.0, vec![a, b]);
    let out = seg.interpolate(1.0).unwrap();
    let bearings: Vec<f64> = out.iter().map(|s| s.bearing).collect();
    let expected = [350.0, 355.0, 0.0, 5.0];
    for (got, want) in bearings.iter().zip(expected) {
        assert!((got - want).abs() < 1e-9, "{bearings:?}");
    }
}

#[test]
fn interpolate_fails_on_zero_time_delta() {
    let seg = segment(vec![fix(0.0, 0.0, 0.0), fix(0.0, 0.0, 0.001), fix(1.0, 0.0, 0.002)]);
    let err = seg.interpolate(1.0).unwrap_err();
    assert!(err.is_data_anomaly());
}

#[test]
fn interpolate_keeps_segment_start_flag_on_first_sample_only() {
    let mut a = fix(0.0, 0.0, 0.0);
    a.is_segment_start = true;
    a.is_track_start = true;
    let seg = segment(vec![a, fix(3.0, 0.0, 0.001)]);
    let out = seg.interpolate(1.0).unwrap();
    assert!(out.samples()[0].is_segment_start);
    assert!(out.samples()[0].is_track_start);
    assert!(out.samples()[1..].iter().all(|s| !s.is_segment_start));
}

#[test]
fn interpolate_moves_start_flags_past_pairs_without_samples() {
    let mut a = fix(0.0, 0.0, 0.0);
    a.is_segment_start = true;
    a.is_track_start = true;
    // 0.2 s at 1 Hz rounds to no samples for the first pair.
    let seg = segment(vec![a, fix(0.2, 0.0, 0.0001), fix(2.0, 0.0, 0.001)]);
    let out = seg.interpolate(1.0).unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out.samples()[0].timestamp, 0.2);
    assert!(out.samples()[0].is_segment_start);
    assert!(out.samples()[0].is_track_start);
    assert!(!out.samples()[1].is_segment_start);
}

#[test]
fn split_idle_concatenation_reproduces_input() {
    let seg = segment(vec![
        fix(0.0, 1.0, 1.0),
        fix(1.0, 1.0001, 1.0),
        fix(2.0, 1.0002, 1.0),
        fix(3.0, 1.0002, 1.0),
        fix(4.0, 1.0002, 1.0),
        fix(5.0, 1.0003, 1.0),
        fix(6.0, 1.0003, 1.0),
    ]);
    let parts = seg.split_idle();
    assert_eq!(parts.len(), 4);
    assert_eq!(
        parts.iter().map(Segment::len).collect::<Vec<_>>(),
        vec![3, 2, 1, 1]
    );
    assert!(!parts[0].is_idle());
    assert!(parts[1].is_idle());

    let rejoined: Vec<Sample> = parts.iter().flat_map(|p| p.iter().cloned()).collect();
    assert_eq!(rejoined, seg.samples());
}

#[test]
fn split_idle_distance_offsets_continue() {
    let seg = segment(vec![
        fix(0.0, 1.0, 1.0),
        fix(1.0, 1.001, 1.0),
        fix(2.0, 1.001, 1.0),
    ]);
    let parts = seg.split_idle();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].initial_distance(), 0.0);
    assert_eq!(parts[1].initial_distance(), seg.samples()[1].total_distance);
}

#[test]
fn split_idle_of_empty_and_single() {
    assert!(Segment::new(0.0, 0.0).split_idle().is_empty());
    let one = segment(vec![fix(0.0, 1.0, 1.0)]);
    assert_eq!(one.split_idle().len(), 1);
}

#[test]
fn closest_sample_before_first_fails() {
    let seg = segment(vec![fix(10.0, 0.0, 0.0), fix(11.0, 0.0, 0.0), fix(12.0, 0.0, 0.0)]);
    let mut cursor = 0;
    assert!(seg.closest_sample(9.5, &mut cursor).is_none());
    assert_eq!(cursor, 0);
}

#[test]
fn closest_sample_exact_timestamp_returns_that_sample() {
    let seg = segment(vec![
        fix(10.0, 0.0, 0.0),
        fix(11.0, 0.0, 1.0),
        fix(12.0, 0.0, 2.0),
        fix(13.0, 0.0, 3.0),
    ]);
    let mut cursor = 0;
    let s = seg.closest_sample(12.0, &mut cursor).unwrap();
    assert_eq!(s.longitude, 2.0);
    assert_eq!(cursor, 2);

    let s = seg.closest_sample(12.5, &mut cursor).unwrap();
    assert_eq!(s.longitude, 2.0);

    // Never rewinds.
    assert!(seg.closest_sample(10.5, &mut cursor).is_none());
    // Nothing after the last interval.
    assert!(seg.closest_sample(13.0, &mut cursor).is_none());
    assert_eq!(cursor, 2);
}

#[test]
fn closest_sample_cursor_out_of_range() {
    let seg = segment(vec![fix(0.0, 0.0, 0.0)]);
    let mut cursor = 5;
    assert!(seg.closest_sample(0.0, &mut cursor).is_none());
}

#[test]
fn sort_keeps_source_order_for_equal_timestamps() {
    let mut seg = Segment::from_samples(
        0.0,
        0.0,
        vec![
            fix(2.0, 0.0, 0.0),
            fix(1.0, 1.0, 0.0),
            fix(1.0, 2.0, 0.0),
            fix(0.0, 3.0, 0.0),
            fix(1.0, 4.0, 0.0),
        ],
    );
    seg.sort_by_timestamp();
    let lats: Vec<f64> = seg.iter().map(|s| s.latitude).collect();
    assert_eq!(lats, vec![3.0, 1.0, 2.0, 4.0, 0.0]);
}

#[test]
fn extract_checks_bounds() {
    let seg = segment((0..5).map(|i| fix(i as f64, 0.0, i as f64)).collect());
    assert_eq!(seg.extract(1, 3).unwrap().len(), 2);
    assert_eq!(seg.extract(4, 4).unwrap().len(), 0);
    assert!(seg.extract(5, 5).is_none());
    assert!(seg.extract(2, 6).is_none());
    assert!(seg.extract(3, 2).is_none());
}

#[test]
fn info_reports_start_and_duration() {
    let seg = segment(vec![fix(100.7, 0.0, 0.0), fix(160.7, 0.0, 0.1)]);
    let info = seg.info().unwrap();
    assert_eq!(info.start, 100);
    assert!((info.duration - 60.0).abs() < 1e-9);
    assert!(Segment::new(0.0, 0.0).info().is_none());
}

#[test]
fn fill_windows_reports_missing_overlap_as_none() {
    let seg = segment((0..100).map(|i| fix(1000.0 + i as f64, 0.0, 0.0)).collect());
    let windows = [
        GpxInfo {
            start: 1010,
            duration: 20.0,
        },
        GpxInfo {
            start: 500,
            duration: 10.0,
        },
        GpxInfo {
            start: 1090,
            duration: 50.0,
        },
    ];
    let out = seg.fill_windows(&windows);
    assert_eq!(out.len(), 3);
    let first = out[0].as_ref().unwrap();
    assert_eq!(first.len(), 20);
    assert_eq!(first.first().unwrap().timestamp, 1010.0);
    assert!(out[1].is_none());
    assert!(out[2].is_none());
}

#[test]
fn merge_concatenates_in_order() {
    let mut a = segment(vec![fix(0.0, 0.0, 0.0), fix(1.0, 0.0, 0.1)]);
    a.samples_mut()[0].is_segment_start = true;
    let mut b = segment(vec![fix(5.0, 1.0, 0.0), fix(6.0, 1.0, 0.1)]);
    b.samples_mut()[0].is_segment_start = true;

    let merged = merge_segments([&a, &b]);
    assert_eq!(merged.len(), 4);
    assert!(merged.samples()[2].is_segment_start);
    assert_eq!(merged.samples()[3].timestamp, 6.0);
    assert!(merge_segments(std::iter::empty()).is_empty());
}

#[test]
fn segment_range_picks_first_covering_segment() {
    let a = Arc::new(segment((0..10).map(|i| fix(i as f64, 0.0, 0.0)).collect()));
    let b = Arc::new(segment((0..100).map(|i| fix(100.0 + i as f64, 0.0, 0.0)).collect()));
    let segments = vec![a, b];

    let r = segment_range(&segments, 110.0, 30.0).unwrap();
    assert!(Arc::ptr_eq(&r.segment, &segments[1]));
    assert_eq!(r.start_index, 10);
    assert_eq!(r.end_index, 40);

    // Window starts in a but ends beyond it, and b does not cover the start.
    assert!(segment_range(&segments, 5.0, 30.0).is_none());
    assert!(segment_range(&segments, 50.0, 1.0).is_none());
}
