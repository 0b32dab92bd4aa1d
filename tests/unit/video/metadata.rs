use super::*;

fn video(file_id: u32, file_seq: u32, fps: Fps, frame_count: u64) -> VideoInfo {
    VideoInfo {
        file_id,
        file_seq,
        ..VideoInfo::new(format!("GX-{file_id}-{file_seq}.MP4"), fps, frame_count)
    }
}

fn window(start: i64, duration: f64) -> GpxInfo {
    GpxInfo { start, duration }
}

#[test]
fn merges_recordings_with_gps_windows() {
    let fr = Fps::new(60, 1).unwrap();
    let mut videos = vec![video(0, 0, fr, 60 * 100)];
    let mut windows = vec![window(123, 100.0)];

    let segs = compute_map_segments_with_gpx(&videos, &windows).unwrap();
    assert_eq!(segs.len(), 1);
    assert_eq!(segs[0].start, Some(123));
    assert_eq!(segs[0].frame_count, 6000);
    assert_eq!(segs[0].duration, Some(100.0));

    videos.push(video(0, 1, fr, 60 * 111));
    windows.push(window(223, 111.0));
    videos.push(video(0, 2, fr, 60 * 222));
    windows.push(window(334, 222.0));

    let segs = compute_map_segments_with_gpx(&videos, &windows).unwrap();
    assert_eq!(segs.len(), 1);
    assert_eq!((segs[0].file_id, segs[0].file_seq), (0, 0));
    assert_eq!(segs[0].start, Some(123));
    assert_eq!(segs[0].frame_count, 60 * (100 + 111 + 222));
    assert_eq!(segs[0].duration, Some(433.0));

    videos.push(video(1, 0, fr, 60 * 444));
    windows.push(window(1230, 444.0));
    videos.push(video(1, 1, fr, 60 * 555));
    windows.push(window(1674, 555.0));

    let segs = compute_map_segments_with_gpx(&videos, &windows).unwrap();
    assert_eq!(segs.len(), 2);
    assert_eq!((segs[1].file_id, segs[1].file_seq), (1, 0));
    assert_eq!(segs[1].start, Some(1230));
    assert_eq!(segs[1].frame_count, 60 * (444 + 555));
    assert_eq!(segs[1].duration, Some(999.0));
}

#[test]
fn merge_uses_embedded_windows() {
    let fr = Fps::new(30, 1).unwrap();
    let mut a = video(2, 0, fr, 300);
    a.start = Some(1000);
    a.duration = Some(10.0);
    let mut b = video(2, 1, fr, 150);
    b.start = Some(1012);
    b.duration = Some(5.0);

    let segs = compute_map_segments(&[a, b]).unwrap();
    assert_eq!(segs.len(), 1);
    assert_eq!(segs[0].frame_count, 450);
    assert_eq!(segs[0].duration, Some(17.0));
}

#[test]
fn merge_requires_known_start() {
    let fr = Fps::new(30, 1).unwrap();
    assert!(compute_map_segments(&[video(0, 0, fr, 10)]).is_err());
}

#[test]
fn merge_rejects_sequence_gaps_and_mixed_rates() {
    let fr = Fps::new(60, 1).unwrap();
    let windows = [window(0, 1.0), window(1, 1.0)];

    let gap = [video(0, 0, fr, 60), video(0, 2, fr, 60)];
    assert!(compute_map_segments_with_gpx(&gap, &windows).is_err());

    let mixed = [video(0, 0, fr, 60), video(0, 1, Fps::NTSC_60, 60)];
    assert!(compute_map_segments_with_gpx(&mixed, &windows).is_err());

    assert!(compute_map_segments_with_gpx(&gap, &windows[..1]).is_err());
}

#[test]
fn segments_doc_writes_rate_and_skips_unknown_window() {
    let doc = VideoSegmentsDoc {
        segments: vec![video(3, 4, Fps::NTSC_60, 1200)],
    };
    let value = serde_json::to_value(&doc).unwrap();
    let seg = &value["segments"][0];
    assert_eq!(seg["path"], "GX-3-4.MP4");
    assert_eq!(seg["file_id"], 3);
    assert_eq!(seg["file_seq"], 4);
    assert_eq!(seg["frame_rate_num"], 60000);
    assert_eq!(seg["frame_rate_den"], 1001);
    assert!((seg["frame_rate"].as_f64().unwrap() - 59.94).abs() < 0.01);
    assert!(seg.get("start").is_none());
    assert!(seg.get("duration").is_none());
}

#[test]
fn segments_doc_reads_optional_fields() {
    let json = r#"{"segments":[
        {"path":"a.mp4","file_id":1,"file_seq":0,"frame_rate":25.0,
         "frame_rate_num":25,"frame_rate_den":1,"frame_count":50,"start":1600000000,"duration":2.5}
    ]}"#;
    let doc: VideoSegmentsDoc = serde_json::from_str(json).unwrap();
    let v = &doc.segments[0];
    assert_eq!(v.fps, Fps::new(25, 1).unwrap());
    assert_eq!(v.start, Some(1_600_000_000));
    assert_eq!(v.window(), Some(window(1_600_000_000, 2.5)));
}

#[test]
fn segments_doc_rejects_zero_rate() {
    let json = r#"{"segments":[{"path":"a","file_id":0,"file_seq":0,
        "frame_rate_num":0,"frame_rate_den":1,"frame_count":1}]}"#;
    assert!(serde_json::from_str::<VideoSegmentsDoc>(json).is_err());
}

#[test]
fn info_doc_roundtrips_through_a_file() {
    let dir = std::env::temp_dir().join(format!("gpsmap-meta-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("info.json");
    let doc = VideoInfoDoc {
        video_info: vec![video(0, 0, Fps::NTSC_60, 10)],
        gpx_info: vec![window(5, 1.5)],
    };
    write_json(&path, &doc).unwrap();
    let back: VideoInfoDoc = read_json(&path).unwrap();
    assert_eq!(back, doc);
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn file_ids_from_stem() {
    assert_eq!(parse_file_ids(Path::new("/v/GX-12-3.MP4")), Some((12, 3)));
    assert_eq!(parse_file_ids(Path::new("GX-1-07")), Some((1, 7)));
    assert_eq!(parse_file_ids(Path::new("GOPR0001.MP4")), None);
}

#[test]
fn window_spans_first_to_last_timestamp() {
    let w = window_from_timestamps(r#"[{"timestamp":100},{"timestamp":103},{"timestamp":161}]"#)
        .unwrap();
    assert_eq!(w, window(100, 61.0));
    assert!(window_from_timestamps("[]").unwrap_err().is_data_anomaly());
}
