use super::*;

#[test]
fn frame_range_rejects_inverted_bounds() {
    assert!(FrameRange::new(5, 4).is_err());
    let r = FrameRange::new(2, 7).unwrap();
    assert_eq!(r.len_frames(), 5);
    assert!(!r.is_empty());
}

#[test]
fn frame_range_chunks_cover_range_exactly() {
    let r = FrameRange::with_len(10, 25);
    let chunks = r.chunks(10);
    assert_eq!(
        chunks,
        vec![
            FrameRange { start: 10, end: 20 },
            FrameRange { start: 20, end: 30 },
            FrameRange { start: 30, end: 35 },
        ]
    );
    assert!(FrameRange::with_len(3, 0).chunks(10).is_empty());
}

#[test]
fn fps_parse_accepts_ffprobe_forms() {
    assert_eq!(Fps::parse("60000/1001").unwrap(), Fps::NTSC_60);
    assert_eq!(Fps::parse("25").unwrap(), Fps::new(25, 1).unwrap());
    assert!(Fps::parse("0/0").is_err());
    assert!(Fps::parse("abc").is_err());
}

#[test]
fn elapsed_second_truncates() {
    let fps = Fps::new(60, 1).unwrap();
    assert_eq!(fps.elapsed_second(FrameIndex(0)), 0);
    assert_eq!(fps.elapsed_second(FrameIndex(59)), 0);
    assert_eq!(fps.elapsed_second(FrameIndex(60)), 1);

    // 59.94 fps: frame 60 is still inside second 1 (60 / 59.94 = 1.001).
    assert_eq!(Fps::NTSC_60.elapsed_second(FrameIndex(59)), 0);
    assert_eq!(Fps::NTSC_60.elapsed_second(FrameIndex(60)), 1);
}

#[test]
fn canvas_byte_len() {
    assert!(Canvas::new(0, 10).is_err());
    assert_eq!(Canvas::new(512, 512).unwrap().byte_len(), 512 * 512 * 4);
}
