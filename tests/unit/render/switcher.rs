use super::*;

fn walk(sw: &mut ZoomSwitcher, seconds: u64, fps: f64) -> Vec<usize> {
    // One entry per whole second, sampled at the first frame of that second.
    let frames_per_sec = fps.ceil() as u64;
    let mut out = Vec::new();
    let mut frame = 0u64;
    let mut last_second = u64::MAX;
    while out.len() < seconds as usize {
        let idx = sw.compute_index(FrameIndex(frame), fps);
        let second = (frame as f64 / fps) as u64;
        if second != last_second {
            out.push(idx);
            last_second = second;
        }
        frame += 1;
        assert!(frame < seconds * frames_per_sec * 2);
    }
    out
}

#[test]
fn round_robin_returns_to_first_level() {
    let mut sw = ZoomSwitcher::new(vec![5, 5, 5, 60], 1000.0, None).unwrap();
    let seq = walk(&mut sw, 80, 1.0);
    assert!(seq[0..5].iter().all(|&i| i == 0));
    assert!(seq[5..10].iter().all(|&i| i == 1));
    assert!(seq[10..15].iter().all(|&i| i == 2));
    assert!(seq[15..75].iter().all(|&i| i == 3));
    assert_eq!(seq[75], 0);
}

#[test]
fn index_changes_only_on_second_boundaries() {
    let fps = Fps::NTSC_60.as_f64();
    let mut sw = ZoomSwitcher::new(vec![1, 1], 1000.0, None).unwrap();
    let a = sw.compute_index(FrameIndex(0), fps);
    let b = sw.compute_index(FrameIndex(59), fps);
    assert_eq!(a, b);
    // Frame 60 at 59.94 fps is past the one second mark.
    assert_ne!(sw.compute_index(FrameIndex(60), fps), a);
}

#[test]
fn override_wins_without_resetting_countdown() {
    fn first_three(second: i64, _duration: i64) -> Option<usize> {
        (second < 3).then_some(usize::MAX)
    }
    let mut sw = ZoomSwitcher::new(vec![5, 5, 5, 60], 1000.0, Some(first_three)).unwrap();
    let seq = walk(&mut sw, 6, 1.0);
    // Forced to the last level, which then stays until the running countdown ends.
    assert_eq!(seq, vec![3, 3, 3, 3, 3, 0]);
}

#[test]
fn override_index_is_clamped() {
    fn pick_one(_s: i64, _d: i64) -> Option<usize> {
        Some(1)
    }
    let mut sw = ZoomSwitcher::new(vec![5, 5, 5], 1000.0, Some(pick_one)).unwrap();
    assert_eq!(sw.compute_index(FrameIndex(0), 1.0), 1);
}

#[test]
fn single_level_ignores_override() {
    let mut sw = ZoomSwitcher::new(vec![3], 10.0, Some(default_zoom_override)).unwrap();
    let seq = walk(&mut sw, 10, 1.0);
    assert!(seq.iter().all(|&i| i == 0));
}

#[test]
fn default_override_windows() {
    assert_eq!(default_zoom_override(50, 100), Some(usize::MAX));
    assert_eq!(default_zoom_override(0, 600), Some(usize::MAX));
    assert_eq!(default_zoom_override(19, 600), Some(usize::MAX));
    assert_eq!(default_zoom_override(20, 600), None);
    assert_eq!(default_zoom_override(560, 600), None);
    assert_eq!(default_zoom_override(561, 600), Some(usize::MAX));
}

#[test]
fn default_schedule_on_long_segment() {
    let mut sw =
        ZoomSwitcher::from_levels(&DEFAULT_ZOOM_LEVELS, 600.0, Some(default_zoom_override))
            .unwrap();
    let seq = walk(&mut sw, 600, 1.0);
    assert!(seq[..20].iter().all(|&i| i == 3));
    assert!(seq[561..].iter().all(|&i| i == 3));
    // Every level shows up in the middle part.
    for level in 0..4 {
        assert!(seq[20..561].contains(&level), "level {level} never shown");
    }
}

#[test]
fn assign_writes_zoom_index_per_sample() {
    let mut samples = vec![Sample::default(); 12];
    let mut sw = ZoomSwitcher::new(vec![2, 2], 1000.0, None).unwrap();
    sw.assign(&mut samples, 2.0);
    let got: Vec<usize> = samples.iter().map(|s| s.zoom_index).collect();
    assert_eq!(got, vec![0, 0, 0, 0, 1, 1, 1, 1, 0, 0, 0, 0]);
}

#[test]
fn rejects_empty_or_zero_durations() {
    assert!(ZoomSwitcher::new(vec![], 0.0, None).is_err());
    assert!(ZoomSwitcher::new(vec![5, 0], 0.0, None).is_err());
}

struct Fill(u8);

impl FrameGenerator for Fill {
    fn generate(
        &mut self,
        frame: &mut FrameRGBA,
        _state: &Sample,
        _index: FrameIndex,
        _fps: Fps,
    ) -> GpsMapResult<()> {
        frame.data.fill(self.0);
        Ok(())
    }
}

#[test]
fn map_switcher_dispatches_on_zoom_index() {
    let levels: Vec<Box<dyn FrameGenerator>> = vec![Box::new(Fill(1)), Box::new(Fill(2))];
    let mut ms = MapSwitcher::new(levels);
    let mut frame = FrameRGBA::new(2, 2);
    let state = Sample {
        zoom_index: 1,
        ..Sample::default()
    };
    ms.generate(&mut frame, &state, FrameIndex(0), Fps::NTSC_60)
        .unwrap();
    assert!(frame.data.iter().all(|&b| b == 2));

    let bad = Sample {
        zoom_index: 2,
        ..Sample::default()
    };
    assert!(
        ms.generate(&mut frame, &bad, FrameIndex(0), Fps::NTSC_60)
            .is_err()
    );
}
