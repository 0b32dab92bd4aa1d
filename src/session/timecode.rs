use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{FrameIndex, Rgba8Premul};
use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::render::frame::FrameRGBA;
use crate::render::generator::FrameGenerator;
use crate::render::label::{LABEL_HEIGHT, TimeLabelGenerator};
use crate::session::runner::{RunReport, SinkFactory};
use crate::session::stats::FrameCounter;
use crate::track::Sample;
use crate::video::VideoInfo;

pub const TIMECODE_WIDTH: u32 = 512;

/// A time label video matching one recorded video frame for frame.
#[derive(Clone, Debug)]
pub struct TimecodeJob {
    pub video: VideoInfo,
    pub out_path: PathBuf,
}

/// `<out_dir>/<video file name>.TC.MOV`.
pub fn timecode_path(out_dir: &Path, video: &VideoInfo) -> PathBuf {
    let name = video
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    out_dir.join(format!("{name}.TC.MOV"))
}

/// Render `video.frame_count` frames at the video's rate, each showing the whole second of
/// recording time it belongs to.
pub fn render_timecode(
    video: &VideoInfo,
    label: &mut dyn FrameGenerator,
    sink: &mut dyn FrameSink,
    counter: &FrameCounter,
) -> GpsMapResult<u64> {
    let start = video.start.ok_or_else(|| {
        GpsMapError::validation(format!(
            "video '{}' has no start time",
            video.path.display()
        ))
    })?;
    let cfg = SinkConfig {
        width: TIMECODE_WIDTH,
        height: LABEL_HEIGHT,
        fps: video.fps,
    };
    sink.begin(cfg)?;

    let mut frame = FrameRGBA::new(cfg.width, cfg.height);
    let mut state = Sample::default();
    let result = (|| -> GpsMapResult<()> {
        for i in 0..video.frame_count {
            let idx = FrameIndex(i);
            state.timestamp = (start as u64).saturating_add(video.fps.elapsed_second(idx)) as f64;
            frame.clear(Rgba8Premul::transparent());
            label.generate(&mut frame, &state, idx, video.fps)?;
            sink.push_frame(idx, &frame)?;
            counter.add(1);
        }
        Ok(())
    })();
    let ended = sink.end();
    result?;
    ended?;
    Ok(video.frame_count)
}

/// Timecode jobs for every video with a known start; the others are skipped with a warning.
pub fn plan_timecodes(videos: &[VideoInfo], out_dir: &Path) -> Vec<TimecodeJob> {
    videos
        .iter()
        .filter(|v| {
            if v.start.is_none() {
                tracing::warn!(path = %v.path.display(), "no start time, skipping timecode");
            }
            v.start.is_some()
        })
        .map(|v| TimecodeJob {
            video: v.clone(),
            out_path: timecode_path(out_dir, v),
        })
        .collect()
}

/// Render timecode videos in parallel on the current rayon pool.
pub fn run_timecodes(
    jobs: &[TimecodeJob],
    font_bytes: &[u8],
    sinks: &dyn SinkFactory,
    counter: &FrameCounter,
) -> RunReport {
    let results: Vec<(PathBuf, GpsMapResult<u64>)> = jobs
        .par_iter()
        .map(|job| {
            tracing::info!(path = %job.out_path.display(), "encoding timecode");
            let res = TimeLabelGenerator::new(font_bytes).and_then(|mut label| {
                let mut sink = sinks.create(&job.out_path)?;
                render_timecode(&job.video, &mut label, sink.as_mut(), counter)
            });
            (job.out_path.clone(), res)
        })
        .collect();

    let mut report = RunReport::default();
    for (path, res) in results {
        match res {
            Ok(frames) => {
                report.frames += frames;
                report.written.push(path);
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "timecode failed");
                report.failed.push(path);
            }
        }
    }
    report
}
