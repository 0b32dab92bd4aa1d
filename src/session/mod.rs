//! A render run: planning output videos, encoding them on a worker pool, reporting progress.

/// Whole render runs.
pub mod pipeline;
/// Output video planning.
pub mod plan;
pub mod runner;
/// Progress reporting.
pub mod stats;
/// Time label videos.
pub mod timecode;

use crate::foundation::core::{Canvas, Fps};
use crate::render::map::DEFAULT_ARROW_MIN_ZOOM;
use crate::render::switcher::{DEFAULT_ZOOM_LEVELS, ZoomLevelConfig};

pub use pipeline::{LoadedTrack, RenderInputs, load_track, plan_jobs, render};
pub use plan::{
    ConcatList, EncodingJob, JobPlan, plan_match_external, plan_parallel, plan_per_segment,
};
pub use runner::{
    DefaultGenerators, FfmpegSinks, GeneratorFactory, ResourceBundle, RunReport, SinkFactory,
    encode_job, precompute_zoom, run_jobs, worker_count,
};
pub use stats::{FrameCounter, StatsPrinter, progress_line};
pub use timecode::{
    TimecodeJob, plan_timecodes, render_timecode, run_timecodes, timecode_path,
};

/// How track segments are cut into output videos.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum EncodeMode {
    /// One video per window of the video metadata document, split into chunks of at most
    /// [`RunOpts::chunk_secs`].
    #[default]
    MatchExternal,
    /// One video per track segment.
    PerSegment,
    /// Each segment split into near-equal parts so every worker stays busy, with an ffmpeg
    /// concat list per segment.
    Parallel,
}

/// Options controlling a render run.
#[derive(Clone, Debug)]
pub struct RunOpts {
    /// Output frame size.
    pub canvas: Canvas,
    /// Output and track resampling rate.
    pub fps: Fps,
    /// Override the number of rayon worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Longest video produced when matching external videos, in seconds.
    pub chunk_secs: u32,
    /// Zoom cycle shown by every video.
    pub zoom_levels: Vec<ZoomLevelConfig>,
    /// Zoom from which the position marker becomes a heading arrow.
    pub arrow_min_zoom: u32,
    pub mode: EncodeMode,
}

impl Default for RunOpts {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 512,
                height: 512,
            },
            fps: Fps::NTSC_60,
            threads: None,
            chunk_secs: 300,
            zoom_levels: DEFAULT_ZOOM_LEVELS.to_vec(),
            arrow_min_zoom: DEFAULT_ARROW_MIN_ZOOM,
            mode: EncodeMode::default(),
        }
    }
}

impl RunOpts {
    /// Frames in one chunk of [`RunOpts::chunk_secs`], truncated.
    pub fn chunk_frames(&self) -> u64 {
        (self.fps.as_f64() * f64::from(self.chunk_secs)) as u64
    }
}
