use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::render::resources::Resources;
use crate::session::plan::{JobPlan, plan_match_external, plan_parallel, plan_per_segment};
use crate::session::runner::{
    DefaultGenerators, FfmpegSinks, ResourceBundle, RunReport, precompute_zoom, run_jobs,
    worker_count,
};
use crate::session::stats::{FrameCounter, StatsPrinter};
use crate::session::{EncodeMode, RunOpts};
use crate::tiles::{HttpTileFetcher, TileCache};
use crate::track::{Segment, load_segments, merge_segments};
use crate::video::{VideoInfo, VideoSegmentsDoc, read_json};

/// Files and directories of a render run.
#[derive(Clone, Debug, Default)]
pub struct RenderInputs {
    /// GPX files of the trip; loaded in name order.
    pub gpx_paths: Vec<PathBuf>,
    pub resource_dir: PathBuf,
    pub tiles_dir: PathBuf,
    pub output_dir: PathBuf,
    /// `{"segments": [...]}` document, required by [`EncodeMode::MatchExternal`].
    pub video_segments: Option<PathBuf>,
}

/// Track segments ready to render, plus the whole trip as one segment.
#[derive(Clone, Debug)]
pub struct LoadedTrack {
    pub segments: Vec<Arc<Segment>>,
    pub whole_track: Arc<Segment>,
}

/// Load the trip resampled at the output rate, with zoom levels precomputed per sample.
pub fn load_track(gpx_paths: &[PathBuf], opts: &RunOpts) -> GpsMapResult<LoadedTrack> {
    if gpx_paths.is_empty() {
        return Err(GpsMapError::validation("at least one GPX file is required"));
    }
    let mut paths = gpx_paths.to_vec();
    paths.sort();
    let mut segments = load_segments(&paths, opts.fps.as_f64(), false)?;
    let whole_track = Arc::new(merge_segments(&segments));
    if whole_track.is_empty() {
        return Err(GpsMapError::data("the GPX files hold no usable track"));
    }
    precompute_zoom(&mut segments, &opts.zoom_levels, opts.fps)?;
    tracing::info!(
        segments = segments.len(),
        samples = whole_track.len(),
        "track loaded"
    );
    Ok(LoadedTrack {
        segments: segments.into_iter().map(Arc::new).collect(),
        whole_track,
    })
}

/// Cut the segments into output videos according to `opts.mode`.
pub fn plan_jobs(
    segments: &[Arc<Segment>],
    videos: Option<&[VideoInfo]>,
    opts: &RunOpts,
) -> GpsMapResult<JobPlan> {
    match opts.mode {
        EncodeMode::PerSegment => Ok(plan_per_segment(segments)),
        EncodeMode::Parallel => plan_parallel(segments, worker_count(opts.threads)),
        EncodeMode::MatchExternal => {
            let videos = videos.ok_or_else(|| {
                GpsMapError::validation("matching external videos needs a video segments document")
            })?;
            Ok(plan_match_external(segments, videos, opts.chunk_frames()))
        }
    }
}

/// Run a whole render: load resources and track, plan, encode with `ffmpeg`, and report.
///
/// Startup failures (resources, tile descriptor, track, metadata) are returned as errors before
/// any video is started; failures of individual videos end up in [`RunReport::failed`].
pub fn render(inputs: &RenderInputs, opts: &RunOpts) -> GpsMapResult<RunReport> {
    if !inputs.output_dir.is_dir() {
        return Err(GpsMapError::validation(format!(
            "output directory '{}' does not exist",
            inputs.output_dir.display()
        )));
    }
    let resources = Arc::new(Resources::load(&inputs.resource_dir)?);
    let fetcher = Arc::new(HttpTileFetcher::from_descriptor(resources.map_descriptor())?);
    let tiles = Arc::new(TileCache::new(&inputs.tiles_dir, fetcher)?);

    let videos = match (&inputs.video_segments, opts.mode) {
        (Some(path), EncodeMode::MatchExternal) => {
            Some(read_json::<VideoSegmentsDoc>(path)?.segments)
        }
        _ => None,
    };

    let track = load_track(&inputs.gpx_paths, opts)?;
    let bundle = ResourceBundle::new(
        Arc::clone(&track.whole_track),
        tiles,
        resources,
        &inputs.output_dir,
        opts,
    )?;
    let plan = plan_jobs(&track.segments, videos.as_deref(), opts)?;
    plan.write_concat_lists(&inputs.output_dir)?;
    tracing::info!(
        jobs = plan.jobs.len(),
        frames = plan.total_frames(),
        "encoding plan ready"
    );

    let counter = FrameCounter::new();
    let stats = StatsPrinter::spawn(counter.clone(), opts.fps, Duration::from_secs(1));
    let report = run_jobs(
        &bundle,
        &plan.jobs,
        opts.threads,
        &DefaultGenerators,
        &FfmpegSinks,
        &counter,
    );
    stats.stop();
    report
}
