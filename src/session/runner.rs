use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex, Rgba8Premul};
use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::render::frame::FrameRGBA;
use crate::render::generator::FrameGenerator;
use crate::render::label::LabelGenerator;
use crate::render::map::{MapImageGenerator, MapParams, Marker};
use crate::render::resources::Resources;
use crate::render::switcher::{MapSwitcher, ZoomLevelConfig, ZoomSwitcher, default_zoom_override};
use crate::session::RunOpts;
use crate::session::plan::EncodingJob;
use crate::session::stats::FrameCounter;
use crate::tiles::TileCache;
use crate::track::Segment;

/// Read-only inputs shared by every job of a run.
#[derive(Clone, Debug)]
pub struct ResourceBundle {
    pub whole_track: Arc<Segment>,
    pub tiles: Arc<TileCache>,
    pub resources: Arc<Resources>,
    /// Start and finish pins of the whole track.
    pub markers: Arc<[Marker]>,
    pub output_dir: PathBuf,
    pub canvas: Canvas,
    pub fps: Fps,
    pub zoom_levels: Vec<ZoomLevelConfig>,
    pub arrow_min_zoom: u32,
}

impl ResourceBundle {
    pub fn new(
        whole_track: Arc<Segment>,
        tiles: Arc<TileCache>,
        resources: Arc<Resources>,
        output_dir: impl Into<PathBuf>,
        opts: &RunOpts,
    ) -> GpsMapResult<Self> {
        let (Some(first), Some(last)) = (whole_track.first(), whole_track.last()) else {
            return Err(GpsMapError::data("the track holds no samples"));
        };
        if opts.zoom_levels.is_empty() {
            return Err(GpsMapError::validation("at least one zoom level is required"));
        }
        let markers: Arc<[Marker]> = vec![
            Marker::start(Arc::clone(resources.start_pin()), first),
            Marker::finish(Arc::clone(resources.finish_pin()), last),
        ]
        .into();
        Ok(Self {
            markers,
            whole_track,
            tiles,
            resources,
            output_dir: output_dir.into(),
            canvas: opts.canvas,
            fps: opts.fps,
            zoom_levels: opts.zoom_levels.clone(),
            arrow_min_zoom: opts.arrow_min_zoom,
        })
    }

    pub fn map_params(&self) -> MapParams {
        MapParams {
            whole_track: Arc::clone(&self.whole_track),
            tiles: Arc::clone(&self.tiles),
            resources: Arc::clone(&self.resources),
            markers: Arc::clone(&self.markers),
            arrow_min_zoom: self.arrow_min_zoom,
        }
    }

    /// One map generator per configured zoom level, selected by each sample's zoom index.
    pub fn map_switcher(&self) -> MapSwitcher {
        let params = self.map_params();
        MapSwitcher::new(
            self.zoom_levels
                .iter()
                .map(|l| {
                    Box::new(MapImageGenerator::new(params.clone(), l.zoom))
                        as Box<dyn FrameGenerator>
                })
                .collect(),
        )
    }

    /// Map, then labels.
    pub fn default_generators(&self) -> GpsMapResult<Vec<Box<dyn FrameGenerator>>> {
        let map: Box<dyn FrameGenerator> = Box::new(self.map_switcher());
        let labels: Box<dyn FrameGenerator> =
            Box::new(LabelGenerator::new(self.resources.font_bytes())?);
        Ok(vec![map, labels])
    }

    fn sink_config(&self) -> SinkConfig {
        SinkConfig {
            width: self.canvas.width,
            height: self.canvas.height,
            fps: self.fps,
        }
    }
}

/// Store in every sample the zoom level its frame shows.
///
/// Frame `i` of a video shows sample `i` of its segment, and the schedule restarts with each
/// segment, sized by that segment's duration.
pub fn precompute_zoom(
    segments: &mut [Segment],
    levels: &[ZoomLevelConfig],
    fps: Fps,
) -> GpsMapResult<()> {
    for seg in segments {
        let mut switcher =
            ZoomSwitcher::from_levels(levels, seg.duration(), Some(default_zoom_override))?;
        switcher.assign(seg.samples_mut(), fps.as_f64());
    }
    Ok(())
}

/// Creates the sink receiving the frames of one output file.
pub trait SinkFactory: Sync {
    fn create(&self, path: &Path) -> GpsMapResult<Box<dyn FrameSink>>;
}

impl<F> SinkFactory for F
where
    F: Fn(&Path) -> GpsMapResult<Box<dyn FrameSink>> + Sync,
{
    fn create(&self, path: &Path) -> GpsMapResult<Box<dyn FrameSink>> {
        self(path)
    }
}

/// MP4 files encoded by `ffmpeg`.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegSinks;

impl SinkFactory for FfmpegSinks {
    fn create(&self, path: &Path) -> GpsMapResult<Box<dyn FrameSink>> {
        Ok(Box::new(FfmpegSink::new(FfmpegSinkOpts::new(path))))
    }
}

/// Creates the drawing stages of one job. Each job gets its own, so generator state (tile grids,
/// label strips, rasterizers) is never shared between workers.
pub trait GeneratorFactory: Sync {
    fn create(&self, bundle: &ResourceBundle) -> GpsMapResult<Vec<Box<dyn FrameGenerator>>>;
}

impl<F> GeneratorFactory for F
where
    F: Fn(&ResourceBundle) -> GpsMapResult<Vec<Box<dyn FrameGenerator>>> + Sync,
{
    fn create(&self, bundle: &ResourceBundle) -> GpsMapResult<Vec<Box<dyn FrameGenerator>>> {
        self(bundle)
    }
}

/// [`ResourceBundle::default_generators`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultGenerators;

impl GeneratorFactory for DefaultGenerators {
    fn create(&self, bundle: &ResourceBundle) -> GpsMapResult<Vec<Box<dyn FrameGenerator>>> {
        bundle.default_generators()
    }
}

/// Outcome of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Files written completely, in plan order.
    pub written: Vec<PathBuf>,
    /// Files whose encode failed, in plan order.
    pub failed: Vec<PathBuf>,
    pub frames: u64,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Render every frame of `job` through `generators` into `sink`.
///
/// The sink is finalized even when a frame fails, keeping the frames already written.
#[tracing::instrument(skip_all, fields(file_seq = job.file_seq, seg_seq = job.seg_seq))]
pub fn encode_job(
    job: &EncodingJob,
    cfg: SinkConfig,
    generators: &mut [Box<dyn FrameGenerator>],
    sink: &mut dyn FrameSink,
    counter: &FrameCounter,
) -> GpsMapResult<u64> {
    sink.begin(cfg)?;
    let mut frame = FrameRGBA::new(cfg.width, cfg.height);
    let mut rendered = 0u64;
    let result = (|| -> GpsMapResult<()> {
        for i in 0..job.frame_count {
            let state = job.sample(i).ok_or_else(|| {
                GpsMapError::render(format!("frame {i} is past the end of the segment"))
            })?;
            frame.clear(Rgba8Premul::transparent());
            let idx = FrameIndex(i as u64);
            for g in generators.iter_mut() {
                g.generate(&mut frame, state, idx, cfg.fps)?;
            }
            sink.push_frame(idx, &frame)?;
            counter.add(1);
            rendered += 1;
        }
        Ok(())
    })();
    let ended = sink.end();
    result?;
    ended?;
    Ok(rendered)
}

fn build_thread_pool(threads: Option<usize>) -> GpsMapResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(GpsMapError::validation("'threads' must be >= 1 when set"));
    }
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| GpsMapError::validation(format!("failed to build rayon thread pool: {e}")))
}

/// Number of workers a pool built for `threads` runs.
pub fn worker_count(threads: Option<usize>) -> usize {
    threads.unwrap_or_else(rayon::current_num_threads).max(1)
}

enum JobOutcome {
    Written(PathBuf),
    Failed(PathBuf),
}

/// Encode `jobs` on a pool of `threads` workers. A failing job is logged and reported in
/// [`RunReport::failed`]; the other jobs carry on.
pub fn run_jobs(
    bundle: &ResourceBundle,
    jobs: &[EncodingJob],
    threads: Option<usize>,
    generators: &dyn GeneratorFactory,
    sinks: &dyn SinkFactory,
    counter: &FrameCounter,
) -> GpsMapResult<RunReport> {
    let names = jobs
        .iter()
        .map(EncodingJob::file_name)
        .collect::<GpsMapResult<Vec<_>>>()?;
    let pool = build_thread_pool(threads)?;
    let cfg = bundle.sink_config();
    let start_frames = counter.get();

    let outcomes: Vec<JobOutcome> = pool.install(|| {
        jobs.par_iter()
            .zip(names.par_iter())
            .map(|(job, name)| {
                let path = bundle.output_dir.join(name);
                tracing::info!(path = %path.display(), frames = job.frame_count, "encoding");
                let res = generators.create(bundle).and_then(|mut gens| {
                    let mut sink = sinks.create(&path)?;
                    encode_job(job, cfg, &mut gens, sink.as_mut(), counter)
                });
                match res {
                    Ok(_) => JobOutcome::Written(path),
                    Err(e) => {
                        tracing::error!(path = %path.display(), error = %e, "encoding failed");
                        JobOutcome::Failed(path)
                    }
                }
            })
            .collect()
    });

    let mut report = RunReport {
        frames: counter.get() - start_frames,
        ..RunReport::default()
    };
    for o in outcomes {
        match o {
            JobOutcome::Written(p) => report.written.push(p),
            JobOutcome::Failed(p) => report.failed.push(p),
        }
    }
    Ok(report)
}

#[cfg(test)]
#[path = "../../tests/unit/session/runner.rs"]
mod tests;
