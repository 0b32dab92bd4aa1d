use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gpsmap::session::{FfmpegSinks, FrameCounter, plan_timecodes, run_timecodes};
use gpsmap::track::Track;
use gpsmap::video::{
    VideoInfoDoc, VideoSegmentsDoc, compute_map_segments, compute_map_segments_with_gpx,
    probe_video, probe_videos, read_json, window_from_timestamps, write_json,
};
use gpsmap::{EncodeMode, RenderInputs, RunOpts, RunReport};

#[derive(Parser, Debug)]
#[command(name = "gpsmap", version)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render map videos for GPX tracks (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Probe recorded videos and write their metadata document.
    VideoInfo(VideoInfoArgs),
    /// Merge the files of each recording into map segments.
    MapSegments(MapSegmentsArgs),
    /// Render time label videos matching recorded videos.
    Timecode(TimecodeArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input GPX file; repeat for multi-file trips.
    #[arg(long = "gpx", required = true)]
    gpx: Vec<PathBuf>,

    /// Resource directory (marker images, font, map descriptor).
    #[arg(long)]
    resources: PathBuf,

    /// Tile cache directory, created when missing.
    #[arg(long)]
    tiles: PathBuf,

    /// Output directory; must exist.
    #[arg(long)]
    out_dir: PathBuf,

    /// How tracks are cut into videos.
    #[arg(long, value_enum, default_value_t = EncodeMode::MatchExternal)]
    mode: EncodeMode,

    /// `{"segments": [...]}` document of the recorded videos (match-external mode).
    #[arg(long)]
    video_segments: Option<PathBuf>,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Longest video in match-external mode, in seconds.
    #[arg(long, default_value_t = 300)]
    chunk_secs: u32,
}

#[derive(Parser, Debug)]
struct VideoInfoArgs {
    /// Recorded video, named `GX-<id>-<seq>`; repeat in recording order.
    #[arg(long = "video", required = true)]
    videos: Vec<PathBuf>,

    /// GPX file recorded with the videos; every track segment is one video's window.
    #[arg(long = "gpx", conflicts_with = "gps_json")]
    gpx: Vec<PathBuf>,

    /// JSON array of `{"timestamp": ..}` fixes per video, in the same order as `--video`.
    /// Writes merged map segments directly.
    #[arg(long = "gps-json")]
    gps_json: Vec<PathBuf>,

    /// Output JSON path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct MapSegmentsArgs {
    /// `{"video_info": [...], "gpx_info": [...]}` document.
    input: PathBuf,
    /// Output `{"segments": [...]}` document.
    output: PathBuf,
}

#[derive(Parser, Debug)]
struct TimecodeArgs {
    /// `{"segments": [...]}` document.
    segments: PathBuf,
    /// Output directory.
    out_dir: PathBuf,
    /// Font used for the labels.
    #[arg(long)]
    font: PathBuf,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let report = match cli.cmd {
        Command::Render(args) => cmd_render(args)?,
        Command::VideoInfo(args) => {
            cmd_video_info(args)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::MapSegments(args) => {
            cmd_map_segments(args)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::Timecode(args) => cmd_timecode(args)?,
    };

    if report.is_success() {
        eprintln!("wrote {} files", report.written.len());
        return Ok(ExitCode::SUCCESS);
    }
    eprintln!("Encoding failed for these files:");
    for f in &report.failed {
        eprintln!("{}", f.display());
    }
    Ok(ExitCode::FAILURE)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<RunReport> {
    std::fs::create_dir_all(&args.tiles)
        .with_context(|| format!("create tile dir '{}'", args.tiles.display()))?;
    let opts = RunOpts {
        threads: args.threads,
        chunk_secs: args.chunk_secs,
        mode: args.mode,
        ..RunOpts::default()
    };
    let inputs = RenderInputs {
        gpx_paths: args.gpx,
        resource_dir: args.resources,
        tiles_dir: args.tiles,
        output_dir: args.out_dir,
        video_segments: args.video_segments,
    };
    Ok(gpsmap::session::render(&inputs, &opts)?)
}

fn cmd_video_info(args: VideoInfoArgs) -> anyhow::Result<()> {
    if !args.gps_json.is_empty() {
        if args.gps_json.len() != args.videos.len() {
            bail!("--gps-json must be given once per --video");
        }
        let mut videos = Vec::with_capacity(args.videos.len());
        for (video, json) in args.videos.iter().zip(&args.gps_json) {
            let mut info = probe_video(video)?;
            let text = std::fs::read_to_string(json)
                .with_context(|| format!("read '{}'", json.display()))?;
            let window = window_from_timestamps(&text)
                .with_context(|| format!("GPS metadata '{}'", json.display()))?;
            info.start = Some(window.start);
            info.duration = Some(window.duration);
            videos.push(info);
        }
        let doc = VideoSegmentsDoc {
            segments: compute_map_segments(&videos)?,
        };
        write_json(&args.out, &doc)?;
        return Ok(());
    }

    if args.gpx.is_empty() {
        bail!("either --gpx or --gps-json is required");
    }
    let video_info = probe_videos(&args.videos)?;
    let gpx_info = gpx_windows(&args.gpx)?;
    if video_info.len() != gpx_info.len() {
        bail!(
            "videos and GPX segments must match ({} videos, {} segments)",
            video_info.len(),
            gpx_info.len()
        );
    }
    write_json(
        &args.out,
        &VideoInfoDoc {
            video_info,
            gpx_info,
        },
    )?;
    Ok(())
}

/// One window per track segment of each GPX file, without resampling.
fn gpx_windows(paths: &[PathBuf]) -> anyhow::Result<Vec<gpsmap::track::GpxInfo>> {
    let mut out = Vec::new();
    for path in paths {
        let track = Track::load_from_file(path, 0.0, 0.0)?;
        for seg in track.segments() {
            let info = seg
                .info()
                .with_context(|| format!("empty segment in '{}'", path.display()))?;
            tracing::info!(
                path = %path.display(),
                start = %gpsmap::track::format_timestamp(info.start as f64),
                duration = info.duration,
                "GPS window"
            );
            out.push(info);
        }
    }
    Ok(out)
}

fn cmd_map_segments(args: MapSegmentsArgs) -> anyhow::Result<()> {
    let doc: VideoInfoDoc = read_json(&args.input)?;
    let segments = compute_map_segments_with_gpx(&doc.video_info, &doc.gpx_info)?;
    write_json(&args.output, &VideoSegmentsDoc { segments })?;
    Ok(())
}

fn cmd_timecode(args: TimecodeArgs) -> anyhow::Result<RunReport> {
    let doc: VideoSegmentsDoc = read_json(&args.segments)?;
    ensure_dir(&args.out_dir)?;
    let font = std::fs::read(&args.font)
        .with_context(|| format!("read font '{}'", args.font.display()))?;
    let jobs = plan_timecodes(&doc.segments, &args.out_dir);
    Ok(run_timecodes(&jobs, &font, &FfmpegSinks, &FrameCounter::new()))
}

fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    if !path.is_dir() {
        bail!("'{}' is not a directory", path.display());
    }
    Ok(())
}
