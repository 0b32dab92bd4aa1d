use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::foundation::core::Fps;
use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::video::metadata::{VideoInfo, parse_file_ids};

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Deserialize)]
struct ProbeStream {
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    #[serde(default)]
    tags: ProbeTags,
}

#[derive(Default, Deserialize)]
struct ProbeTags {
    creation_time: Option<String>,
}

/// Frame rate, frame count and file ids of a video file, read with `ffprobe`.
pub fn probe_video(path: &Path) -> GpsMapResult<VideoInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=nb_frames,r_frame_rate:stream_tags=creation_time",
            "-print_format",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| GpsMapError::encode(format!("failed to run ffprobe: {e}")))?;
    if !output.status.success() {
        return Err(GpsMapError::encode(format!(
            "ffprobe failed on '{}': {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    let json = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(path, &json)?;
    tracing::info!(
        path = %path.display(),
        file_id = info.file_id,
        file_seq = info.file_seq,
        frames = info.frame_count,
        fps = info.fps.as_f64(),
        duration = info.frames_duration(),
        "probed video"
    );
    Ok(info)
}

/// Probe several files in order.
pub fn probe_videos(paths: &[PathBuf]) -> GpsMapResult<Vec<VideoInfo>> {
    paths.iter().map(|p| probe_video(p.as_path())).collect()
}

/// Build a [`VideoInfo`] from `ffprobe -print_format json` output for `path`.
pub fn parse_probe_output(path: &Path, json: &str) -> GpsMapResult<VideoInfo> {
    let out: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| GpsMapError::parse(format!("invalid ffprobe output: {e}")))?;
    let stream = out.streams.into_iter().next().ok_or_else(|| {
        GpsMapError::parse(format!("no video stream in '{}'", path.display()))
    })?;

    let rate = stream
        .r_frame_rate
        .ok_or_else(|| GpsMapError::parse("ffprobe reported no frame rate"))?;
    let fps = Fps::parse(&rate)?;
    let frame_count = match stream.nb_frames.as_deref() {
        Some(n) => n
            .trim()
            .parse::<u64>()
            .map_err(|e| GpsMapError::parse(format!("invalid frame count '{n}': {e}")))?,
        None => return Err(GpsMapError::parse("ffprobe reported no frame count")),
    };
    if let Some(created) = stream.tags.creation_time.as_deref() {
        tracing::debug!(path = %path.display(), created, "video creation time");
    }

    let mut info = VideoInfo::new(path, fps, frame_count);
    match parse_file_ids(path) {
        Some((id, seq)) => {
            info.file_id = id;
            info.file_seq = seq;
        }
        None => tracing::warn!(
            path = %path.display(),
            "file name is not GX-<id>-<seq>, using id 0 and sequence 0"
        ),
    }
    Ok(info)
}
