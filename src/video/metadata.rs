use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::foundation::core::Fps;
use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::track::GpxInfo;

/// One recorded video file, or several consecutive files merged into one map segment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VideoInfoRecord", into = "VideoInfoRecord")]
pub struct VideoInfo {
    pub path: PathBuf,
    /// Recording the file belongs to.
    pub file_id: u32,
    /// Position of the file inside its recording.
    pub file_seq: u32,
    pub fps: Fps,
    pub frame_count: u64,
    /// Unix seconds of the first frame, once known.
    pub start: Option<i64>,
    /// Seconds, once known.
    pub duration: Option<f64>,
}

impl VideoInfo {
    pub fn new(path: impl Into<PathBuf>, fps: Fps, frame_count: u64) -> Self {
        Self {
            path: path.into(),
            file_id: 0,
            file_seq: 0,
            fps,
            frame_count,
            start: None,
            duration: None,
        }
    }

    /// Length derived from the frame count.
    pub fn frames_duration(&self) -> f64 {
        self.fps.frames_to_secs(self.frame_count)
    }

    /// The GPS window covered by this video, if its start is known.
    pub fn window(&self) -> Option<GpxInfo> {
        Some(GpxInfo {
            start: self.start?,
            duration: self.duration.unwrap_or_else(|| self.frames_duration()),
        })
    }
}

#[derive(Serialize, Deserialize)]
struct VideoInfoRecord {
    path: PathBuf,
    file_id: u32,
    file_seq: u32,
    #[serde(default, skip_deserializing)]
    frame_rate: f64,
    frame_rate_num: u32,
    frame_rate_den: u32,
    frame_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
}

impl TryFrom<VideoInfoRecord> for VideoInfo {
    type Error = GpsMapError;

    fn try_from(r: VideoInfoRecord) -> GpsMapResult<Self> {
        let fps = Fps::new(r.frame_rate_num, r.frame_rate_den).map_err(|e| {
            GpsMapError::parse(format!("invalid frame rate for '{}': {e}", r.path.display()))
        })?;
        Ok(Self {
            path: r.path,
            file_id: r.file_id,
            file_seq: r.file_seq,
            fps,
            frame_count: r.frame_count,
            start: r.start,
            duration: r.duration,
        })
    }
}

impl From<VideoInfo> for VideoInfoRecord {
    fn from(v: VideoInfo) -> Self {
        Self {
            frame_rate: v.fps.as_f64(),
            path: v.path,
            file_id: v.file_id,
            file_seq: v.file_seq,
            frame_rate_num: v.fps.num,
            frame_rate_den: v.fps.den,
            frame_count: v.frame_count,
            start: v.start,
            duration: v.duration,
        }
    }
}

/// `{"segments": [...]}`: videos aligned with GPS time, input of the render and timecode runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoSegmentsDoc {
    pub segments: Vec<VideoInfo>,
}

/// `{"video_info": [...], "gpx_info": [...]}`: probed videos with the GPS windows recorded
/// alongside them, one window per video.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfoDoc {
    pub video_info: Vec<VideoInfo>,
    pub gpx_info: Vec<GpxInfo>,
}

#[derive(Deserialize)]
struct TimestampRecord {
    timestamp: i64,
}

/// Read a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> GpsMapResult<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&text)
        .map_err(|e| GpsMapError::serde(format!("invalid JSON in '{}': {e}", path.display())))
}

/// Write a pretty-printed JSON document, followed by a newline.
pub fn write_json<T: Serialize>(path: &Path, doc: &T) -> GpsMapResult<()> {
    let mut text = serde_json::to_string_pretty(doc)?;
    text.push('\n');
    std::fs::write(path, text).with_context(|| format!("failed to write '{}'", path.display()))?;
    tracing::info!(path = %path.display(), "wrote JSON");
    Ok(())
}

/// File id and sequence from a `GX-<id>-<seq>` file stem.
pub fn parse_file_ids(path: &Path) -> Option<(u32, u32)> {
    let stem = path.file_stem()?.to_str()?;
    let rest = stem.strip_prefix("GX-")?;
    let (id, seq) = rest.split_once('-')?;
    let seq_digits = seq
        .find(|c: char| !c.is_ascii_digit())
        .map_or(seq, |end| &seq[..end]);
    Some((id.parse().ok()?, seq_digits.parse().ok()?))
}

/// GPS window from a JSON array of `{"timestamp": <unix seconds>}` fixes.
pub fn window_from_timestamps(json: &str) -> GpsMapResult<GpxInfo> {
    let records: Vec<TimestampRecord> = serde_json::from_str(json)?;
    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return Err(GpsMapError::data("no timestamps in GPS metadata"));
    };
    Ok(GpxInfo {
        start: first.timestamp,
        duration: (last.timestamp - first.timestamp) as f64,
    })
}

/// Merge consecutive files of each recording into one segment.
///
/// Files of one recording must have consecutive sequence numbers and the same frame rate. Merged
/// frame counts add up; the duration runs from the first file's start to the last file's end.
pub fn compute_map_segments(videos: &[VideoInfo]) -> GpsMapResult<Vec<VideoInfo>> {
    let windows = videos
        .iter()
        .map(|v| {
            v.window().ok_or_else(|| {
                GpsMapError::validation(format!(
                    "video '{}' has no start time",
                    v.path.display()
                ))
            })
        })
        .collect::<GpsMapResult<Vec<_>>>()?;
    merge_runs(videos, &windows)
}

/// Like [`compute_map_segments`], taking start and duration from `windows[i]` for `videos[i]`.
pub fn compute_map_segments_with_gpx(
    videos: &[VideoInfo],
    windows: &[GpxInfo],
) -> GpsMapResult<Vec<VideoInfo>> {
    if videos.len() != windows.len() {
        return Err(GpsMapError::validation(format!(
            "videos and GPS windows must match ({} videos, {} windows)",
            videos.len(),
            windows.len()
        )));
    }
    merge_runs(videos, windows)
}

fn merge_runs(videos: &[VideoInfo], windows: &[GpxInfo]) -> GpsMapResult<Vec<VideoInfo>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < videos.len() {
        let mut merged = videos[i].clone();
        let start = windows[i].start;
        merged.start = Some(start);
        merged.duration = Some(windows[i].duration);

        let mut seq = merged.file_seq;
        let mut j = i + 1;
        while j < videos.len() && videos[j].file_id == merged.file_id {
            let next = &videos[j];
            if next.file_seq != seq + 1 {
                return Err(GpsMapError::validation(format!(
                    "file {} of recording {} follows sequence {seq}",
                    next.file_seq, next.file_id
                )));
            }
            if next.fps != merged.fps {
                return Err(GpsMapError::validation(format!(
                    "all files of recording {} must share one frame rate",
                    merged.file_id
                )));
            }
            merged.frame_count += next.frame_count;
            merged.duration = Some((windows[j].start - start) as f64 + windows[j].duration);
            seq = next.file_seq;
            j += 1;
        }

        tracing::debug!(
            file_id = merged.file_id,
            files = j - i,
            frames = merged.frame_count,
            "merged recording"
        );
        out.push(merged);
        i = j;
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/video/metadata.rs"]
mod tests;
