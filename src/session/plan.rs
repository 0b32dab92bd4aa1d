use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;

use crate::foundation::core::FrameRange;
use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::track::{Sample, Segment, format_timestamp, segment_range};
use crate::video::VideoInfo;

/// One output video: `frame_count` consecutive samples of `segment`, one per frame.
#[derive(Clone, Debug)]
pub struct EncodingJob {
    pub segment: Arc<Segment>,
    /// First number of the file name (recording id, or segment number).
    pub file_seq: u32,
    /// Second number of the file name (chunk inside the recording or segment).
    pub seg_seq: u32,
    pub start_frame: usize,
    pub frame_count: usize,
}

impl EncodingJob {
    /// Sample shown on the first frame.
    pub fn first_sample(&self) -> Option<&Sample> {
        self.segment.get(self.start_frame)
    }

    /// Sample shown on frame `index` of this video.
    pub fn sample(&self, index: usize) -> Option<&Sample> {
        if index >= self.frame_count {
            return None;
        }
        self.segment.get(self.start_frame + index)
    }

    /// `"{file:03}-{seg:03} - {first sample time}.mp4"`, with `:` replaced by `-`.
    pub fn file_name(&self) -> GpsMapResult<String> {
        let first = self.first_sample().ok_or_else(|| {
            GpsMapError::validation(format!(
                "job {:03}-{:03} starts past the end of its segment",
                self.file_seq, self.seg_seq
            ))
        })?;
        let time = format_timestamp(first.timestamp).replace(':', "-");
        Ok(format!("{:03}-{:03} - {time}.mp4", self.file_seq, self.seg_seq))
    }

    /// Duration in seconds of the track covered by this video.
    pub fn track_duration(&self) -> f64 {
        match (self.first_sample(), self.sample(self.frame_count.saturating_sub(1))) {
            (Some(a), Some(b)) => b.timestamp - a.timestamp,
            _ => 0.0,
        }
    }
}

/// An ffmpeg concat demuxer list joining the parts of one segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConcatList {
    /// File name of the list, `"{first part}.lst"`.
    pub name: String,
    /// Part file names in playback order.
    pub files: Vec<String>,
}

impl ConcatList {
    pub fn contents(&self) -> String {
        self.files
            .iter()
            .map(|f| format!("file '{f}'\n"))
            .collect()
    }

    /// Write the list into `dir`.
    pub fn write(&self, dir: &Path) -> GpsMapResult<PathBuf> {
        let path = dir.join(&self.name);
        std::fs::write(&path, self.contents())
            .with_context(|| format!("failed to write concat list '{}'", path.display()))?;
        Ok(path)
    }
}

/// Jobs of a run, plus the concat lists to write next to their outputs.
#[derive(Clone, Debug, Default)]
pub struct JobPlan {
    pub jobs: Vec<EncodingJob>,
    pub concat_lists: Vec<ConcatList>,
}

impl JobPlan {
    pub fn total_frames(&self) -> u64 {
        self.jobs.iter().map(|j| j.frame_count as u64).sum()
    }

    /// Write every concat list into `dir`.
    pub fn write_concat_lists(&self, dir: &Path) -> GpsMapResult<Vec<PathBuf>> {
        self.concat_lists.iter().map(|l| l.write(dir)).collect()
    }
}

fn chunked_jobs(
    segment: &Arc<Segment>,
    file_seq: u32,
    range: FrameRange,
    max_frames: u64,
) -> Vec<EncodingJob> {
    range
        .chunks(max_frames)
        .into_iter()
        .enumerate()
        .map(|(chunk, r)| EncodingJob {
            segment: Arc::clone(segment),
            file_seq,
            seg_seq: chunk as u32,
            start_frame: r.start as usize,
            frame_count: r.len_frames() as usize,
        })
        .collect()
}

/// One video per non-empty segment, numbered `000-<segment>`.
pub fn plan_per_segment(segments: &[Arc<Segment>]) -> JobPlan {
    let jobs = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_empty())
        .map(|(i, s)| EncodingJob {
            segment: Arc::clone(s),
            file_seq: 0,
            seg_seq: i as u32,
            start_frame: 0,
            frame_count: s.len(),
        })
        .collect();
    JobPlan {
        jobs,
        concat_lists: Vec::new(),
    }
}

/// Split every segment into parts of `total frames / workers` frames, numbered
/// `<segment>-<part>`, with one concat list per segment.
pub fn plan_parallel(segments: &[Arc<Segment>], workers: usize) -> GpsMapResult<JobPlan> {
    if workers == 0 {
        return Err(GpsMapError::validation("parallel planning needs at least one worker"));
    }
    let total: u64 = segments.iter().map(|s| s.len() as u64).sum();
    let per_job = (total / workers as u64).max(1);

    let mut plan = JobPlan::default();
    for (i, seg) in segments.iter().enumerate().filter(|(_, s)| !s.is_empty()) {
        let jobs = chunked_jobs(seg, i as u32, FrameRange::with_len(0, seg.len() as u64), per_job);
        let files = jobs
            .iter()
            .map(EncodingJob::file_name)
            .collect::<GpsMapResult<Vec<_>>>()?;
        plan.concat_lists.push(ConcatList {
            name: format!("{}.lst", files[0]),
            files,
        });
        plan.jobs.extend(jobs);
    }
    Ok(plan)
}

/// One video per external recording, covering the samples of its GPS window and split into
/// chunks of at most `chunk_frames`. Recordings without matching track data are skipped.
pub fn plan_match_external(
    segments: &[Arc<Segment>],
    videos: &[VideoInfo],
    chunk_frames: u64,
) -> JobPlan {
    let mut plan = JobPlan::default();
    for vi in videos {
        let Some(window) = vi.window() else {
            tracing::warn!(path = %vi.path.display(), "video has no start time, skipping");
            continue;
        };
        let Some(range) = segment_range(segments, window.start as f64, window.duration) else {
            tracing::warn!(
                file_id = vi.file_id,
                start = %format_timestamp(window.start as f64),
                "no matching track data for video"
            );
            continue;
        };

        let available = (range.segment.len() - range.start_index) as u64;
        let frames = vi.frame_count.min(available);
        let jobs = chunked_jobs(
            &range.segment,
            vi.file_id,
            FrameRange::with_len(range.start_index as u64, frames),
            chunk_frames,
        );
        tracing::debug!(file_id = vi.file_id, frames, chunks = jobs.len(), "matched video");
        plan.jobs.extend(jobs);
    }
    plan
}

#[cfg(test)]
#[path = "../../tests/unit/session/plan.rs"]
mod tests;
