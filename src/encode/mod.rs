//! Video output: the frame sink contract and the `ffmpeg` MP4 sink.

/// `ffmpeg` child-process sink.
pub mod ffmpeg;
/// Frame sink trait and the in-memory sink.
pub mod sink;

pub use ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, is_ffmpeg_on_path};
pub use sink::{FrameSink, InMemorySink, SinkConfig};
