//! Metadata of the recorded videos the map is synchronized with.

pub mod metadata;
/// `ffprobe` wrapper.
pub mod probe;

pub use metadata::{
    VideoInfo, VideoInfoDoc, VideoSegmentsDoc, compute_map_segments,
    compute_map_segments_with_gpx, parse_file_ids, read_json, window_from_timestamps, write_json,
};
pub use probe::{parse_probe_output, probe_video, probe_videos};
