/// GPX parsing and multi-file loading.
pub mod gpx;
/// A single processed fix.
pub mod sample;
/// Segment algorithms: distances, bearing, grade, resampling and lookup.
pub mod segment;

pub use gpx::{Track, format_timestamp, load_segments, parse_timestamp};
pub use sample::Sample;
pub use segment::{GpxInfo, Segment, SegmentRange, merge_segments, segment_range};
