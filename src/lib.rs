//! gpsmap renders a recorded GPS track into animated map overlay videos.
//!
//! - Load GPX files into resampled [`Segment`]s ([`track`])
//! - Fetch and cache slippy-map tiles ([`tiles`])
//! - Compose per-frame maps and labels through [`FrameGenerator`]s ([`render`])
//! - Plan output videos, possibly aligned to recorded footage ([`video`]), and encode them on a
//!   worker pool into a [`FrameSink`] ([`session`], [`encode`])
#![forbid(unsafe_code)]

mod foundation;

pub mod encode;
/// Geodesy and slippy-map projection.
pub mod geo;
pub mod render;
pub mod session;
pub mod tiles;
/// GPS track model.
pub mod track;
pub mod video;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange, Rgba8Premul};
pub use crate::foundation::error::{GpsMapError, GpsMapResult};

pub use crate::encode::{FfmpegSink, FfmpegSinkOpts, FrameSink, InMemorySink, SinkConfig};
pub use crate::render::{FrameGenerator, FrameRGBA};
pub use crate::session::{EncodeMode, RenderInputs, RunOpts, RunReport};
pub use crate::tiles::{TileCache, TileFetcher, TileKey};
pub use crate::track::{Sample, Segment, Track};
pub use crate::video::VideoInfo;
