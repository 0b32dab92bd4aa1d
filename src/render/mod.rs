//! Frame composition: rasters, text, map and label generators, zoom switching.

/// Raster blitting with clipping.
pub mod composite;
/// RGBA8 raster type.
pub mod frame;
/// The frame generator trait.
pub mod generator;
pub mod label;
/// Map rendering around the current position.
pub mod map;
/// `vello_cpu` helpers.
pub mod raster;
/// Marker images, fonts and the map descriptor.
pub mod resources;
/// Zoom level scheduling.
pub mod switcher;
pub mod text;

pub use frame::FrameRGBA;
pub use generator::FrameGenerator;
pub use label::{LabelGenerator, TimeLabelGenerator};
pub use map::{MapImageGenerator, MapParams, Marker};
pub use resources::Resources;
pub use switcher::{
    DEFAULT_ZOOM_LEVELS, MapSwitcher, ZoomLevelConfig, ZoomOverride, ZoomSwitcher,
    default_zoom_override,
};
