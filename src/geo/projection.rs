//! Web-Mercator slippy-map projection.

use std::f64::consts::PI;

/// Fractional tile-space x coordinate for `lon` at `zoom`.
pub fn lon_to_tile_x(lon: f64, zoom: u32) -> f64 {
    (lon + 180.0) / 360.0 * tiles_per_axis(zoom)
}

/// Fractional tile-space y coordinate for `lat` at `zoom`.
pub fn lat_to_tile_y(lat: f64, zoom: u32) -> f64 {
    let lat_rad = lat.to_radians();
    (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * tiles_per_axis(zoom)
}

pub fn tiles_per_axis(zoom: u32) -> f64 {
    f64::from(1u32 << zoom.min(30))
}

/// A point resolved to its covering tile plus the pixel offset inside that tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TilePosition {
    pub tile_x: i32,
    pub tile_y: i32,
    pub pixel_x: i32,
    pub pixel_y: i32,
}

impl TilePosition {
    /// Resolve `(lat, lon)` at `zoom` for tiles of `tile_w` x `tile_h` pixels.
    ///
    /// Integer parts pick the tile, fractional parts scaled by the tile size give the pixel; both
    /// truncate toward zero.
    pub fn locate(lat: f64, lon: f64, zoom: u32, tile_w: u32, tile_h: u32) -> Self {
        let x = lon_to_tile_x(lon, zoom);
        let y = lat_to_tile_y(lat, zoom);
        Self {
            tile_x: x.trunc() as i32,
            tile_y: y.trunc() as i32,
            pixel_x: (x.fract() * f64::from(tile_w)) as i32,
            pixel_y: (y.fract() * f64::from(tile_h)) as i32,
        }
    }
}
