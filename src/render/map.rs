use std::sync::Arc;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::geo::projection::{lat_to_tile_y, lon_to_tile_x};
use crate::render::composite::{overlay, paste};
use crate::render::frame::FrameRGBA;
use crate::render::generator::FrameGenerator;
use crate::render::raster::Rasterizer;
use crate::render::resources::Resources;
use crate::tiles::{TileCache, TileKey};
use crate::track::{Sample, Segment};

/// Zoom from which the position marker is a heading arrow instead of a dot.
pub const DEFAULT_ARROW_MIN_ZOOM: u32 = 11;

const TRACK_RGBA: [u8; 4] = [0, 0, 255, 255];
const TRACK_WIDTH: f64 = 2.0;

/// A fixed image pinned to a geographic position.
#[derive(Clone, Debug)]
pub struct Marker {
    pub image: Arc<FrameRGBA>,
    pub latitude: f64,
    pub longitude: f64,
    /// Pixel of `image` placed on the position.
    pub anchor_x: i64,
    pub anchor_y: i64,
}

impl Marker {
    /// Start pin: its bottom center sits on the position.
    pub fn start(image: Arc<FrameRGBA>, sample: &Sample) -> Self {
        Self {
            anchor_x: i64::from(image.width / 2),
            anchor_y: i64::from(image.height),
            image,
            latitude: sample.latitude,
            longitude: sample.longitude,
        }
    }

    /// Finish pin (flipped): its top center sits on the position.
    pub fn finish(image: Arc<FrameRGBA>, sample: &Sample) -> Self {
        Self {
            anchor_x: i64::from(image.width / 2),
            anchor_y: 0,
            image,
            latitude: sample.latitude,
            longitude: sample.longitude,
        }
    }
}

/// Shared inputs of every map generator of a run.
#[derive(Clone, Debug)]
pub struct MapParams {
    pub whole_track: Arc<Segment>,
    pub tiles: Arc<TileCache>,
    pub resources: Arc<Resources>,
    pub markers: Arc<[Marker]>,
    pub arrow_min_zoom: u32,
}

#[derive(Debug)]
struct TileGrid {
    center: (i64, i64),
    tile_w: u32,
    tile_h: u32,
    image: FrameRGBA,
}

/// Renders a map centered on the current sample at one zoom level.
///
/// The 3x3 tile grid around the current tile, with the whole track drawn on it, is rebuilt only
/// when the center tile changes.
pub struct MapImageGenerator {
    params: MapParams,
    zoom: u32,
    grid: Option<TileGrid>,
    viewport: (i64, i64),
    raster: Rasterizer,
}

impl MapImageGenerator {
    pub fn new(params: MapParams, zoom: u32) -> Self {
        Self {
            params,
            zoom,
            grid: None,
            viewport: (0, 0),
            raster: Rasterizer::new(),
        }
    }

    pub fn zoom(&self) -> u32 {
        self.zoom
    }

    /// Tile at the center of the cached grid, if one was assembled.
    pub fn grid_center(&self) -> Option<(i64, i64)> {
        self.grid.as_ref().map(|g| g.center)
    }

    /// Position of `(lat, lon)` in pixels of the cached grid. May be negative or beyond the grid.
    pub fn to_grid(&self, lat: f64, lon: f64) -> Option<(i64, i64)> {
        let g = self.grid.as_ref()?;
        Some(grid_coords(lat, lon, self.zoom, g.center, g.tile_w, g.tile_h))
    }

    /// Position of `(lat, lon)` in pixels of the last rendered frame.
    pub fn to_viewport(&self, lat: f64, lon: f64) -> Option<(i64, i64)> {
        let (x, y) = self.to_grid(lat, lon)?;
        Some((x - self.viewport.0, y - self.viewport.1))
    }

    fn load_grid(&mut self, center: (i64, i64), tile_w: u32, tile_h: u32) -> GpsMapResult<()> {
        let mut image = FrameRGBA::new(tile_w * 3, tile_h * 3);
        for i in -1i64..=1 {
            for j in -1i64..=1 {
                let Some(key) = TileKey::new(center.0 + i, center.1 + j, self.zoom).normalized()
                else {
                    // Beyond the poles: leave blank.
                    continue;
                };
                let tile = self.params.tiles.get_key(key)?;
                paste(
                    &mut image,
                    &tile,
                    (i + 1) * i64::from(tile_w),
                    (j + 1) * i64::from(tile_h),
                );
            }
        }

        let lines = track_polylines(
            &self.params.whole_track,
            self.zoom,
            center,
            tile_w,
            tile_h,
        );
        let layer = self.raster.stroke_polylines(
            image.width,
            image.height,
            &lines,
            TRACK_RGBA,
            TRACK_WIDTH,
        )?;
        overlay(&mut image, &layer, 0, 0);

        tracing::debug!(zoom = self.zoom, x = center.0, y = center.1, "map grid reloaded");
        self.grid = Some(TileGrid {
            center,
            tile_w,
            tile_h,
            image,
        });
        Ok(())
    }

    fn draw_markers(&mut self, frame: &mut FrameRGBA, bearing: f64) -> GpsMapResult<()> {
        let resources = Arc::clone(&self.params.resources);
        let marker = if self.zoom >= self.params.arrow_min_zoom {
            resources.arrow(&mut self.raster, bearing)?
        } else {
            Arc::clone(resources.dot())
        };
        let cx = i64::from(frame.width / 2) - i64::from(marker.width / 2);
        let cy = i64::from(frame.height / 2) - i64::from(marker.height / 2);
        overlay(frame, &marker, cx, cy);

        let markers = Arc::clone(&self.params.markers);
        for m in markers.iter() {
            if let Some((vx, vy)) = self.to_viewport(m.latitude, m.longitude) {
                overlay(frame, &m.image, vx - m.anchor_x, vy - m.anchor_y);
            }
        }
        Ok(())
    }
}

impl FrameGenerator for MapImageGenerator {
    fn generate(
        &mut self,
        frame: &mut FrameRGBA,
        state: &Sample,
        _index: FrameIndex,
        _fps: Fps,
    ) -> GpsMapResult<()> {
        let (pos, tile) = self
            .params
            .tiles
            .tile_for(state.latitude, state.longitude, self.zoom)
            .map_err(|e| {
                GpsMapError::render(format!(
                    "no tile for {} {} at zoom {}: {e}",
                    state.latitude, state.longitude, self.zoom
                ))
            })?;
        let center = (i64::from(pos.tile_x), i64::from(pos.tile_y));
        let (tw, th) = (tile.width, tile.height);

        if self.grid_center() != Some(center) {
            self.load_grid(center, tw, th)?;
        }
        let grid = self
            .grid
            .as_ref()
            .ok_or_else(|| GpsMapError::render("map grid missing"))?;

        // Current position in grid pixels, moved to the middle of the frame.
        let gx = i64::from(pos.pixel_x) + i64::from(tw);
        let gy = i64::from(pos.pixel_y) + i64::from(th);
        self.viewport = (
            gx - i64::from(frame.width / 2),
            gy - i64::from(frame.height / 2),
        );
        paste(frame, &grid.image, -self.viewport.0, -self.viewport.1);

        self.draw_markers(frame, state.bearing)
    }
}

/// Pixel position of `(lat, lon)` in a grid whose middle tile is `center`.
pub fn grid_coords(
    lat: f64,
    lon: f64,
    zoom: u32,
    center: (i64, i64),
    tile_w: u32,
    tile_h: u32,
) -> (i64, i64) {
    let x = lon_to_tile_x(lon, zoom);
    let y = lat_to_tile_y(lat, zoom);
    let (xt, yt) = (x.trunc() as i64, y.trunc() as i64);
    let px = (x.fract() * f64::from(tile_w)) as i64;
    let py = (y.fract() * f64::from(tile_h)) as i64;
    (
        (xt - (center.0 - 1)) * i64::from(tile_w) + px,
        (yt - (center.1 - 1)) * i64::from(tile_h) + py,
    )
}

/// The track as grid-pixel polylines, broken at segment starts and where it leaves the grid.
pub(crate) fn track_polylines(
    track: &Segment,
    zoom: u32,
    center: (i64, i64),
    tile_w: u32,
    tile_h: u32,
) -> Vec<Vec<(f64, f64)>> {
    let (w, h) = (i64::from(tile_w) * 3, i64::from(tile_h) * 3);
    let inside = |(x, y): (i64, i64)| (-w..2 * w).contains(&x) && (-h..2 * h).contains(&y);

    let mut lines: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();
    let mut prev: Option<(i64, i64)> = None;
    for s in track {
        let p = grid_coords(s.latitude, s.longitude, zoom, center, tile_w, tile_h);
        let connected = match prev {
            Some(q) => !s.is_segment_start && (inside(p) || inside(q)),
            None => false,
        };
        if !connected {
            if current.len() >= 2 {
                lines.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            if inside(p) {
                current.push((p.0 as f64, p.1 as f64));
            }
        } else if prev != Some(p) {
            if current.is_empty()
                && let Some(q) = prev
            {
                current.push((q.0 as f64, q.1 as f64));
            }
            current.push((p.0 as f64, p.1 as f64));
        }
        prev = Some(p);
    }
    if current.len() >= 2 {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
#[path = "../../tests/unit/render/map.rs"]
mod tests;
