use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Context as _;

use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::render::frame::FrameRGBA;
use crate::render::raster::Rasterizer;

pub const DOT_FILE: &str = "dot32.png";
pub const START_PIN_FILE: &str = "pin_start.png";
pub const FINISH_PIN_FILE: &str = "pin_finish.png";
pub const ARROW_FILE: &str = "arrow.png";
pub const MAP_DESCRIPTOR_FILE: &str = "OpenStreetMap-HiDPI.xml";
pub const FONT_FILE: &str = "LiberationSans-Regular.ttf";

const DOT_SIZE: (u32, u32) = (16, 16);
const PIN_SIZE: (u32, u32) = (45, 64);
const ARROW_SIZE: (u32, u32) = (96, 96);

/// Read-only images and files shared by every frame generator.
///
/// Rotated arrows are produced lazily, one per whole degree, and kept for the run.
#[derive(Debug)]
pub struct Resources {
    dir: PathBuf,
    dot: Arc<FrameRGBA>,
    start_pin: Arc<FrameRGBA>,
    finish_pin: Arc<FrameRGBA>,
    arrow: FrameRGBA,
    map_descriptor: PathBuf,
    font: Arc<Vec<u8>>,
    arrows: Mutex<HashMap<u32, Arc<FrameRGBA>>>,
}

impl Resources {
    /// Load everything from `dir`. Any missing or unreadable file fails the whole load.
    pub fn load(dir: &Path) -> GpsMapResult<Self> {
        if !dir.is_dir() {
            return Err(GpsMapError::validation(format!(
                "resource directory '{}' does not exist",
                dir.display()
            )));
        }

        let dot = load_image(dir, DOT_FILE)?.resized(DOT_SIZE.0, DOT_SIZE.1)?;
        let start_pin = load_image(dir, START_PIN_FILE)?.resized(PIN_SIZE.0, PIN_SIZE.1)?;
        let finish_pin = load_image(dir, FINISH_PIN_FILE)?
            .resized(PIN_SIZE.0, PIN_SIZE.1)?
            .flipped_vertical()?;
        let map_descriptor = require_file(dir, MAP_DESCRIPTOR_FILE)?;
        let font_path = require_file(dir, FONT_FILE)?;
        let font = std::fs::read(&font_path)
            .with_context(|| format!("failed to read font '{}'", font_path.display()))?;
        let arrow = load_image(dir, ARROW_FILE)?.resized(ARROW_SIZE.0, ARROW_SIZE.1)?;

        tracing::debug!(dir = %dir.display(), "resources loaded");
        Ok(Self::from_parts(
            dir.to_path_buf(),
            ResourceImages {
                dot,
                start_pin,
                finish_pin,
                arrow,
            },
            map_descriptor,
            font,
        ))
    }

    /// Assemble from already prepared images.
    pub fn from_parts(
        dir: PathBuf,
        images: ResourceImages,
        map_descriptor: PathBuf,
        font: Vec<u8>,
    ) -> Self {
        Self {
            dir,
            dot: Arc::new(images.dot),
            start_pin: Arc::new(images.start_pin),
            finish_pin: Arc::new(images.finish_pin),
            arrow: images.arrow,
            map_descriptor,
            font: Arc::new(font),
            arrows: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn dot(&self) -> &Arc<FrameRGBA> {
        &self.dot
    }

    pub fn start_pin(&self) -> &Arc<FrameRGBA> {
        &self.start_pin
    }

    /// The finish pin, already flipped so that its tip points up.
    pub fn finish_pin(&self) -> &Arc<FrameRGBA> {
        &self.finish_pin
    }

    pub fn map_descriptor(&self) -> &Path {
        &self.map_descriptor
    }

    pub fn font_bytes(&self) -> &[u8] {
        &self.font
    }

    /// Arrow rotated clockwise by `bearing`, rounded down to a whole degree.
    pub fn arrow(&self, raster: &mut Rasterizer, bearing: f64) -> GpsMapResult<Arc<FrameRGBA>> {
        let angle = (bearing as i64).rem_euclid(360) as u32;
        if let Some(a) = self.lock_arrows()?.get(&angle) {
            return Ok(Arc::clone(a));
        }
        // Rotated without the lock; a concurrent rotation of the same angle keeps the first.
        let rotated = Arc::new(raster.rotate(&self.arrow, f64::from(angle))?);
        Ok(Arc::clone(self.lock_arrows()?.entry(angle).or_insert(rotated)))
    }

    fn lock_arrows(&self) -> GpsMapResult<MutexGuard<'_, HashMap<u32, Arc<FrameRGBA>>>> {
        self.arrows
            .lock()
            .map_err(|_| GpsMapError::render("arrow cache lock poisoned"))
    }

    /// Number of distinct arrow angles rendered so far.
    pub fn cached_arrows(&self) -> usize {
        self.arrows.lock().map_or(0, |a| a.len())
    }
}

/// Marker images in their final sizes.
#[derive(Clone, Debug)]
pub struct ResourceImages {
    pub dot: FrameRGBA,
    pub start_pin: FrameRGBA,
    pub finish_pin: FrameRGBA,
    pub arrow: FrameRGBA,
}

fn require_file(dir: &Path, name: &str) -> GpsMapResult<PathBuf> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(GpsMapError::validation(format!(
            "could not find resource '{}'",
            path.display()
        )));
    }
    Ok(path)
}

fn load_image(dir: &Path, name: &str) -> GpsMapResult<FrameRGBA> {
    FrameRGBA::load(&require_file(dir, name)?)
}

#[cfg(test)]
#[path = "../../tests/unit/render/resources.rs"]
mod tests;
