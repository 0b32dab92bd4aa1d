use anyhow::Context as _;

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// An RGBA8 raster: output frames, tiles, the tile grid and marker images.
///
/// Pixels are **premultiplied alpha** unless `premultiplied` says otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; (width as usize) * (height as usize) * 4],
            premultiplied: true,
        }
    }

    /// Raster filled with `color`.
    pub fn filled(width: u32, height: u32, color: Rgba8Premul) -> Self {
        let mut f = Self::new(width, height);
        f.clear(color);
        f
    }

    /// Wrap premultiplied bytes, checking the length.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> GpsMapResult<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(GpsMapError::validation(format!(
                "raster data length {} does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            premultiplied: true,
        })
    }

    /// Decode PNG (or any format `image` knows) into a premultiplied raster.
    pub fn decode(bytes: &[u8]) -> GpsMapResult<Self> {
        let rgba = image::load_from_memory(bytes)
            .context("decode image from memory")?
            .to_rgba8();
        Ok(Self::from_rgba_image(rgba))
    }

    /// Load an image file from disk.
    pub fn load(path: &std::path::Path) -> GpsMapResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read image '{}'", path.display()))?;
        Self::decode(&bytes)
            .map_err(|e| GpsMapError::render(format!("'{}': {e}", path.display())))
    }

    /// Convert straight-alpha `image` pixels.
    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut data = img.into_raw();
        premultiply_rgba8_in_place(&mut data);
        Self {
            width,
            height,
            data,
            premultiplied: true,
        }
    }

    pub fn clear(&mut self, color: Rgba8Premul) {
        let px = color.to_array();
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Premultiplied pixel at `(x, y)`, `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Resample to `width`x`height` with a triangle filter.
    pub fn resized(&self, width: u32, height: u32) -> GpsMapResult<Self> {
        if self.width == width && self.height == height {
            return Ok(self.clone());
        }
        let img = self.to_image()?;
        let out = image::imageops::resize(&img, width, height, image::imageops::FilterType::Triangle);
        Self::from_premul(width, height, out.into_raw())
    }

    /// Mirror top to bottom.
    pub fn flipped_vertical(&self) -> GpsMapResult<Self> {
        let img = self.to_image()?;
        let out = image::imageops::flip_vertical(&img);
        Self::from_premul(self.width, self.height, out.into_raw())
    }

    fn to_image(&self) -> GpsMapResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| GpsMapError::render("raster buffer does not match its dimensions"))
    }
}
