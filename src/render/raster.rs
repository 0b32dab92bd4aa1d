//! CPU vector rasterization through `vello_cpu`.

use std::sync::Arc;

use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::render::frame::FrameRGBA;

/// Owns a reusable `vello_cpu` context sized to the last target.
#[derive(Default)]
pub struct Rasterizer {
    ctx: Option<vello_cpu::RenderContext>,
}

impl std::fmt::Debug for Rasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rasterizer").finish_non_exhaustive()
    }
}

impl Rasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `draw` on a cleared context of `width`x`height` and read the result back.
    pub fn render(
        &mut self,
        width: u32,
        height: u32,
        draw: impl FnOnce(&mut vello_cpu::RenderContext) -> GpsMapResult<()>,
    ) -> GpsMapResult<FrameRGBA> {
        let (w, h) = dims_u16(width, height)?;
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == w && ctx.height() == h => ctx,
            _ => vello_cpu::RenderContext::new(w, h),
        };
        ctx.reset();
        let drawn = draw(&mut ctx);
        let out = drawn.map(|()| {
            let mut pixmap = vello_cpu::Pixmap::new(w, h);
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            frame_from_pixmap(&pixmap, width, height)
        });
        self.ctx = Some(ctx);
        out?
    }

    /// Stroke open polylines (in pixel coordinates) onto a transparent layer.
    pub fn stroke_polylines(
        &mut self,
        width: u32,
        height: u32,
        lines: &[Vec<(f64, f64)>],
        rgba: [u8; 4],
        stroke_width: f64,
    ) -> GpsMapResult<FrameRGBA> {
        self.render(width, height, |ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                rgba[0], rgba[1], rgba[2], rgba[3],
            ));
            ctx.set_stroke(vello_cpu::kurbo::Stroke::new(stroke_width));
            for line in lines.iter().filter(|l| l.len() >= 2) {
                let mut path = vello_cpu::kurbo::BezPath::new();
                path.move_to(vello_cpu::kurbo::Point::new(line[0].0, line[0].1));
                for &(x, y) in &line[1..] {
                    path.line_to(vello_cpu::kurbo::Point::new(x, y));
                }
                ctx.stroke_path(&path);
            }
            Ok(())
        })
    }

    /// Rotate `src` clockwise by `degrees` about its center, keeping its size.
    pub fn rotate(&mut self, src: &FrameRGBA, degrees: f64) -> GpsMapResult<FrameRGBA> {
        let pixmap = pixmap_from_frame(src)?;
        let (w, h) = (f64::from(src.width), f64::from(src.height));
        self.render(src.width, src.height, |ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::rotate_about(
                degrees.to_radians(),
                vello_cpu::kurbo::Point::new(w / 2.0, h / 2.0),
            ));
            ctx.set_paint(vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            });
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
            Ok(())
        })
    }
}

fn dims_u16(width: u32, height: u32) -> GpsMapResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| GpsMapError::render("raster width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| GpsMapError::render("raster height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(GpsMapError::render("raster width/height must be non-zero"));
    }
    Ok((w, h))
}

pub(crate) fn pixmap_from_frame(frame: &FrameRGBA) -> GpsMapResult<vello_cpu::Pixmap> {
    let (w, h) = dims_u16(frame.width, frame.height)?;
    if frame.data.len() != (frame.width as usize) * (frame.height as usize) * 4 {
        return Err(GpsMapError::render("pixmap byte len mismatch"));
    }
    let pixels = frame
        .data
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

pub(crate) fn frame_from_pixmap(pixmap: &vello_cpu::Pixmap, width: u32, height: u32) -> GpsMapResult<FrameRGBA> {
    FrameRGBA::from_premul(width, height, pixmap.data_as_u8_slice().to_vec())
}
