use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::render::frame::FrameRGBA;
use crate::render::raster::Rasterizer;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Geometry and colors of a text box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxStyle {
    pub width: u32,
    pub height: u32,
    pub size_px: f32,
    /// Straight-alpha RGBA.
    pub background: [u8; 4],
    /// Straight-alpha RGBA.
    pub foreground: [u8; 4],
    /// First baseline, from the top of the box.
    pub baseline_y: f32,
}

/// Shapes single-line labels with one registered font and rasterizes them.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
    font: vello_cpu::peniko::FontData,
}

impl std::fmt::Debug for TextLayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayoutEngine")
            .field("family_name", &self.family_name)
            .finish_non_exhaustive()
    }
}

impl TextLayoutEngine {
    /// Register `font_bytes` (TTF/OTF) as the only font family.
    pub fn new(font_bytes: &[u8]) -> GpsMapResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| GpsMapError::validation("no font families registered from font bytes"))?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| GpsMapError::validation("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
            font: vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(font_bytes.to_vec()),
                0,
            ),
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    fn layout(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> GpsMapResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(GpsMapError::validation("text size_px must be finite and > 0"));
        }
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));
        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }

    /// Advance width of `text` in pixels.
    pub fn measure(&mut self, text: &str, size_px: f32) -> GpsMapResult<f32> {
        Ok(self.layout(text, size_px, TextBrushRgba8::default())?.width())
    }

    /// Render `text` horizontally centered in a filled box.
    pub fn render_box(
        &mut self,
        raster: &mut Rasterizer,
        text: &str,
        style: &BoxStyle,
    ) -> GpsMapResult<FrameRGBA> {
        let BoxStyle {
            width,
            height,
            size_px,
            background,
            foreground,
            baseline_y,
        } = *style;
        let brush = TextBrushRgba8 {
            r: foreground[0],
            g: foreground[1],
            b: foreground[2],
            a: foreground[3],
        };
        let layout = self.layout(text, size_px, brush)?;
        let line_baseline = layout
            .lines()
            .next()
            .map_or(0.0, |line| line.metrics().baseline);
        let dx = (width as f32 - layout.width()) / 2.0;
        let dy = baseline_y - line_baseline;
        let font = &self.font;

        raster.render(width, height, |ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                background[0],
                background[1],
                background[2],
                background[3],
            ));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(width),
                f64::from(height),
            ));

            ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                f64::from(dx),
                f64::from(dy),
            )));
            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));
                    let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
            Ok(())
        })
    }
}
