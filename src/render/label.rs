use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::render::composite::paste;
use crate::render::frame::FrameRGBA;
use crate::render::generator::FrameGenerator;
use crate::render::raster::Rasterizer;
use crate::render::text::{BoxStyle, TextLayoutEngine};
use crate::track::{Sample, format_timestamp};

pub const LABEL_HEIGHT: u32 = 32;
const LABEL_FONT_PX: f32 = 32.0;
const LABEL_BASELINE: f32 = (LABEL_HEIGHT - 5) as f32;

const LABEL_BACKGROUND: [u8; 4] = [255, 255, 255, 255];
const LABEL_FOREGROUND: [u8; 4] = [0, 0, 0, 255];

/// Bottom label: speed, elevation and distance so far.
pub fn stats_text(state: &Sample) -> String {
    format!(
        "{} km/h  {} m  {:.2} km",
        state.speed_kmh() as i64,
        state.elevation as i64,
        state.total_distance / 1000.0
    )
}

/// Top label: the sample time.
pub fn time_text(state: &Sample) -> String {
    format_timestamp(state.timestamp)
}

/// A full-width text strip re-rendered only when its text changes.
#[derive(Debug, Default)]
struct LabelStrip {
    text: Option<String>,
    image: Option<FrameRGBA>,
}

impl LabelStrip {
    fn update(
        &mut self,
        engine: &mut TextLayoutEngine,
        raster: &mut Rasterizer,
        text: String,
        width: u32,
    ) -> GpsMapResult<&FrameRGBA> {
        let stale = self.text.as_deref() != Some(text.as_str())
            || self.image.as_ref().is_none_or(|img| img.width != width);
        if stale {
            let style = BoxStyle {
                width,
                height: LABEL_HEIGHT,
                size_px: LABEL_FONT_PX,
                background: LABEL_BACKGROUND,
                foreground: LABEL_FOREGROUND,
                baseline_y: LABEL_BASELINE,
            };
            self.image = Some(engine.render_box(raster, &text, &style)?);
            self.text = Some(text);
        }
        self.image
            .as_ref()
            .ok_or_else(|| GpsMapError::render("label strip missing"))
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// Draws the time strip at the top and the stats strip at the bottom of the frame.
pub struct LabelGenerator {
    engine: TextLayoutEngine,
    raster: Rasterizer,
    top: LabelStrip,
    bottom: LabelStrip,
}

impl LabelGenerator {
    pub fn new(font_bytes: &[u8]) -> GpsMapResult<Self> {
        Ok(Self::with_engine(TextLayoutEngine::new(font_bytes)?))
    }

    pub fn with_engine(engine: TextLayoutEngine) -> Self {
        Self {
            engine,
            raster: Rasterizer::new(),
            top: LabelStrip::default(),
            bottom: LabelStrip::default(),
        }
    }

    /// Text currently shown in the top strip.
    pub fn top_text(&self) -> Option<&str> {
        self.top.text()
    }

    /// Text currently shown in the bottom strip.
    pub fn bottom_text(&self) -> Option<&str> {
        self.bottom.text()
    }

    /// Draw only the time strip at the top of `frame`.
    pub fn draw_time(&mut self, frame: &mut FrameRGBA, timestamp: f64) -> GpsMapResult<()> {
        let img = self.top.update(
            &mut self.engine,
            &mut self.raster,
            format_timestamp(timestamp),
            frame.width,
        )?;
        paste(frame, img, 0, 0);
        Ok(())
    }
}

impl FrameGenerator for LabelGenerator {
    fn generate(
        &mut self,
        frame: &mut FrameRGBA,
        state: &Sample,
        _index: FrameIndex,
        _fps: Fps,
    ) -> GpsMapResult<()> {
        self.draw_time(frame, state.timestamp)?;
        let img = self.bottom.update(
            &mut self.engine,
            &mut self.raster,
            stats_text(state),
            frame.width,
        )?;
        paste(
            frame,
            img,
            0,
            i64::from(frame.height) - i64::from(LABEL_HEIGHT),
        );
        Ok(())
    }
}

/// Only the time strip, for standalone timecode videos.
pub struct TimeLabelGenerator(LabelGenerator);

impl TimeLabelGenerator {
    pub fn new(font_bytes: &[u8]) -> GpsMapResult<Self> {
        Ok(Self(LabelGenerator::new(font_bytes)?))
    }
}

impl FrameGenerator for TimeLabelGenerator {
    fn generate(
        &mut self,
        frame: &mut FrameRGBA,
        state: &Sample,
        _index: FrameIndex,
        _fps: Fps,
    ) -> GpsMapResult<()> {
        self.0.draw_time(frame, state.timestamp)
    }
}
