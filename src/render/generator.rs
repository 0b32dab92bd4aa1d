use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::GpsMapResult;
use crate::render::frame::FrameRGBA;
use crate::track::Sample;

/// One drawing stage of a video frame.
///
/// Generators run in order on the same frame buffer; a failure aborts the frame.
pub trait FrameGenerator: Send {
    /// Draw the stage for `state`, the sample shown at `index` of a video running at `fps`.
    fn generate(
        &mut self,
        frame: &mut FrameRGBA,
        state: &Sample,
        index: FrameIndex,
        fps: Fps,
    ) -> GpsMapResult<()>;
}

impl<G: FrameGenerator + ?Sized> FrameGenerator for Box<G> {
    fn generate(
        &mut self,
        frame: &mut FrameRGBA,
        state: &Sample,
        index: FrameIndex,
        fps: Fps,
    ) -> GpsMapResult<()> {
        (**self).generate(frame, state, index, fps)
    }
}
