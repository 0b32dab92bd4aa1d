use crate::foundation::math::premul_over_px;
use crate::render::frame::FrameRGBA;

/// Visible overlap of a `src` raster placed at `(x, y)` on `dst`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Overlap {
    pub dst_x: usize,
    pub dst_y: usize,
    pub src_x: usize,
    pub src_y: usize,
    pub width: usize,
    pub height: usize,
}

/// Clip `src` placed at `(x, y)` against `dst`. `None` when nothing is visible.
pub(crate) fn overlap(dst: &FrameRGBA, src: &FrameRGBA, x: i64, y: i64) -> Option<Overlap> {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + i64::from(src.width)).min(i64::from(dst.width));
    let y1 = (y + i64::from(src.height)).min(i64::from(dst.height));
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(Overlap {
        dst_x: x0 as usize,
        dst_y: y0 as usize,
        src_x: (x0 - x) as usize,
        src_y: (y0 - y) as usize,
        width: (x1 - x0) as usize,
        height: (y1 - y0) as usize,
    })
}

/// Copy `src` onto `dst` with its top-left at `(x, y)`, replacing pixels. Off-canvas parts are
/// dropped.
pub fn paste(dst: &mut FrameRGBA, src: &FrameRGBA, x: i64, y: i64) {
    let Some(o) = overlap(dst, src, x, y) else {
        return;
    };
    let dst_stride = dst.width as usize * 4;
    let src_stride = src.width as usize * 4;
    for row in 0..o.height {
        let d = (o.dst_y + row) * dst_stride + o.dst_x * 4;
        let s = (o.src_y + row) * src_stride + o.src_x * 4;
        dst.data[d..d + o.width * 4].copy_from_slice(&src.data[s..s + o.width * 4]);
    }
}

/// Source-over `src` onto `dst` with its top-left at `(x, y)`. Off-canvas parts are dropped.
pub fn overlay(dst: &mut FrameRGBA, src: &FrameRGBA, x: i64, y: i64) {
    let Some(o) = overlap(dst, src, x, y) else {
        return;
    };
    let dst_stride = dst.width as usize * 4;
    let src_stride = src.width as usize * 4;
    for row in 0..o.height {
        let d = (o.dst_y + row) * dst_stride + o.dst_x * 4;
        let s = (o.src_y + row) * src_stride + o.src_x * 4;
        let drow = &mut dst.data[d..d + o.width * 4];
        let srow = &src.data[s..s + o.width * 4];
        for (dp, sp) in drow.chunks_exact_mut(4).zip(srow.chunks_exact(4)) {
            premul_over_px(dp, sp);
        }
    }
}
