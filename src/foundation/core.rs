use crate::foundation::error::{GpsMapError, GpsMapResult};

/// 0-based frame index inside one output video.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Half-open range `[start, end)` of sample indices inside a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// Inclusive range start.
    pub start: u64,
    /// Exclusive range end.
    pub end: u64,
}

impl FrameRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: u64, end: u64) -> GpsMapResult<Self> {
        if start > end {
            return Err(GpsMapError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Range of `len` frames beginning at `start`.
    pub fn with_len(start: u64, len: u64) -> Self {
        Self {
            start,
            end: start.saturating_add(len),
        }
    }

    pub fn len_frames(self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Split into consecutive sub-ranges of at most `max_len` frames.
    pub fn chunks(self, max_len: u64) -> Vec<FrameRange> {
        if max_len == 0 {
            return vec![self];
        }
        let mut out = Vec::new();
        let mut start = self.start;
        while start < self.end {
            let end = (start.saturating_add(max_len)).min(self.end);
            out.push(FrameRange { start, end });
            start = end;
        }
        out
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// NTSC 59.94, the default output rate.
    pub const NTSC_60: Fps = Fps {
        num: 60_000,
        den: 1001,
    };

    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> GpsMapResult<Self> {
        if den == 0 {
            return Err(GpsMapError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(GpsMapError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Parse `"num/den"` or a plain integer rate (as printed by ffprobe).
    pub fn parse(s: &str) -> GpsMapResult<Self> {
        let s = s.trim();
        let (num, den) = match s.split_once('/') {
            Some((n, d)) => (n.trim(), d.trim()),
            None => (s, "1"),
        };
        let num = num
            .parse::<u32>()
            .map_err(|e| GpsMapError::parse(format!("invalid frame rate '{s}': {e}")))?;
        let den = den
            .parse::<u32>()
            .map_err(|e| GpsMapError::parse(format!("invalid frame rate '{s}': {e}")))?;
        Self::new(num, den)
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    pub fn frames_to_secs(self, frames: u64) -> f64 {
        (frames as f64) * self.frame_duration_secs()
    }

    /// Convert seconds to frame count using floor semantics.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        (secs * self.as_f64()).floor().max(0.0) as u64
    }

    /// Whole elapsed seconds at `frame` (truncating).
    pub fn elapsed_second(self, frame: FrameIndex) -> u64 {
        frame.0.saturating_mul(u64::from(self.den)) / u64::from(self.num)
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> GpsMapResult<Self> {
        if width == 0 || height == 0 {
            return Err(GpsMapError::validation("canvas width/height must be non-zero"));
        }
        Ok(Self { width, height })
    }

    pub fn byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
