use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::render::frame::FrameRGBA;
use crate::render::generator::FrameGenerator;
use crate::track::Sample;

/// A zoom level of the round-robin schedule and how long it stays on screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ZoomLevelConfig {
    pub zoom: u32,
    pub duration_secs: u32,
}

impl ZoomLevelConfig {
    pub const fn new(zoom: u32, duration_secs: u32) -> Self {
        Self {
            zoom,
            duration_secs,
        }
    }
}

/// Overview zooms cycle quickly, the street-level view dominates.
pub const DEFAULT_ZOOM_LEVELS: [ZoomLevelConfig; 4] = [
    ZoomLevelConfig::new(5, 5),
    ZoomLevelConfig::new(7, 5),
    ZoomLevelConfig::new(11, 5),
    ZoomLevelConfig::new(16, 60),
];

/// Picks a forced level index from `(elapsed second, segment duration in seconds)`.
///
/// Indices at or beyond the level count select the last level.
pub type ZoomOverride = fn(second: i64, duration: i64) -> Option<usize>;

/// Keep the most detailed level for short segments and near both ends of a segment, where
/// footage is synchronized by hand.
pub fn default_zoom_override(second: i64, duration: i64) -> Option<usize> {
    if duration < 120 || second > duration - 40 || second < 20 {
        return Some(usize::MAX);
    }
    None
}

/// Round-robin zoom level selection, advanced once per elapsed output second.
#[derive(Clone, Debug)]
pub struct ZoomSwitcher {
    durations: Vec<u32>,
    current: usize,
    remaining: i64,
    prev_second: i64,
    segment_duration: i64,
    override_fn: Option<ZoomOverride>,
}

impl ZoomSwitcher {
    /// `durations` holds the seconds spent on each level. `segment_duration` is passed to the
    /// override callback.
    pub fn new(
        durations: Vec<u32>,
        segment_duration: f64,
        override_fn: Option<ZoomOverride>,
    ) -> GpsMapResult<Self> {
        let Some(&first) = durations.first() else {
            return Err(GpsMapError::validation(
                "zoom switcher needs at least one level",
            ));
        };
        if durations.contains(&0) {
            return Err(GpsMapError::validation("zoom level durations must be > 0"));
        }
        Ok(Self {
            durations,
            current: 0,
            remaining: i64::from(first),
            prev_second: -1,
            segment_duration: segment_duration as i64,
            override_fn,
        })
    }

    pub fn from_levels(
        levels: &[ZoomLevelConfig],
        segment_duration: f64,
        override_fn: Option<ZoomOverride>,
    ) -> GpsMapResult<Self> {
        Self::new(
            levels.iter().map(|l| l.duration_secs).collect(),
            segment_duration,
            override_fn,
        )
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn level_count(&self) -> usize {
        self.durations.len()
    }

    /// Advance to `index` (frames at `fps` per second) and return the level to show.
    ///
    /// The override replaces the round-robin pick but leaves its countdown running.
    pub fn compute_index(&mut self, index: FrameIndex, fps: f64) -> usize {
        let second = (index.0 as f64 / fps) as i64;
        if second != self.prev_second {
            if self.prev_second >= 0 {
                self.remaining -= 1;
            }
            if self.remaining == 0 {
                self.current = (self.current + 1) % self.durations.len();
                self.remaining = i64::from(self.durations[self.current]);
            }
            if self.durations.len() > 1
                && let Some(forced) = self.override_fn.and_then(|f| f(second, self.segment_duration))
            {
                self.current = forced.min(self.durations.len() - 1);
            }
            self.prev_second = second;
        }
        self.current
    }

    /// Store the level for `index` into `state.zoom_index`.
    pub fn compute_state(&mut self, state: &mut Sample, index: FrameIndex, fps: f64) {
        state.zoom_index = self.compute_index(index, fps);
    }

    /// Precompute the level of every sample, using the sample index as the frame index.
    pub fn assign(&mut self, samples: &mut [Sample], fps: f64) {
        for (i, s) in samples.iter_mut().enumerate() {
            self.compute_state(s, FrameIndex(i as u64), fps);
        }
    }
}

/// Draws with the generator selected by each sample's `zoom_index`.
pub struct MapSwitcher {
    maps: Vec<Box<dyn FrameGenerator>>,
}

impl MapSwitcher {
    pub fn new(maps: Vec<Box<dyn FrameGenerator>>) -> Self {
        Self { maps }
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl FrameGenerator for MapSwitcher {
    fn generate(
        &mut self,
        frame: &mut FrameRGBA,
        state: &Sample,
        index: FrameIndex,
        fps: Fps,
    ) -> GpsMapResult<()> {
        let count = self.maps.len();
        let map = self.maps.get_mut(state.zoom_index).ok_or_else(|| {
            GpsMapError::render(format!(
                "zoom index {} out of range ({count} levels)",
                state.zoom_index
            ))
        })?;
        map.generate(frame, state, index, fps)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/switcher.rs"]
mod tests;
