use std::sync::Arc;

use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::geo::math::{angular_distance, bearing, distance, normalize_degrees};
use crate::track::sample::Sample;

/// Consecutive fixes closer than this (in degrees, per axis) count as not moving.
pub const IDLE_EPSILON_DEG: f64 = 1e-8;

/// Distance covered on each side of a sample when estimating its grade.
pub const GRADE_WINDOW_M: f64 = 50.0;

/// Start time and length of a recording window.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GpxInfo {
    /// Seconds since the Unix epoch.
    pub start: i64,
    /// Seconds.
    pub duration: f64,
}

/// An ordered run of samples sharing one distance origin and sample rate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Segment {
    initial_distance: f64,
    frequency: f64,
    samples: Vec<Sample>,
}

impl Segment {
    /// Create an empty segment. A `frequency` of 0 means "not resampled".
    pub fn new(initial_distance: f64, frequency: f64) -> Self {
        Self {
            initial_distance,
            frequency,
            samples: Vec::new(),
        }
    }

    pub(crate) fn from_samples(initial_distance: f64, frequency: f64, samples: Vec<Sample>) -> Self {
        Self {
            initial_distance,
            frequency,
            samples,
        }
    }

    /// Append a sample; timestamps must not go backwards.
    pub fn push(&mut self, sample: Sample) -> GpsMapResult<()> {
        if let Some(last) = self.samples.last()
            && sample.timestamp < last.timestamp
        {
            return Err(GpsMapError::validation(format!(
                "sample at {} precedes last sample at {}",
                sample.timestamp, last.timestamp
            )));
        }
        self.samples.push(sample);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [Sample] {
        &mut self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn initial_distance(&self) -> f64 {
        self.initial_distance
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Seconds between the first and last sample.
    pub fn duration(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(a), Some(b)) => b.timestamp - a.timestamp,
            _ => 0.0,
        }
    }

    /// Stable sort by timestamp: fixes sharing a timestamp keep their source order.
    pub fn sort_by_timestamp(&mut self) {
        self.samples
            .sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    }

    /// Recompute `distance_delta` and `total_distance` from the initial offset.
    pub fn update_distances(&mut self) {
        let mut total = self.initial_distance;
        let mut prev: Option<(f64, f64)> = None;
        for s in &mut self.samples {
            let delta = match prev {
                Some((lat, lon)) => distance(lat, lon, s.latitude, s.longitude),
                None => 0.0,
            };
            total += delta;
            s.distance_delta = delta;
            s.total_distance = total;
            prev = Some((s.latitude, s.longitude));
        }
    }

    /// Assign each sample the bearing toward its successor.
    ///
    /// A raw bearing of exactly 0 is taken as a degenerate pair and the previous sample's bearing
    /// is kept instead. The first sample has no predecessor and keeps 0. The last sample has no
    /// successor and inherits its predecessor's bearing.
    pub fn update_bearing(&mut self) {
        let n = self.samples.len();
        for i in 0..n {
            let raw = if i + 1 < n {
                let (a, b) = (&self.samples[i], &self.samples[i + 1]);
                bearing(a.latitude, a.longitude, b.latitude, b.longitude)
            } else {
                0.0
            };
            self.samples[i].bearing = if raw == 0.0 {
                if i > 0 { self.samples[i - 1].bearing } else { 0.0 }
            } else {
                raw
            };
        }
    }

    /// Estimate the local slope of every sample except the last, which keeps 0.
    pub fn update_grade(&mut self) {
        let n = self.samples.len();
        if n == 0 {
            return;
        }
        let grades: Vec<f64> = (0..n - 1).map(|i| grade_at(&self.samples, i)).collect();
        for (s, g) in self.samples.iter_mut().zip(grades) {
            s.grade = g;
        }
        if let Some(last) = self.samples.last_mut() {
            last.grade = 0.0;
        }
    }

    /// Resample to `frequency` samples per second.
    ///
    /// Each pair `(a, b)` contributes `round((b.t - a.t) * frequency)` samples spanning `[a, b)`;
    /// the final source sample is therefore not repeated. Bearing follows the shortest rotation.
    /// Distances and grades are recomputed on the result. A pair with no time between its fixes
    /// cannot be resampled and fails the whole segment.
    pub fn interpolate(&self, frequency: f64) -> GpsMapResult<Segment> {
        if !frequency.is_finite() || frequency <= 0.0 {
            return Err(GpsMapError::validation(
                "interpolation frequency must be finite and > 0",
            ));
        }
        if self.samples.len() < 2 {
            let mut out = self.clone();
            out.frequency = frequency;
            return Ok(out);
        }

        let mut out = Vec::new();
        // Start flags of pairs that produced no samples move on to the next emitted sample.
        let (mut track_start, mut segment_start) = (false, false);
        for pair in self.samples.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let dt = b.timestamp - a.timestamp;
            if dt <= 0.0 {
                return Err(GpsMapError::data(format!(
                    "zero time delta between samples at {} ({})",
                    a.timestamp, a.original_timestamp
                )));
            }
            let frames = (dt * frequency).round() as usize;
            let turn = angular_distance(a.bearing, b.bearing);
            track_start |= a.is_track_start;
            segment_start |= a.is_segment_start;
            for k in 0..frames {
                let r = k as f64 / frames as f64;
                let mut s = Sample {
                    timestamp: lerp(a.timestamp, b.timestamp, r),
                    original_timestamp: a.original_timestamp.clone(),
                    latitude: lerp(a.latitude, b.latitude, r),
                    longitude: lerp(a.longitude, b.longitude, r),
                    speed: lerp(a.speed, b.speed, r),
                    elevation: lerp(a.elevation, b.elevation, r),
                    bearing: normalize_degrees(a.bearing + turn * r),
                    zoom_index: a.zoom_index,
                    ..Sample::default()
                };
                if k == 0 {
                    s.is_track_start = std::mem::take(&mut track_start);
                    s.is_segment_start = std::mem::take(&mut segment_start);
                }
                out.push(s);
            }
        }

        let mut seg = Segment::from_samples(self.initial_distance, frequency, out);
        seg.update_distances();
        seg.update_grade();
        Ok(seg)
    }

    /// Partition into maximal runs that are either idle or moving.
    ///
    /// A pair of consecutive fixes is idle when both coordinates moved less than
    /// [`IDLE_EPSILON_DEG`]. A new run starts at the sample where the classification flips, so
    /// concatenating the runs gives back the input.
    pub fn split_idle(&self) -> Vec<Segment> {
        let n = self.samples.len();
        if n == 0 {
            return Vec::new();
        }

        let mut bounds = vec![0usize];
        let mut current: Option<bool> = None;
        for i in 1..n {
            let idle = is_idle_pair(&self.samples[i - 1], &self.samples[i]);
            match current {
                Some(c) if c != idle => {
                    bounds.push(i);
                    current = Some(idle);
                }
                None => current = Some(idle),
                _ => {}
            }
        }
        bounds.push(n);

        bounds
            .windows(2)
            .map(|w| {
                let (start, end) = (w[0], w[1]);
                let offset = if start == 0 {
                    self.initial_distance
                } else {
                    self.samples[start - 1].total_distance
                };
                Segment::from_samples(offset, self.frequency, self.samples[start..end].to_vec())
            })
            .collect()
    }

    /// `true` when every consecutive pair is idle. Single-sample segments count as idle.
    pub fn is_idle(&self) -> bool {
        self.samples
            .windows(2)
            .all(|w| is_idle_pair(&w[0], &w[1]))
    }

    /// Find the sample `i` with `t[i] <= timestamp < t[i + 1]`, scanning forward from `cursor`.
    ///
    /// On success the cursor moves to `i`. Returns `None` when `timestamp` precedes the cursor's
    /// sample or lies beyond the last interval; the cursor is left untouched then.
    pub fn closest_sample(&self, timestamp: f64, cursor: &mut usize) -> Option<&Sample> {
        let n = self.samples.len();
        if *cursor >= n || timestamp < self.samples[*cursor].timestamp {
            return None;
        }
        for i in *cursor..n.saturating_sub(1) {
            let (a, b) = (&self.samples[i], &self.samples[i + 1]);
            if a.timestamp <= timestamp && timestamp < b.timestamp {
                *cursor = i;
                return Some(a);
            }
        }
        None
    }

    /// Copy samples `[start, end)` into a new segment with a zero distance offset.
    pub fn extract(&self, start: usize, end: usize) -> Option<Segment> {
        if start >= self.samples.len() || end > self.samples.len() || end < start {
            return None;
        }
        Some(Segment::from_samples(
            0.0,
            self.frequency,
            self.samples[start..end].to_vec(),
        ))
    }

    pub fn info(&self) -> Option<GpxInfo> {
        let first = self.samples.first()?;
        Some(GpxInfo {
            start: first.timestamp as i64,
            duration: self.duration(),
        })
    }

    /// Extract the samples covered by each window. Windows without track data yield `None`.
    pub fn fill_windows(&self, windows: &[GpxInfo]) -> Vec<Option<Segment>> {
        windows
            .iter()
            .map(|w| {
                let mut cursor = 0usize;
                self.closest_sample(w.start as f64, &mut cursor)?;
                let start = cursor;
                self.closest_sample(w.start as f64 + w.duration, &mut cursor)?;
                self.extract(start, cursor)
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a Segment {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Concatenate segments into one "whole track" segment, keeping every sample's flags.
pub fn merge_segments<'a>(segments: impl IntoIterator<Item = &'a Segment>) -> Segment {
    let mut it = segments.into_iter().peekable();
    let (initial_distance, frequency) = it
        .peek()
        .map(|s| (s.initial_distance, s.frequency))
        .unwrap_or((0.0, 0.0));
    let samples = it.flat_map(|s| s.samples.iter().cloned()).collect();
    Segment::from_samples(initial_distance, frequency, samples)
}

/// Location of a time window inside one of several segments.
#[derive(Clone, Debug)]
pub struct SegmentRange {
    pub segment: Arc<Segment>,
    /// Index of the sample covering the window start.
    pub start_index: usize,
    /// Index of the sample covering the window end.
    pub end_index: usize,
}

/// Find the first segment that covers both `start` and `start + duration`.
pub fn segment_range(segments: &[Arc<Segment>], start: f64, duration: f64) -> Option<SegmentRange> {
    for seg in segments {
        let mut cursor = 0usize;
        if seg.closest_sample(start, &mut cursor).is_none() {
            continue;
        }
        let start_index = cursor;
        if seg.closest_sample(start + duration, &mut cursor).is_none() {
            continue;
        }
        return Some(SegmentRange {
            segment: Arc::clone(seg),
            start_index,
            end_index: cursor,
        });
    }
    None
}

fn grade_at(items: &[Sample], i: usize) -> f64 {
    let mut ldist = 0.0;
    let mut lelev = 0.0;
    for s in items[..=i].iter().rev() {
        ldist += s.distance_delta;
        lelev = s.elevation;
        if ldist >= GRADE_WINDOW_M {
            break;
        }
    }

    let mut rdist = 0.0;
    let mut relev = 0.0;
    for s in &items[i..] {
        rdist += s.distance_delta;
        relev = s.elevation;
        if rdist >= GRADE_WINDOW_M {
            break;
        }
    }

    let total = ldist + rdist;
    if total < 0.01 {
        return 0.0;
    }
    (relev - lelev) / total * 100.0
}

fn is_idle_pair(a: &Sample, b: &Sample) -> bool {
    (a.latitude - b.latitude).abs() < IDLE_EPSILON_DEG
        && (a.longitude - b.longitude).abs() < IDLE_EPSILON_DEG
}

fn lerp(a: f64, b: f64, r: f64) -> f64 {
    a + (b - a) * r
}

#[cfg(test)]
#[path = "../../tests/unit/track/segment.rs"]
mod tests;
