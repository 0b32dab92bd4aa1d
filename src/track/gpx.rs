//! GPX track parsing.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::track::sample::Sample;
use crate::track::segment::Segment;

/// Segments loaded from one GPX file.
#[derive(Clone, Debug, Default)]
pub struct Track {
    initial_distance: f64,
    end_distance: f64,
    segments: Vec<Segment>,
}

impl Track {
    /// Read and process a GPX file.
    ///
    /// `initial_distance` is the distance already covered by earlier files of the same trip.
    /// With `frequency > 0` every segment is resampled; segments that cannot be resampled are
    /// dropped with a warning.
    pub fn load_from_file(
        path: &Path,
        frequency: f64,
        initial_distance: f64,
    ) -> GpsMapResult<Self> {
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read GPX file '{}'", path.display()))?;
        let track = Self::from_gpx_str(&xml, frequency, initial_distance)?;
        tracing::info!(
            path = %path.display(),
            segments = track.segments.len(),
            "loaded track"
        );
        Ok(track)
    }

    /// Parse GPX text and derive distance, bearing and grade for every segment.
    pub fn from_gpx_str(xml: &str, frequency: f64, initial_distance: f64) -> GpsMapResult<Self> {
        let raw_segments = parse_gpx(xml)?;

        let mut total = initial_distance;
        let mut segments = Vec::new();
        for samples in raw_segments {
            if samples.is_empty() {
                continue;
            }
            let mut seg = Segment::from_samples(total, 0.0, samples);
            seg.sort_by_timestamp();
            if let Some(first) = seg.samples_mut().first_mut() {
                first.is_segment_start = true;
            }
            seg.update_distances();
            seg.update_bearing();
            seg.update_grade();

            let end = seg.last().map_or(total, |s| s.total_distance);
            if frequency > 0.0 {
                match seg.interpolate(frequency) {
                    Ok(resampled) => seg = resampled,
                    Err(e) if e.is_data_anomaly() => {
                        tracing::warn!(error = %e, "skipping segment that cannot be resampled");
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }
            total = end;
            segments.push(seg);
        }

        if let Some(first) = segments
            .first_mut()
            .and_then(|s| s.samples_mut().first_mut())
        {
            first.is_track_start = true;
        }

        Ok(Self {
            initial_distance,
            end_distance: total,
            segments,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<Segment> {
        self.segments
    }

    pub fn initial_distance(&self) -> f64 {
        self.initial_distance
    }

    /// Distance at the end of this file, or the initial distance when it holds no data.
    pub fn total_distance(&self) -> f64 {
        if self.segments.is_empty() {
            self.initial_distance
        } else {
            self.end_distance
        }
    }
}

/// Load several GPX files of one trip in the given order, chaining their distances.
pub fn load_segments(
    paths: &[PathBuf],
    frequency: f64,
    split_idle: bool,
) -> GpsMapResult<Vec<Segment>> {
    let mut initial_distance = 0.0;
    let mut out = Vec::new();
    for path in paths {
        let track = Track::load_from_file(path, frequency, initial_distance)?;
        initial_distance = track.total_distance();
        for seg in track.into_segments() {
            if split_idle {
                out.extend(seg.split_idle());
            } else {
                out.push(seg);
            }
        }
    }
    Ok(out)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Elevation,
    Time,
    Speed,
}

#[derive(Default)]
struct PendingFix {
    lat: Option<f64>,
    lon: Option<f64>,
    ele: String,
    time: String,
    speed: Option<String>,
}

fn parse_gpx(xml: &str) -> GpsMapResult<Vec<Vec<Sample>>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut segments: Vec<Vec<Sample>> = Vec::new();
    let mut in_segment = false;
    let mut fix: Option<PendingFix> = None;
    let mut field: Option<Field> = None;
    let mut skipped = 0usize;
    let mut missing_speed = 0usize;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| GpsMapError::parse(format!("GPX XML error: {e}")))?;
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"trkseg" => {
                    segments.push(Vec::new());
                    in_segment = true;
                }
                b"trkpt" => fix = Some(start_fix(&e)?),
                b"ele" if fix.is_some() => field = Some(Field::Elevation),
                b"time" if fix.is_some() => field = Some(Field::Time),
                b"speed" if fix.is_some() => field = Some(Field::Speed),
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"trkpt" => {
                tracing::warn!("skipping empty trkpt without time");
                skipped += 1;
            }
            Event::Text(t) => {
                if let (Some(f), Some(p)) = (field, fix.as_mut()) {
                    let text = t
                        .unescape()
                        .map_err(|e| GpsMapError::parse(format!("GPX text error: {e}")))?;
                    match f {
                        Field::Elevation => p.ele.push_str(&text),
                        Field::Time => p.time.push_str(&text),
                        Field::Speed => p.speed.get_or_insert_with(String::new).push_str(&text),
                    }
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"trkseg" => in_segment = false,
                b"trkpt" => {
                    if let Some(p) = fix.take() {
                        if p.speed.is_none() {
                            missing_speed += 1;
                        }
                        match finish_fix(p) {
                            Ok(sample) => {
                                if !in_segment || segments.is_empty() {
                                    segments.push(Vec::new());
                                    in_segment = true;
                                }
                                if let Some(seg) = segments.last_mut() {
                                    seg.push(sample);
                                }
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "skipping fix");
                                skipped += 1;
                            }
                        }
                    }
                }
                b"ele" | b"time" | b"speed" => field = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if missing_speed > 0 {
        tracing::warn!(count = missing_speed, "fixes without speed, using 0.0");
    }
    if skipped > 0 {
        tracing::warn!(count = skipped, "fixes skipped");
    }
    Ok(segments)
}

fn start_fix(e: &BytesStart<'_>) -> GpsMapResult<PendingFix> {
    Ok(PendingFix {
        lat: attr_f64(e, "lat")?,
        lon: attr_f64(e, "lon")?,
        ..PendingFix::default()
    })
}

fn attr_f64(e: &BytesStart<'_>, name: &str) -> GpsMapResult<Option<f64>> {
    let Some(attr) = e
        .try_get_attribute(name)
        .map_err(|err| GpsMapError::parse(format!("bad trkpt attribute: {err}")))?
    else {
        return Ok(None);
    };
    let value = attr
        .unescape_value()
        .map_err(|err| GpsMapError::parse(format!("bad trkpt attribute: {err}")))?;
    Ok(value.trim().parse::<f64>().ok())
}

fn finish_fix(p: PendingFix) -> GpsMapResult<Sample> {
    let latitude = p
        .lat
        .ok_or_else(|| GpsMapError::parse("trkpt without valid lat"))?;
    let longitude = p
        .lon
        .ok_or_else(|| GpsMapError::parse("trkpt without valid lon"))?;
    let timestamp = parse_timestamp(&p.time)?;
    let elevation = p.ele.trim().parse::<f64>().unwrap_or(0.0);
    let speed = p
        .speed
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(Sample {
        timestamp,
        original_timestamp: p.time.trim().to_string(),
        latitude,
        longitude,
        speed,
        elevation,
        ..Sample::default()
    })
}

/// Parse an ISO-8601 timestamp into fractional Unix seconds. Times without an offset are UTC.
pub fn parse_timestamp(text: &str) -> GpsMapResult<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(GpsMapError::parse("trkpt without time"));
    }
    let dt = match chrono::DateTime::parse_from_rfc3339(text) {
        Ok(dt) => dt.with_timezone(&chrono::Utc),
        Err(_) => chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|e| GpsMapError::parse(format!("invalid time '{text}': {e}")))?
            .and_utc(),
    };
    Ok(dt.timestamp() as f64 + f64::from(dt.timestamp_subsec_nanos()) * 1e-9)
}

/// Format Unix seconds as `YYYY-mm-dd HH:MM:SS` (UTC).
pub fn format_timestamp(ts: f64) -> String {
    match chrono::DateTime::from_timestamp(ts.floor() as i64, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::from("----------"),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/track/gpx.rs"]
mod tests;
