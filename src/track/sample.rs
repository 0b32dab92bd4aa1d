/// One processed GPS fix.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sample {
    /// Seconds since the Unix epoch, fractional.
    pub timestamp: f64,
    /// Timestamp text as found in the source file.
    pub original_timestamp: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters per second.
    pub speed: f64,
    /// Meters.
    pub elevation: f64,
    /// Meters from the previous sample.
    pub distance_delta: f64,
    /// Meters from the start of the trip, including any initial offset.
    pub total_distance: f64,
    /// Degrees in `[0, 360)`, heading toward the next sample.
    pub bearing: f64,
    /// Local slope in percent.
    pub grade: f64,
    pub is_track_start: bool,
    pub is_segment_start: bool,
    /// Index of the zoom level shown for this sample, written by the zoom switcher.
    pub zoom_index: usize,
}

impl Sample {
    /// Speed in km/h.
    pub fn speed_kmh(&self) -> f64 {
        self.speed * 3600.0 / 1000.0
    }
}
