//! Great-circle helpers on WGS84 degrees.

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two points given in degrees.
pub fn distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Guard against a > 1 from rounding on antipodal points.
    EARTH_RADIUS_M * 2.0 * a.sqrt().min(1.0).asin()
}

/// Raw initial bearing from point 1 to point 2 in degrees, normalized to `[0, 360)`.
///
/// Identical points yield exactly `0.0`; see [`crate::track::Segment::update_bearing`] for how
/// callers treat that value.
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let deg = y.atan2(x).to_degrees();
    normalize_degrees(deg)
}

/// Shortest signed rotation from `a1` to `a2`, in `[-180, 180]`.
pub fn angular_distance(a1: f64, a2: f64) -> f64 {
    let mut d = (a2 - a1) % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d < -180.0 {
        d += 360.0;
    }
    d
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    let d = deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs.
    if d >= 360.0 { 0.0 } else { d }
}

#[cfg(test)]
#[path = "../../tests/unit/geo/math.rs"]
mod tests;
