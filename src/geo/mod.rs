/// Haversine distance, bearing and angle helpers.
pub mod math;
/// Slippy-map tile projection.
pub mod projection;

pub use math::{angular_distance, bearing, distance};
pub use projection::{TilePosition, lat_to_tile_y, lon_to_tile_x};
