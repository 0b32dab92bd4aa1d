//! Map tiles: addressing, fetching and the shared in-memory/disk cache.

/// Concurrent tile cache.
pub mod cache;
/// Tile addresses.
pub mod key;
/// Tile sources (HTTP download from a templated URL).
pub mod source;

pub use cache::{TileCache, TileImage, TileState};
pub use key::TileKey;
pub use source::{HttpTileFetcher, TileFetcher, expand_url, load_map_url};
