use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::foundation::error::{GpsMapError, GpsMapResult};
use crate::geo::projection::{TilePosition, lat_to_tile_y, lon_to_tile_x};
use crate::render::frame::FrameRGBA;
use crate::tiles::key::TileKey;
use crate::tiles::source::TileFetcher;

/// A decoded, premultiplied tile raster.
pub type TileImage = FrameRGBA;

/// Lifecycle of one cache entry. `Ready` and `Failed` are terminal.
#[derive(Clone, Debug)]
pub enum TileState {
    Pending,
    Ready(Arc<TileImage>),
    Failed(String),
}

#[derive(Debug)]
struct TileCell {
    state: Mutex<TileState>,
    resolved: Condvar,
}

impl TileCell {
    fn pending() -> Self {
        Self {
            state: Mutex::new(TileState::Pending),
            resolved: Condvar::new(),
        }
    }

    fn resolve(&self, result: &GpsMapResult<Arc<TileImage>>) -> GpsMapResult<()> {
        let mut state = lock(&self.state)?;
        *state = match result {
            Ok(img) => TileState::Ready(Arc::clone(img)),
            Err(e) => TileState::Failed(e.to_string()),
        };
        self.resolved.notify_all();
        Ok(())
    }

    fn wait(&self, key: TileKey) -> GpsMapResult<Arc<TileImage>> {
        let guard = lock(&self.state)?;
        let state = self
            .resolved
            .wait_while(guard, |s| matches!(s, TileState::Pending))
            .map_err(|_| GpsMapError::tile("tile state lock poisoned"))?;
        match &*state {
            TileState::Ready(img) => Ok(Arc::clone(img)),
            TileState::Failed(msg) => Err(GpsMapError::tile(format!("tile {key}: {msg}"))),
            TileState::Pending => Err(GpsMapError::tile(format!("tile {key} still pending"))),
        }
    }
}

/// Resolves its cell to `Failed` if the owning fetch unwinds before resolving it.
struct PendingFetch<'a> {
    cell: &'a TileCell,
    resolved: bool,
}

impl PendingFetch<'_> {
    fn finish(mut self, result: &GpsMapResult<Arc<TileImage>>) -> GpsMapResult<()> {
        self.resolved = true;
        self.cell.resolve(result)
    }
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }
        let mut state = self
            .cell
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *state = TileState::Failed(String::from("tile fetch aborted"));
        self.cell.resolved.notify_all();
    }
}

fn lock<T>(m: &Mutex<T>) -> GpsMapResult<MutexGuard<'_, T>> {
    m.lock()
        .map_err(|_| GpsMapError::tile("tile cache lock poisoned"))
}

/// Process-wide tile store backed by a disk cache and a [`TileFetcher`].
///
/// At most one fetch runs per key: the first caller inserts a `Pending` entry and fetches outside
/// the map lock, later callers block on the entry until it resolves. Entries are never evicted.
pub struct TileCache {
    root: PathBuf,
    fetcher: Arc<dyn TileFetcher>,
    tiles: Mutex<HashMap<TileKey, Arc<TileCell>>>,
}

impl std::fmt::Debug for TileCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileCache")
            .field("root", &self.root)
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

impl TileCache {
    /// `root` must be an existing directory.
    pub fn new(root: impl Into<PathBuf>, fetcher: Arc<dyn TileFetcher>) -> GpsMapResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(GpsMapError::validation(format!(
                "tile cache root '{}' does not exist or is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            fetcher,
            tiles: Mutex::new(HashMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of entries in any state.
    pub fn len(&self) -> usize {
        self.tiles.lock().map_or(0, |t| t.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current state of `key`, if it was ever requested.
    pub fn state(&self, key: TileKey) -> Option<TileState> {
        let cell = self.tiles.lock().ok()?.get(&key).cloned()?;
        let state = cell.state.lock().ok()?;
        Some(state.clone())
    }

    /// On-disk location of a tile: `{root}/{z}/{x}/{y}.png`.
    pub fn tile_path(&self, key: TileKey) -> PathBuf {
        self.root
            .join(key.zoom.to_string())
            .join(key.x.to_string())
            .join(format!("{}.png", key.y))
    }

    /// Return the tile for `(x, y, zoom)`, loading it on first use.
    pub fn get(&self, x: i64, y: i64, zoom: u32) -> GpsMapResult<Arc<TileImage>> {
        self.get_key(TileKey::new(x, y, zoom))
    }

    pub fn get_key(&self, key: TileKey) -> GpsMapResult<Arc<TileImage>> {
        let (cell, owner) = {
            let mut tiles = lock(&self.tiles)?;
            match tiles.get(&key) {
                Some(cell) => (Arc::clone(cell), false),
                None => {
                    let cell = Arc::new(TileCell::pending());
                    tiles.insert(key, Arc::clone(&cell));
                    (cell, true)
                }
            }
        };

        if !owner {
            return cell.wait(key);
        }

        let pending = PendingFetch {
            cell: &cell,
            resolved: false,
        };
        let result = self.load(key).map(Arc::new);
        if let Err(e) = &result {
            tracing::warn!(tile = %key, error = %e, "tile unavailable");
        }
        pending.finish(&result)?;
        result
    }

    /// Resolve the tile covering `(lat, lon)` and the pixel position inside it.
    pub fn tile_for(
        &self,
        lat: f64,
        lon: f64,
        zoom: u32,
    ) -> GpsMapResult<(TilePosition, Arc<TileImage>)> {
        let x = lon_to_tile_x(lon, zoom).trunc() as i64;
        let y = lat_to_tile_y(lat, zoom).trunc() as i64;
        let tile = self.get(x, y, zoom)?;
        let pos = TilePosition::locate(lat, lon, zoom, tile.width, tile.height);
        Ok((pos, tile))
    }

    #[tracing::instrument(level = "debug", skip(self), fields(tile = %key))]
    fn load(&self, key: TileKey) -> GpsMapResult<TileImage> {
        let path = self.tile_path(key);
        if let Some(img) = self.load_from_disk(&path) {
            return Ok(img);
        }

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                GpsMapError::tile(format!("could not create directory '{}': {e}", dir.display()))
            })?;
        }

        let bytes = self.fetcher.fetch(key)?;
        let img = TileImage::decode(&bytes)
            .map_err(|e| GpsMapError::tile(format!("tile {key} does not decode: {e}")))?;
        if let Err(e) = std::fs::write(&path, &bytes) {
            tracing::warn!(path = %path.display(), error = %e, "could not persist tile");
        }
        Ok(img)
    }

    /// A zero-byte or undecodable file counts as a miss and is removed.
    fn load_from_disk(&self, path: &Path) -> Option<TileImage> {
        let meta = std::fs::metadata(path).ok()?;
        if meta.len() > 0 {
            let decoded = std::fs::read(path)
                .map_err(|e| GpsMapError::tile(e.to_string()))
                .and_then(|b| TileImage::decode(&b));
            match decoded {
                Ok(img) => return Some(img),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt cached tile, refetching");
                }
            }
        }
        if let Err(e) = std::fs::remove_file(path) {
            tracing::debug!(path = %path.display(), error = %e, "could not remove stale tile");
        }
        None
    }
}

#[cfg(test)]
#[path = "../../tests/unit/tiles/cache.rs"]
mod tests;
