use crate::geo::projection::tiles_per_axis;

/// Slippy-map tile address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub x: i64,
    pub y: i64,
    pub zoom: u32,
}

impl TileKey {
    pub fn new(x: i64, y: i64, zoom: u32) -> Self {
        Self { x, y, zoom }
    }

    /// Wrap `x` around the antimeridian. `None` when `y` lies beyond the poles.
    pub fn normalized(self) -> Option<Self> {
        let n = tiles_per_axis(self.zoom) as i64;
        if self.y < 0 || self.y >= n {
            return None;
        }
        Some(Self {
            x: self.x.rem_euclid(n),
            ..self
        })
    }
}

impl std::fmt::Display for TileKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}
