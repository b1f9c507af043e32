/// A geographic position in map (lat, lon) order, degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lon: f64) -> Self {
        LatLng { lat, lon }
    }

    /// Builds a map position from a GeoJSON `[lon, lat]` position.
    pub const fn from_lon_lat(p: [f64; 2]) -> Self {
        LatLng { lat: p[1], lon: p[0] }
    }
}

/// Axis-aligned lon/lat bounds, `[lon, lat]` per corner.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LonLatBounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl LonLatBounds {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        LonLatBounds { min, max }
    }

    /// Returns `None` when `positions` is empty or holds no finite position.
    pub fn from_positions(positions: impl IntoIterator<Item = [f64; 2]>) -> Option<Self> {
        let mut out: Option<Self> = None;
        for p in positions {
            if !(p[0].is_finite() && p[1].is_finite()) {
                continue;
            }
            match out.as_mut() {
                Some(b) => b.expand(p),
                None => out = Some(Self::new(p, p)),
            }
        }
        out
    }

    pub fn expand(&mut self, p: [f64; 2]) {
        self.min[0] = self.min[0].min(p[0]);
        self.min[1] = self.min[1].min(p[1]);
        self.max[0] = self.max[0].max(p[0]);
        self.max[1] = self.max[1].max(p[1]);
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut out = *self;
        out.expand(other.min);
        out.expand(other.max);
        out
    }

    /// Grows each side by `ratio` of the box's extent on that axis.
    pub fn padded(&self, ratio: f64) -> Self {
        let dx = (self.max[0] - self.min[0]) * ratio;
        let dy = (self.max[1] - self.min[1]) * ratio;
        Self::new(
            [self.min[0] - dx, self.min[1] - dy],
            [self.max[0] + dx, self.max[1] + dy],
        )
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[0] + self.max[0]) * 0.5,
        )
    }

    pub fn south_west(&self) -> LatLng {
        LatLng::from_lon_lat(self.min)
    }

    pub fn north_east(&self) -> LatLng {
        LatLng::from_lon_lat(self.max)
    }
}
