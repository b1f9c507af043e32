use foundation::{LatLng, LonLatBounds};
use formats::Aoi;

pub const DEFAULT_CENTER: LatLng = LatLng::new(20.0, 77.0);
pub const DEFAULT_ZOOM: u8 = 12;

/// Padding applied when fitting the results viewer to its data.
pub const RESULTS_PADDING: f64 = 0.1;

/// Map camera: a center and zoom, optionally overridden by bounds to fit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: u8,
    pub fit_bounds: Option<LonLatBounds>,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            fit_bounds: None,
        }
    }
}

impl MapView {
    /// Centers on the first position of the AOI's first outer ring. Bounds are fitted only when
    /// that ring has more than one position.
    pub fn for_aoi(aoi: Option<&Aoi>) -> Self {
        let Some(ring) = aoi.and_then(Aoi::first_outer_ring) else {
            return Self::default();
        };
        let Some(first) = ring.first().copied() else {
            return Self::default();
        };
        let fit_bounds = if ring.len() > 1 {
            LonLatBounds::from_positions(ring.iter().copied())
        } else {
            None
        };
        Self {
            center: LatLng::from_lon_lat(first),
            zoom: DEFAULT_ZOOM,
            fit_bounds,
        }
    }

    pub fn fitted(bounds: LonLatBounds, padding: f64) -> Self {
        let bounds = bounds.padded(padding);
        Self {
            center: bounds.center(),
            zoom: DEFAULT_ZOOM,
            fit_bounds: Some(bounds),
        }
    }
}
