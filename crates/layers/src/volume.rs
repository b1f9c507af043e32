use formats::DemVolumeResult;

pub const FOOTPRINT: f64 = 600.0;
const HEIGHT_SCALE: f64 = 0.1;
const MIN_HEIGHT: f64 = 1.0;

pub const GAIN_COLOR: &str = "#44aa44";
pub const LOSS_COLOR: &str = "#aa4444";

/// Box visualizing an excavation volume: fixed footprint, height proportional to `|volume|`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VolumeBox {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
    pub color: &'static str,
}

impl VolumeBox {
    pub fn from_volume(volume_m3: f64) -> Self {
        Self {
            width: FOOTPRINT,
            depth: FOOTPRINT,
            height: (volume_m3.abs() * HEIGHT_SCALE).max(MIN_HEIGHT),
            color: if volume_m3 >= 0.0 { GAIN_COLOR } else { LOSS_COLOR },
        }
    }

    pub fn from_result(result: &DemVolumeResult) -> Option<Self> {
        result
            .volume_m3
            .filter(|v| v.is_finite())
            .map(Self::from_volume)
    }
}
