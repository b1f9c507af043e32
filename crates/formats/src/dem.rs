use serde::{Deserialize, Serialize};

/// Result of the backend's DEM upload-and-analyze endpoint.
///
/// Differences are in meters (current minus uploaded). `volume_m3` is null when the backend
/// could not derive a pixel area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemVolumeResult {
    #[serde(default)]
    pub volume_m3: Option<f64>,
    #[serde(default)]
    pub max_diff: Option<f64>,
    #[serde(default)]
    pub min_diff: Option<f64>,
    #[serde(default)]
    pub mean_diff: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heightmap_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_url: Option<String>,
}

/// Error body returned by the DEM endpoint, e.g. `{"status":"error","detail":"..."}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

/// Only GeoTIFF uploads are accepted.
pub fn is_dem_file_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".tif") || lower.ends_with(".tiff")
}
