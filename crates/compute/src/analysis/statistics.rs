use formats::{ComparisonSummary, DemVolumeResult};
use geo::{BooleanOps, GeodesicArea, MultiPolygon, Polygon};

use crate::analysis::spatial::ClassifyError;
use crate::analysis::{guarded, validate_multi_polygon, validate_polygon};

pub struct Statistics;

impl Statistics {
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sum = 0.0;
        for &v in values {
            sum += v;
        }
        Some(sum / values.len() as f64)
    }

    pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
        let first = *values.first()?;
        let mut min = first;
        let mut max = first;
        for &v in values.iter().skip(1) {
            min = min.min(v);
            max = max.max(v);
        }
        Some((min, max))
    }

    pub fn round2(v: f64) -> f64 {
        (v * 100.0).round() / 100.0
    }
}

/// Detected area against the AOI: union of all detections, the part of that union outside
/// the AOI union, and the outside share in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonAggregate {
    pub summary: ComparisonSummary,
    pub outside: MultiPolygon<f64>,
}

impl ComparisonAggregate {
    /// Invalid detection or AOI polygons are left out of the unions.
    pub fn compute(
        detections: &[MultiPolygon<f64>],
        aoi: &[Polygon<f64>],
        time_range: Option<(String, String)>,
    ) -> Result<Self, ClassifyError> {
        let detected = union_all(
            detections
                .iter()
                .filter(|mp| validate_multi_polygon(mp).is_ok())
                .cloned(),
        )?;
        let aoi_union = union_all(
            aoi.iter()
                .filter(|p| validate_polygon(p).is_ok())
                .map(|p| MultiPolygon::new(vec![p.clone()])),
        )?;

        let outside = guarded(|| detected.difference(&aoi_union))?;
        let detected_area_m2 = guarded(|| detected.geodesic_area_unsigned())?;
        let outside_area_m2 = guarded(|| outside.geodesic_area_unsigned())?;
        let pct_outside = if detected_area_m2 > 0.0 {
            100.0 * outside_area_m2 / (detected_area_m2 + 1e-9)
        } else {
            0.0
        };

        let (time_start, time_end) = match time_range {
            Some((s, e)) => (Some(s), Some(e)),
            None => (None, None),
        };

        Ok(Self {
            summary: ComparisonSummary {
                detected_area_m2: Statistics::round2(detected_area_m2),
                outside_area_m2: Statistics::round2(outside_area_m2),
                pct_outside: Statistics::round2(pct_outside),
                time_start,
                time_end,
            },
            outside,
        })
    }
}

fn union_all(
    parts: impl Iterator<Item = MultiPolygon<f64>>,
) -> Result<MultiPolygon<f64>, ClassifyError> {
    let mut acc = MultiPolygon::new(Vec::new());
    for part in parts {
        acc = guarded(|| acc.union(&part))?;
    }
    Ok(acc)
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DemDiffError {
    #[error("grid sizes differ: current has {current} cells, baseline has {baseline}")]
    GridMismatch { current: usize, baseline: usize },
    #[error("no overlapping valid pixels between the two DEMs")]
    NoOverlap,
}

/// Elevation change between two co-registered DEM grids (current minus baseline).
#[derive(Debug, Clone, PartialEq)]
pub struct DemDiff {
    pub max_diff: f64,
    pub min_diff: f64,
    pub mean_diff: f64,
    /// Sum of differences times pixel area; only meaningful for metric grids.
    pub volume_m3: f64,
    pub valid_pixels: usize,
}

impl DemDiff {
    /// A cell counts only when it is finite and differs from `nodata` in both grids.
    pub fn compute(
        current: &[f32],
        baseline: &[f32],
        nodata: Option<f32>,
        pixel_area_m2: f64,
    ) -> Result<Self, DemDiffError> {
        if current.len() != baseline.len() {
            return Err(DemDiffError::GridMismatch {
                current: current.len(),
                baseline: baseline.len(),
            });
        }

        let valid = |v: f32| v.is_finite() && Some(v) != nodata;
        let diffs: Vec<f64> = current
            .iter()
            .zip(baseline)
            .filter(|(c, b)| valid(**c) && valid(**b))
            .map(|(c, b)| f64::from(*c) - f64::from(*b))
            .collect();

        let (min_diff, max_diff) = Statistics::min_max(&diffs).ok_or(DemDiffError::NoOverlap)?;
        let mean_diff = Statistics::mean(&diffs).ok_or(DemDiffError::NoOverlap)?;
        let volume_m3 = diffs.iter().sum::<f64>() * pixel_area_m2;

        Ok(Self {
            max_diff,
            min_diff,
            mean_diff,
            volume_m3,
            valid_pixels: diffs.len(),
        })
    }

    pub fn to_result(&self) -> DemVolumeResult {
        DemVolumeResult {
            volume_m3: Some(self.volume_m3),
            max_diff: Some(self.max_diff),
            min_diff: Some(self.min_diff),
            mean_diff: Some(self.mean_diff),
            heightmap_url: None,
            meta_url: None,
        }
    }
}
