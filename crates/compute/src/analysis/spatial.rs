//! Legality of detection polygons relative to the AOI.
//!
//! A detection is legal when some AOI polygon fully contains it, or when its intersection
//! with some AOI polygon covers more than `overlap_threshold` of the detection's own area.
//! Containment is tried first; the overlap ratio handles detections straddling the boundary.
//! With no AOI polygons every detection is illegal.

use formats::{DetectionFeature, DetectionLayer};
use geo::{BooleanOps, Contains, GeodesicArea, MultiPolygon, Polygon};
use serde::Serialize;
use tracing::warn;

use crate::analysis::{guarded, validate_multi_polygon, validate_polygon};

pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.5;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Fraction of the detection's area that must fall inside a single AOI polygon.
    /// Compared strictly: a ratio equal to the threshold is not enough.
    pub overlap_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Legality {
    Legal,
    Illegal,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Legal,
    Illegal,
    Unknown,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Legal => "legal",
            Classification::Illegal => "illegal",
            Classification::Unknown => "unknown",
        }
    }
}

impl From<Legality> for Classification {
    fn from(l: Legality) -> Self {
        match l {
            Legality::Legal => Classification::Legal,
            Legality::Illegal => Classification::Illegal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifyError {
    #[error("detection has no polygonal geometry")]
    MissingGeometry,
    #[error("degenerate geometry: {0}")]
    Degenerate(&'static str),
    #[error("geometry operation failed")]
    OperationFailed,
}

/// Classifies detections against a fixed set of AOI polygons.
#[derive(Debug, Clone)]
pub struct SpatialClassifier {
    aoi: Vec<Polygon<f64>>,
    config: ClassifierConfig,
}

impl SpatialClassifier {
    pub fn new(aoi: Vec<Polygon<f64>>, config: ClassifierConfig) -> Self {
        Self { aoi, config }
    }

    pub fn config(&self) -> ClassifierConfig {
        self.config
    }

    pub fn classify(&self, detection: &Polygon<f64>) -> Result<Legality, ClassifyError> {
        self.classify_multi(&MultiPolygon::new(vec![detection.clone()]))
    }

    /// A multi-part detection is judged as a whole: every part must be contained, or the
    /// combined overlap must exceed the threshold.
    pub fn classify_multi(&self, detection: &MultiPolygon<f64>) -> Result<Legality, ClassifyError> {
        if self.aoi.is_empty() {
            return Ok(Legality::Illegal);
        }
        validate_multi_polygon(detection)?;
        let detection_area = guarded(|| detection.geodesic_area_unsigned())?;
        if !(detection_area.is_finite() && detection_area > MIN_DETECTION_AREA_M2) {
            return Err(ClassifyError::Degenerate("detection has zero area"));
        }

        for (index, aoi) in self.aoi.iter().enumerate() {
            if let Err(err) = validate_polygon(aoi) {
                warn!(aoi_index = index, %err, "skipping AOI polygon");
                continue;
            }

            let contained = guarded(|| detection.0.iter().all(|part| aoi.contains(part)));
            if contained == Ok(true) {
                return Ok(Legality::Legal);
            }

            match overlap_ratio(detection, detection_area, aoi) {
                Ok(ratio) if ratio > self.config.overlap_threshold => return Ok(Legality::Legal),
                Ok(_) => {}
                Err(err) => warn!(aoi_index = index, %err, "intersection failed; skipping AOI polygon"),
            }
        }

        Ok(Legality::Illegal)
    }

    /// Never fails: features without polygonal geometry or whose classification errors are
    /// `Unknown`.
    pub fn classify_feature(&self, feature: &DetectionFeature) -> Classification {
        let result = match feature.geometry.as_ref() {
            Some(geom) => self.classify_multi(geom),
            None => Err(ClassifyError::MissingGeometry),
        };
        match result {
            Ok(legality) => legality.into(),
            Err(err) => {
                warn!(id = ?feature.id, %err, "classification failed");
                Classification::Unknown
            }
        }
    }

    pub fn classify_layer(&self, layer: &DetectionLayer) -> Vec<Classification> {
        layer
            .features()
            .iter()
            .map(|f| self.classify_feature(f))
            .collect()
    }
}

/// Classifies one detection polygon with the default threshold.
pub fn classify(detection: &Polygon<f64>, aoi: &[Polygon<f64>]) -> Result<Legality, ClassifyError> {
    SpatialClassifier::new(aoi.to_vec(), ClassifierConfig::default()).classify(detection)
}

/// Below this a detection's geodesic area is rounding noise.
const MIN_DETECTION_AREA_M2: f64 = 1e-6;

/// Intersection area over the detection's own area, which must be positive.
fn overlap_ratio(
    detection: &MultiPolygon<f64>,
    detection_area: f64,
    aoi: &Polygon<f64>,
) -> Result<f64, ClassifyError> {
    let aoi = MultiPolygon::new(vec![aoi.clone()]);
    let intersection = guarded(|| detection.intersection(&aoi))?;
    let shared = guarded(|| intersection.geodesic_area_unsigned())?;
    if !shared.is_finite() {
        return Err(ClassifyError::OperationFailed);
    }
    Ok(shared / detection_area)
}

/// Counts per classification, in `(legal, illegal, unknown)` order.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationCounts {
    pub legal: usize,
    pub illegal: usize,
    pub unknown: usize,
}

impl ClassificationCounts {
    pub fn tally(classes: &[Classification]) -> Self {
        let mut out = Self::default();
        for c in classes {
            match c {
                Classification::Legal => out.legal += 1,
                Classification::Illegal => out.illegal += 1,
                Classification::Unknown => out.unknown += 1,
            }
        }
        out
    }
}
