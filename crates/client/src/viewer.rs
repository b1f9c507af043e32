//! Standalone results viewer: classifies `results.geojson` against the reference AOI.

use compute::{
    ClassificationCounts, ClassifierConfig, Classification, ClassifyError, ComparisonAggregate,
    SpatialClassifier,
};
use formats::{Aoi, DetectionLayer};
use layers::{MapScene, Popup};
use tracing::info;

use crate::backend::{Backend, BackendError};

#[derive(Debug, Clone)]
pub struct ClassifiedResults {
    pub results: DetectionLayer,
    pub reference: Option<Aoi>,
    pub classes: Vec<Classification>,
    pub counts: ClassificationCounts,
}

impl ClassifiedResults {
    /// Without a reference AOI every detection is illegal.
    pub fn classify(results: DetectionLayer, reference: Option<Aoi>, config: ClassifierConfig) -> Self {
        let aoi = reference.as_ref().map(Aoi::polygons).unwrap_or_default();
        let classifier = SpatialClassifier::new(aoi, config);
        let classes = classifier.classify_layer(&results);
        let counts = ClassificationCounts::tally(&classes);
        info!(
            legal = counts.legal,
            illegal = counts.illegal,
            unknown = counts.unknown,
            "classified results"
        );
        Self {
            results,
            reference,
            classes,
            counts,
        }
    }

    pub fn scene(&self) -> MapScene {
        MapScene::classified(&self.results, &self.classes, self.reference.as_ref())
    }

    pub fn popups(&self) -> Vec<Popup> {
        self.results
            .features()
            .iter()
            .zip(&self.classes)
            .map(|(f, class)| Popup::for_detection(&f.properties, *class))
            .collect()
    }

    /// Area statistics computed locally from the results and the reference AOI.
    pub fn aggregate(&self) -> Result<ComparisonAggregate, ClassifyError> {
        let aoi = self.reference.as_ref().map(Aoi::polygons).unwrap_or_default();
        ComparisonAggregate::compute(&self.results.geometries(), &aoi, None)
    }
}

pub async fn load_results(
    backend: &dyn Backend,
    config: ClassifierConfig,
) -> Result<ClassifiedResults, BackendError> {
    let (results, reference) = tokio::join!(backend.fetch_results(), backend.fetch_reference_aoi());
    let results = results?.ok_or(BackendError::Missing("results.geojson"))?;
    let reference = reference?.ok_or(BackendError::Missing("aoi.geojson"))?;
    Ok(ClassifiedResults::classify(results, Some(reference), config))
}

#[cfg(test)]
mod tests {
    use super::{load_results, ClassifiedResults};
    use crate::backend::BackendError;
    use crate::testing::{collection, square_aoi, FakeBackend};
    use compute::{Classification, ClassifierConfig};
    use formats::DetectionLayer;
    use serde_json::json;

    fn results() -> DetectionLayer {
        DetectionLayer::from_collection(collection(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"area_m2": 100},
                 "geometry": {"type": "Polygon", "coordinates": [[[0.2,0.2],[0.4,0.2],[0.4,0.4],[0.2,0.4],[0.2,0.2]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[3,3],[4,3],[4,4],[3,4],[3,3]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [0.5, 0.5]}}
            ]
        })))
    }

    #[test]
    fn classifies_against_reference() {
        let classified = ClassifiedResults::classify(
            results(),
            Some(square_aoi(0.0)),
            ClassifierConfig::default(),
        );
        assert_eq!(
            classified.classes,
            vec![
                Classification::Legal,
                Classification::Illegal,
                Classification::Unknown
            ]
        );
        assert_eq!(classified.counts.legal, 1);
        assert_eq!(classified.popups()[0].subtitle, "Legal Mining");
        assert_eq!(classified.scene().to_geojson().features.len(), 4);

        let aggregate = classified.aggregate().unwrap();
        assert!(aggregate.summary.pct_outside > 90.0);
    }

    #[tokio::test]
    async fn missing_inputs_are_reported() {
        let backend = FakeBackend {
            results: Some(results()),
            ..FakeBackend::default()
        };
        assert!(matches!(
            load_results(&backend, ClassifierConfig::default()).await,
            Err(BackendError::Missing("aoi.geojson"))
        ));

        let backend = FakeBackend {
            results: Some(results()),
            reference_aoi: Some(square_aoi(0.0)),
            ..FakeBackend::default()
        };
        let loaded = load_results(&backend, ClassifierConfig::default()).await.unwrap();
        assert_eq!(loaded.counts.illegal, 1);
    }
}
