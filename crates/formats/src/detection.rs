use geo_types::MultiPolygon;
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue, feature::Id};

use crate::geometry;

/// Measurements attached to a detection by the backend.
///
/// Every field is optional; nothing here defaults to a sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DetectionProperties {
    pub area_m2: Option<f64>,
    pub mean_depth_m: Option<f64>,
    pub max_depth_m: Option<f64>,
    pub volume_m3: Option<f64>,
}

impl DetectionProperties {
    pub fn from_properties(props: Option<&JsonObject>) -> Self {
        let Some(props) = props else {
            return Self::default();
        };
        Self {
            area_m2: numeric(props.get("area_m2")),
            mean_depth_m: numeric(props.get("mean_depth_m")),
            max_depth_m: numeric(props.get("max_depth_m")),
            volume_m3: numeric(props.get("volume_m3")),
        }
    }
}

/// Accepts JSON numbers and numeric strings; anything else (including non-finite) is absent.
fn numeric(value: Option<&JsonValue>) -> Option<f64> {
    let v = match value? {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// One detection polygon as produced by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionFeature {
    pub id: Option<String>,
    /// `None` when the feature has no polygonal geometry.
    pub geometry: Option<MultiPolygon<f64>>,
    pub properties: DetectionProperties,
    source: Feature,
}

impl DetectionFeature {
    pub fn from_feature(feature: Feature) -> Self {
        let id = feature.id.as_ref().map(|id| match id {
            Id::String(s) => s.clone(),
            Id::Number(n) => n.to_string(),
        });
        let geometry = feature.geometry.as_ref().and_then(geometry::to_multi_polygon);
        let properties = DetectionProperties::from_properties(feature.properties.as_ref());
        Self {
            id,
            geometry,
            properties,
            source: feature,
        }
    }

    /// The feature as received, including properties this type does not model.
    pub fn source(&self) -> &Feature {
        &self.source
    }
}

/// A detection layer (`detected_polygons.geojson`, `detected_outside.geojson`, or the
/// standalone viewer's `results.geojson`).
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionLayer {
    collection: FeatureCollection,
    features: Vec<DetectionFeature>,
}

impl DetectionLayer {
    pub fn from_collection(collection: FeatureCollection) -> Self {
        let features = collection
            .features
            .iter()
            .cloned()
            .map(DetectionFeature::from_feature)
            .collect();
        Self {
            collection,
            features,
        }
    }

    pub fn features(&self) -> &[DetectionFeature] {
        &self.features
    }

    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn geometries(&self) -> Vec<MultiPolygon<f64>> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{DetectionLayer, DetectionProperties};
    use geojson::{FeatureCollection, GeoJson};

    fn layer(text: &str) -> DetectionLayer {
        let fc = match text.parse::<GeoJson>().unwrap() {
            GeoJson::FeatureCollection(fc) => fc,
            other => panic!("expected collection, got {other:?}"),
        };
        DetectionLayer::from_collection(fc)
    }

    #[test]
    fn reads_numeric_and_string_properties() {
        let l = layer(
            r#"{"type":"FeatureCollection","features":[{
                "type":"Feature","id":3,
                "properties":{"area_m2":1500.5,"mean_depth_m":"2.25","max_depth_m":"deep","volume_m3":null},
                "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}
            }]}"#,
        );
        let f = &l.features()[0];
        assert_eq!(f.id.as_deref(), Some("3"));
        assert!(f.geometry.is_some());
        assert_eq!(
            f.properties,
            DetectionProperties {
                area_m2: Some(1500.5),
                mean_depth_m: Some(2.25),
                max_depth_m: None,
                volume_m3: None,
            }
        );
    }

    #[test]
    fn non_polygonal_geometry_is_kept_without_polygon() {
        let l = layer(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":null,"geometry":{"type":"Point","coordinates":[1,2]}},
                {"type":"Feature","properties":null,"geometry":null}
            ]}"#,
        );
        assert_eq!(l.len(), 2);
        assert!(l.features().iter().all(|f| f.geometry.is_none()));
        assert!(l.geometries().is_empty());
    }

    #[test]
    fn empty_collection_is_empty() {
        let l = DetectionLayer::from_collection(FeatureCollection {
            bbox: None,
            features: Vec::new(),
            foreign_members: None,
        });
        assert!(l.is_empty());
    }
}
