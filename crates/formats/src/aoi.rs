//! Area of Interest input normalization.
//!
//! The backend only accepts a GeoJSON `FeatureCollection`. Uploaded files may hold either a
//! `Feature` or a `FeatureCollection`; a bare `Feature` is wrapped into a single-feature
//! collection so both produce the same payload. Anything else is rejected before any request
//! is made.

use geo_types::Polygon;
use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::Value as JsonValue;

use crate::geometry;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AoiError {
    #[error("Invalid file or JSON: {0}")]
    InvalidJson(String),
    #[error("Invalid GeoJSON: must be a Feature or FeatureCollection (got {0})")]
    UnsupportedType(String),
    #[error("Invalid GeoJSON: {0}")]
    Malformed(String),
}

/// A validated AOI, always held as a `FeatureCollection`.
#[derive(Debug, Clone, PartialEq)]
pub struct Aoi {
    collection: FeatureCollection,
}

impl Aoi {
    /// Parses uploaded file contents.
    pub fn parse(text: &str) -> Result<Self, AoiError> {
        let value: JsonValue =
            serde_json::from_str(text).map_err(|e| AoiError::InvalidJson(e.to_string()))?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: JsonValue) -> Result<Self, AoiError> {
        let typ = value
            .as_object()
            .ok_or_else(|| AoiError::InvalidJson("expected a JSON object".to_string()))?
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| AoiError::UnsupportedType("no type".to_string()))?
            .to_string();

        if typ != "Feature" && typ != "FeatureCollection" {
            return Err(AoiError::UnsupportedType(typ));
        }

        match GeoJson::from_json_value(value).map_err(|e| AoiError::Malformed(e.to_string()))? {
            GeoJson::Feature(feature) => Ok(Self::from_feature(feature)),
            GeoJson::FeatureCollection(collection) => Ok(Self::from_collection(collection)),
            GeoJson::Geometry(_) => Err(AoiError::UnsupportedType(typ)),
        }
    }

    pub fn from_feature(feature: Feature) -> Self {
        Self::from_collection(FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        })
    }

    pub fn from_collection(collection: FeatureCollection) -> Self {
        Self { collection }
    }

    /// The exact payload POSTed to the backend.
    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    pub fn into_collection(self) -> FeatureCollection {
        self.collection
    }

    pub fn feature_count(&self) -> usize {
        self.collection.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.features.is_empty()
    }

    /// All polygonal members of all features, flattened.
    pub fn polygons(&self) -> Vec<Polygon<f64>> {
        self.collection
            .features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .filter_map(geometry::to_multi_polygon)
            .flat_map(|mp| mp.0)
            .collect()
    }

    /// Outer ring of the first feature, `[lon, lat]` per position.
    pub fn first_outer_ring(&self) -> Option<Vec<[f64; 2]>> {
        let geom = self.collection.features.first()?.geometry.as_ref()?;
        geometry::first_outer_ring(geom)
    }
}
