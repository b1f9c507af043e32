//! Polygon-only drawing tool.
//!
//! A created polygon becomes the new AOI and is submitted right away; deleting the drawing
//! cancels the outstanding poll and clears the AOI locally. Every other shape the map toolbar
//! could offer is refused.

use formats::{Aoi, AoiError};
use geojson::{Feature, Value};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawnShape {
    Polygon(Feature),
    Rectangle,
    Circle,
    CircleMarker,
    Marker,
    Polyline,
    Other,
}

impl DrawnShape {
    /// Infers the shape from a drawn feature's geometry. A `shape` property of `rectangle` or
    /// `circlemarker` names the tool that drew it; other points carrying a `radius` are circles.
    pub fn from_feature(feature: Feature) -> Self {
        let tool = feature
            .property("shape")
            .and_then(|v| v.as_str())
            .map(str::to_ascii_lowercase);
        let is_circle = feature.property("radius").is_some();
        match (feature.geometry.as_ref().map(|g| &g.value), tool.as_deref()) {
            (Some(Value::Polygon(_)), Some("rectangle")) => DrawnShape::Rectangle,
            (Some(Value::Point(_)), Some("circlemarker")) => DrawnShape::CircleMarker,
            (Some(Value::Polygon(_)), _) => DrawnShape::Polygon(feature),
            (Some(Value::Point(_)), _) if is_circle => DrawnShape::Circle,
            (Some(Value::Point(_)) | Some(Value::MultiPoint(_)), _) => DrawnShape::Marker,
            (Some(Value::LineString(_)) | Some(Value::MultiLineString(_)), _) => {
                DrawnShape::Polyline
            }
            _ => DrawnShape::Other,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            DrawnShape::Polygon(_) => "polygon",
            DrawnShape::Rectangle => "rectangle",
            DrawnShape::Circle => "circle",
            DrawnShape::CircleMarker => "circlemarker",
            DrawnShape::Marker => "marker",
            DrawnShape::Polyline => "polyline",
            DrawnShape::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    Created(DrawnShape),
    Deleted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawAction {
    /// Overwrite the active AOI and submit it.
    Submit(Aoi),
    /// Cancel the outstanding poll and clear the active AOI; the backend is not contacted.
    CancelAndClear,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DrawError {
    #[error("only polygons can be drawn (got {0})")]
    UnsupportedShape(&'static str),
    #[error(transparent)]
    Aoi(#[from] AoiError),
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DrawTool;

impl DrawTool {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: DrawEvent) -> Result<DrawAction, DrawError> {
        match event {
            DrawEvent::Created(DrawnShape::Polygon(feature)) => {
                let ring_len = match feature.geometry.as_ref().map(|g| &g.value) {
                    Some(Value::Polygon(rings)) => rings.first().map_or(0, Vec::len),
                    _ => 0,
                };
                // A closed triangle is the smallest drawable polygon.
                if ring_len < 4 {
                    return Err(AoiError::Malformed(format!(
                        "polygon ring has {ring_len} positions"
                    ))
                    .into());
                }
                debug!(positions = ring_len, "polygon drawn");
                Ok(DrawAction::Submit(Aoi::from_feature(feature)))
            }
            DrawEvent::Created(other) => {
                debug!(kind = other.kind(), "rejected drawn shape");
                Err(DrawError::UnsupportedShape(other.kind()))
            }
            DrawEvent::Deleted => Ok(DrawAction::CancelAndClear),
        }
    }
}
