//! Map scenes: the styled overlays a map shows, derived from store state or from classified
//! results, and their export as a single styled GeoJSON document.

use compute::Classification;
use foundation::LonLatBounds;
use formats::{Aoi, DetectionLayer, geometry};
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use runtime::StoreSnapshot;

use crate::layer::OverlayKind;
use crate::popup::{Popup, classification_label};
use crate::symbology::{
    AOI_STYLE, DETECTED_STYLE, LayerStyle, OUTSIDE_STYLE, REFERENCE_AOI_STYLE,
};
use crate::view::{MapView, RESULTS_PADDING};

#[derive(Debug, Clone, PartialEq)]
pub struct StyledFeature {
    pub feature: Feature,
    pub style: LayerStyle,
    pub classification: Option<Classification>,
    pub popup: Option<Popup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub kind: OverlayKind,
    pub features: Vec<StyledFeature>,
}

impl Overlay {
    fn uniform<'a>(
        kind: OverlayKind,
        style: LayerStyle,
        features: impl IntoIterator<Item = &'a Feature>,
    ) -> Self {
        Self {
            kind,
            features: features
                .into_iter()
                .map(|f| StyledFeature {
                    feature: f.clone(),
                    style,
                    classification: None,
                    popup: None,
                })
                .collect(),
        }
    }

    pub fn bounds(&self) -> Option<LonLatBounds> {
        LonLatBounds::from_positions(
            self.features
                .iter()
                .filter_map(|f| f.feature.geometry.as_ref())
                .flat_map(geometry::positions),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapScene {
    pub view: MapView,
    /// Draw order, bottom first.
    pub overlays: Vec<Overlay>,
}

impl MapScene {
    /// Dashboard map: AOI, then detections inside, then detections outside. Absent layers are
    /// skipped.
    pub fn from_snapshot(snapshot: &StoreSnapshot) -> Self {
        let mut overlays = Vec::with_capacity(3);
        if let Some(aoi) = &snapshot.aoi {
            overlays.push(Overlay::uniform(
                OverlayKind::Aoi,
                AOI_STYLE,
                &aoi.collection().features,
            ));
        }
        if let Some(detected) = &snapshot.detected {
            overlays.push(Overlay::uniform(
                OverlayKind::Detected,
                DETECTED_STYLE,
                &detected.collection().features,
            ));
        }
        if let Some(outside) = &snapshot.outside {
            overlays.push(Overlay::uniform(
                OverlayKind::Outside,
                OUTSIDE_STYLE,
                &outside.collection().features,
            ));
        }
        Self {
            view: MapView::for_aoi(snapshot.aoi.as_ref()),
            overlays,
        }
    }

    /// Results viewer: detections styled by classification over a dashed reference AOI, the
    /// view fitted to everything with padding.
    pub fn classified(
        results: &DetectionLayer,
        classes: &[Classification],
        reference: Option<&Aoi>,
    ) -> Self {
        let features = results
            .features()
            .iter()
            .enumerate()
            .map(|(i, det)| {
                let class = classes.get(i).copied().unwrap_or(Classification::Unknown);
                StyledFeature {
                    feature: det.source().clone(),
                    style: LayerStyle::for_classification(class),
                    classification: Some(class),
                    popup: Some(Popup::for_detection(&det.properties, class)),
                }
            })
            .collect();

        let mut overlays = vec![Overlay {
            kind: OverlayKind::Results,
            features,
        }];
        if let Some(aoi) = reference {
            let mut overlay = Overlay::uniform(
                OverlayKind::ReferenceAoi,
                REFERENCE_AOI_STYLE,
                &aoi.collection().features,
            );
            for f in &mut overlay.features {
                f.popup = Some(Popup::for_reference_aoi());
            }
            overlays.push(overlay);
        }

        let mut scene = Self {
            view: MapView::default(),
            overlays,
        };
        if let Some(bounds) = scene.bounds() {
            scene.view = MapView::fitted(bounds, RESULTS_PADDING);
        }
        scene
    }

    pub fn overlay(&self, kind: OverlayKind) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.kind == kind)
    }

    pub fn bounds(&self) -> Option<LonLatBounds> {
        self.overlays
            .iter()
            .filter_map(Overlay::bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// One FeatureCollection in draw order. Each feature keeps its own properties and gains
    /// simplestyle keys plus a `layer` tag; hidden styles are left out.
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features = Vec::new();
        for overlay in &self.overlays {
            for styled in overlay.features.iter().filter(|f| f.style.visible) {
                features.push(export_feature(overlay.kind, styled));
            }
        }
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

fn export_feature(kind: OverlayKind, styled: &StyledFeature) -> Feature {
    let mut feature = styled.feature.clone();
    let mut props = feature.properties.take().unwrap_or_else(JsonObject::new);
    let style = &styled.style;

    props.insert("layer".into(), JsonValue::from(kind.tag()));
    props.insert("stroke".into(), JsonValue::from(style.stroke));
    props.insert("stroke-width".into(), JsonValue::from(style.weight));
    props.insert("stroke-opacity".into(), JsonValue::from(style.stroke_opacity));
    props.insert("fill".into(), JsonValue::from(style.fill_color()));
    props.insert("fill-opacity".into(), JsonValue::from(style.fill_opacity));
    if let Some(dash) = style.dash_array {
        props.insert("stroke-dasharray".into(), JsonValue::from(dash));
    }
    if let Some(class) = styled.classification {
        props.insert("status".into(), JsonValue::from(class.as_str()));
        props.insert(
            "classification".into(),
            JsonValue::from(classification_label(class)),
        );
    }
    if let Some(popup) = &styled.popup {
        props.insert("title".into(), JsonValue::from(popup.title));
        props.insert("description".into(), JsonValue::from(popup.to_text()));
    }

    feature.properties = Some(props);
    feature
}
