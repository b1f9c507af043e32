use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use formats::{Aoi, ComparisonPayload, DemVolumeResult, DetectionLayer};
use geojson::{FeatureCollection, GeoJson};
use parking_lot::Mutex;
use serde_json::{json, Value as JsonValue};

use crate::backend::{Backend, BackendError, BoxFuture};

pub(crate) fn collection(value: JsonValue) -> FeatureCollection {
    match GeoJson::from_json_value(value) {
        Ok(GeoJson::FeatureCollection(fc)) => fc,
        other => panic!("not a collection: {other:?}"),
    }
}

/// Unit square at `x0`, as a single-feature collection.
pub(crate) fn square_collection(x0: f64) -> FeatureCollection {
    let x1 = x0 + 1.0;
    collection(json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {"type": "Polygon", "coordinates": [[[x0,0.0],[x1,0.0],[x1,1.0],[x0,1.0],[x0,0.0]]]}
        }]
    }))
}

pub(crate) fn square_aoi(x0: f64) -> Aoi {
    Aoi::from_collection(square_collection(x0))
}

pub(crate) fn square_layer(x0: f64) -> DetectionLayer {
    DetectionLayer::from_collection(square_collection(x0))
}

pub(crate) fn empty_layer() -> DetectionLayer {
    DetectionLayer::from_collection(collection(json!({"type": "FeatureCollection", "features": []})))
}

/// Scripted backend. The comparison summary becomes ready on the `ready_on`-th fetch.
#[derive(Default)]
pub(crate) struct FakeBackend {
    pub ready_on: Option<u32>,
    pub detected: Option<DetectionLayer>,
    pub outside: Option<DetectionLayer>,
    pub aoi_echo: Option<Aoi>,
    pub fail_outside: bool,
    pub reject_submit: bool,
    /// Delay applied to the first AOI POST only.
    pub first_submit_delay: Option<Duration>,
    pub submit_calls: AtomicU32,
    pub results: Option<DetectionLayer>,
    pub reference_aoi: Option<Aoi>,
    pub dem: Option<DemVolumeResult>,
    pub comparison_calls: AtomicU32,
    pub submitted: Mutex<Vec<Aoi>>,
    pub uploads: Mutex<Vec<(String, usize)>>,
}

impl FakeBackend {
    pub fn comparison_calls(&self) -> u32 {
        self.comparison_calls.load(Ordering::SeqCst)
    }
}

impl Backend for FakeBackend {
    fn fetch_aoi(&self) -> BoxFuture<'_, Result<Option<Aoi>, BackendError>> {
        Box::pin(async move { Ok(self.aoi_echo.clone()) })
    }

    fn fetch_detected(&self) -> BoxFuture<'_, Result<Option<DetectionLayer>, BackendError>> {
        Box::pin(async move { Ok(self.detected.clone()) })
    }

    fn fetch_outside(&self) -> BoxFuture<'_, Result<Option<DetectionLayer>, BackendError>> {
        Box::pin(async move {
            if self.fail_outside {
                return Err(BackendError::Decode {
                    what: "detection layer",
                    reason: "truncated".into(),
                });
            }
            Ok(self.outside.clone())
        })
    }

    fn fetch_comparison(&self) -> BoxFuture<'_, Result<Option<ComparisonPayload>, BackendError>> {
        Box::pin(async move {
            let call = self.comparison_calls.fetch_add(1, Ordering::SeqCst) + 1;
            let ready = self.ready_on.is_some_and(|n| call >= n);
            Ok(Some(if ready {
                ComparisonPayload {
                    detected_area_m2: Some(1000.0),
                    outside_area_m2: Some(250.0),
                    pct_outside: Some(25.0),
                    ..ComparisonPayload::default()
                }
            } else {
                ComparisonPayload::default()
            }))
        })
    }

    fn submit_aoi(&self, aoi: Aoi) -> BoxFuture<'_, Result<JsonValue, BackendError>> {
        Box::pin(async move {
            let call = self.submit_calls.fetch_add(1, Ordering::SeqCst);
            if let (0, Some(delay)) = (call, self.first_submit_delay) {
                tokio::time::sleep(delay).await;
            }
            if self.reject_submit {
                return Err(BackendError::Rejected {
                    status: "500 Internal Server Error".into(),
                    detail: "boom".into(),
                });
            }
            self.submitted.lock().push(aoi);
            Ok(json!({"status": "ok"}))
        })
    }

    fn upload_dem(
        &self,
        file_name: String,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, Result<DemVolumeResult, BackendError>> {
        Box::pin(async move {
            self.uploads.lock().push((file_name, bytes.len()));
            self.dem.clone().ok_or(BackendError::Rejected {
                status: "error".into(),
                detail: "DEM analysis failed".into(),
            })
        })
    }

    fn fetch_results(&self) -> BoxFuture<'_, Result<Option<DetectionLayer>, BackendError>> {
        Box::pin(async move { Ok(self.results.clone()) })
    }

    fn fetch_reference_aoi(&self) -> BoxFuture<'_, Result<Option<Aoi>, BackendError>> {
        Box::pin(async move { Ok(self.reference_aoi.clone()) })
    }
}
