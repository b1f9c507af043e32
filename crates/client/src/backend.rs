//! Backend abstraction for the mining-detection service.
//!
//! `Backend` is the seam between the dashboard logic and the HTTP service: `HttpBackend`
//! talks to the real endpoints, tests use an in-memory fake. GETs return `Ok(None)` when the
//! resource is not there yet (any non-OK status), `Err` only for transport failures and
//! undecodable bodies.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use formats::{Aoi, ComparisonPayload, DemVolumeResult, DetectionLayer, ErrorBody};
use geojson::GeoJson;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::DashboardConfig;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
    #[error("backend rejected the request ({status}): {detail}")]
    Rejected { status: String, detail: String },
    #[error("invalid file: {0}")]
    InvalidFile(String),
    #[error("{0} is not available")]
    Missing(&'static str),
}

pub trait Backend: Send + Sync {
    /// `/data/user_aoi.geojson`
    fn fetch_aoi(&self) -> BoxFuture<'_, Result<Option<Aoi>, BackendError>>;

    /// `/data/detected_polygons.geojson`
    fn fetch_detected(&self) -> BoxFuture<'_, Result<Option<DetectionLayer>, BackendError>>;

    /// `/data/detected_outside.geojson`
    fn fetch_outside(&self) -> BoxFuture<'_, Result<Option<DetectionLayer>, BackendError>>;

    /// `/data/comparison.json`
    fn fetch_comparison(&self) -> BoxFuture<'_, Result<Option<ComparisonPayload>, BackendError>>;

    /// POSTs the AOI collection; the acknowledgment is opaque.
    fn submit_aoi(&self, aoi: Aoi) -> BoxFuture<'_, Result<JsonValue, BackendError>>;

    fn upload_dem(
        &self,
        file_name: String,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, Result<DemVolumeResult, BackendError>>;

    /// `/results.geojson`, input of the standalone results viewer.
    fn fetch_results(&self) -> BoxFuture<'_, Result<Option<DetectionLayer>, BackendError>>;

    /// `/data/aoi.geojson`, the reference boundary for the results viewer.
    fn fetch_reference_aoi(&self) -> BoxFuture<'_, Result<Option<Aoi>, BackendError>>;
}

pub const AOI_ECHO_PATH: &str = "/data/user_aoi.geojson";
pub const AOI_SUBMIT_PATH: &str = "/data/user_aoi";
pub const DETECTED_PATH: &str = "/data/detected_polygons.geojson";
pub const OUTSIDE_PATH: &str = "/data/detected_outside.geojson";
pub const COMPARISON_PATH: &str = "/data/comparison.json";
pub const DEM_UPLOAD_PATH: &str = "/upload-dem/";
pub const RESULTS_PATH: &str = "/results.geojson";
pub const REFERENCE_AOI_PATH: &str = "/data/aoi.geojson";

pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| BackendError::Transport {
                url: base_url.clone(),
                source,
            })?;
        Ok(Self { base_url, client })
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, BackendError> {
        Self::new(config.base_url(), config.http_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json(&self, path: &str) -> Result<Option<JsonValue>, BackendError> {
        let url = self.url(path);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| BackendError::Transport {
                url: url.clone(),
                source,
            })?;

        if !resp.status().is_success() {
            debug!(%url, status = %resp.status(), "resource not available");
            return Ok(None);
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|source| BackendError::Transport { url, source })?;
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| BackendError::Decode {
                what: "JSON body",
                reason: e.to_string(),
            })
    }

    async fn get_layer(&self, path: &str) -> Result<Option<DetectionLayer>, BackendError> {
        let Some(value) = self.get_json(path).await? else {
            return Ok(None);
        };
        match GeoJson::from_json_value(value) {
            Ok(GeoJson::FeatureCollection(fc)) => Ok(Some(DetectionLayer::from_collection(fc))),
            Ok(_) => Err(BackendError::Decode {
                what: "detection layer",
                reason: "expected a FeatureCollection".to_string(),
            }),
            Err(e) => Err(BackendError::Decode {
                what: "detection layer",
                reason: e.to_string(),
            }),
        }
    }

    async fn get_aoi(&self, path: &str) -> Result<Option<Aoi>, BackendError> {
        let Some(value) = self.get_json(path).await? else {
            return Ok(None);
        };
        Aoi::from_json_value(value)
            .map(Some)
            .map_err(|e| BackendError::Decode {
                what: "AOI",
                reason: e.to_string(),
            })
    }
}

impl Backend for HttpBackend {
    fn fetch_aoi(&self) -> BoxFuture<'_, Result<Option<Aoi>, BackendError>> {
        Box::pin(self.get_aoi(AOI_ECHO_PATH))
    }

    fn fetch_detected(&self) -> BoxFuture<'_, Result<Option<DetectionLayer>, BackendError>> {
        Box::pin(self.get_layer(DETECTED_PATH))
    }

    fn fetch_outside(&self) -> BoxFuture<'_, Result<Option<DetectionLayer>, BackendError>> {
        Box::pin(self.get_layer(OUTSIDE_PATH))
    }

    fn fetch_comparison(&self) -> BoxFuture<'_, Result<Option<ComparisonPayload>, BackendError>> {
        Box::pin(async move {
            let Some(value) = self.get_json(COMPARISON_PATH).await? else {
                return Ok(None);
            };
            serde_json::from_value(value)
                .map(Some)
                .map_err(|e| BackendError::Decode {
                    what: "comparison summary",
                    reason: e.to_string(),
                })
        })
    }

    fn submit_aoi(&self, aoi: Aoi) -> BoxFuture<'_, Result<JsonValue, BackendError>> {
        Box::pin(async move {
            let url = self.url(AOI_SUBMIT_PATH);
            let resp = self
                .client
                .post(&url)
                .json(aoi.collection())
                .send()
                .await
                .map_err(|source| BackendError::Transport {
                    url: url.clone(),
                    source,
                })?;

            let status = resp.status();
            let bytes = resp
                .bytes()
                .await
                .map_err(|source| BackendError::Transport { url, source })?;
            if !status.is_success() {
                return Err(rejection(status, &bytes));
            }
            Ok(serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null))
        })
    }

    fn upload_dem(
        &self,
        file_name: String,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, Result<DemVolumeResult, BackendError>> {
        Box::pin(async move {
            let url = self.url(DEM_UPLOAD_PATH);
            let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
            let form = reqwest::multipart::Form::new().part("file", part);
            let resp = self
                .client
                .post(&url)
                .multipart(form)
                .send()
                .await
                .map_err(|source| BackendError::Transport {
                    url: url.clone(),
                    source,
                })?;

            let status = resp.status();
            let body = resp
                .bytes()
                .await
                .map_err(|source| BackendError::Transport { url, source })?;
            if !status.is_success() {
                return Err(rejection(status, &body));
            }

            let value: JsonValue =
                serde_json::from_slice(&body).map_err(|e| BackendError::Decode {
                    what: "DEM result",
                    reason: e.to_string(),
                })?;
            if value.get("status").and_then(JsonValue::as_str) == Some("error") {
                return Err(rejection(status, &body));
            }
            serde_json::from_value(value).map_err(|e| BackendError::Decode {
                what: "DEM result",
                reason: e.to_string(),
            })
        })
    }

    fn fetch_results(&self) -> BoxFuture<'_, Result<Option<DetectionLayer>, BackendError>> {
        Box::pin(self.get_layer(RESULTS_PATH))
    }

    fn fetch_reference_aoi(&self) -> BoxFuture<'_, Result<Option<Aoi>, BackendError>> {
        Box::pin(self.get_aoi(REFERENCE_AOI_PATH))
    }
}

fn rejection(status: reqwest::StatusCode, body: &[u8]) -> BackendError {
    let parsed: Option<ErrorBody> = serde_json::from_slice(body).ok();
    let detail = parsed
        .as_ref()
        .and_then(|b| b.detail.clone())
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());
    let status = parsed
        .and_then(|b| b.status)
        .unwrap_or_else(|| status.to_string());
    BackendError::Rejected {
        status,
        detail: if detail.is_empty() {
            "no detail provided".to_string()
        } else {
            detail
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{Backend, BackendError, HttpBackend};
    use axum::extract::Multipart;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use formats::Aoi;
    use serde_json::{json, Value};
    use std::time::Duration;

    async fn serve(router: Router) -> HttpBackend {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        HttpBackend::new(format!("http://{addr}"), Duration::from_secs(5)).unwrap()
    }

    fn square() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"area_m2": "1200.5"},
                "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}
            }]
        })
    }

    #[tokio::test]
    async fn missing_resources_are_absent() {
        let backend = serve(Router::new()).await;
        assert!(backend.fetch_detected().await.unwrap().is_none());
        assert!(backend.fetch_comparison().await.unwrap().is_none());
        assert!(backend.fetch_aoi().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn decodes_layers_and_summary() {
        let router = Router::new()
            .route("/data/detected_polygons.geojson", get(|| async { Json(square()) }))
            .route(
                "/data/comparison.json",
                get(|| async {
                    Json(json!({"detected_area_m2": 2000.0, "outside_area_m2": 500.0, "pct_outside": 25.0}))
                }),
            );
        let backend = serve(router).await;

        let layer = backend.fetch_detected().await.unwrap().unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.features()[0].properties.area_m2, Some(1200.5));

        let summary = backend
            .fetch_comparison()
            .await
            .unwrap()
            .unwrap()
            .into_summary()
            .unwrap();
        assert_eq!(summary.pct_outside, 25.0);
    }

    #[tokio::test]
    async fn undecodable_body_is_an_error() {
        let router = Router::new().route(
            "/data/detected_outside.geojson",
            get(|| async { "not json" }),
        );
        let backend = serve(router).await;
        assert!(matches!(
            backend.fetch_outside().await,
            Err(BackendError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn submit_posts_collection_and_surfaces_rejection() {
        let router = Router::new().route(
            "/data/user_aoi",
            post(|Json(body): Json<Value>| async move {
                if body["type"] == "FeatureCollection" && body["features"].as_array().map(Vec::len) == Some(1) {
                    (StatusCode::OK, Json(json!({"status": "ok"})))
                } else {
                    (StatusCode::BAD_REQUEST, Json(json!({"status": "error", "detail": "bad aoi"})))
                }
            }),
        );
        let backend = serve(router).await;

        let aoi = Aoi::from_json_value(square()).unwrap();
        let ack = backend.submit_aoi(aoi).await.unwrap();
        assert_eq!(ack, json!({"status": "ok"}));

        let empty = Aoi::from_json_value(json!({"type": "FeatureCollection", "features": []})).unwrap();
        match backend.submit_aoi(empty).await {
            Err(BackendError::Rejected { status, detail }) => {
                assert_eq!(status, "error");
                assert_eq!(detail, "bad aoi");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn dem_upload_sends_file_field() {
        let router = Router::new().route(
            "/upload-dem/",
            post(|mut multipart: Multipart| async move {
                let mut name = None;
                while let Some(field) = multipart.next_field().await.unwrap() {
                    if field.name() == Some("file") {
                        name = field.file_name().map(str::to_string);
                    }
                }
                match name.as_deref() {
                    Some("site.tif") => Json(json!({
                        "status": "success", "volume_m3": -1500.0, "max_diff": 2.0,
                        "min_diff": -8.0, "mean_diff": -1.25
                    })),
                    _ => Json(json!({"status": "error", "detail": "No file uploaded"})),
                }
            }),
        );
        let backend = serve(router).await;

        let result = backend
            .upload_dem("site.tif".into(), vec![1, 2, 3])
            .await
            .unwrap();
        assert_eq!(result.volume_m3, Some(-1500.0));
        assert_eq!(result.mean_diff, Some(-1.25));

        match backend.upload_dem("other.tif".into(), vec![0]).await {
            Err(BackendError::Rejected { detail, .. }) => assert_eq!(detail, "No file uploaded"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
