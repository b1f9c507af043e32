use std::path::Path;

use formats::{is_dem_file_name, DemVolumeResult};
use tracing::info;

use crate::backend::{Backend, BackendError};

/// Reads a GeoTIFF from disk and uploads it. The extension is checked before anything is read
/// or sent.
pub async fn upload_dem_file(
    backend: &dyn Backend,
    path: &Path,
) -> Result<DemVolumeResult, BackendError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BackendError::InvalidFile(format!("{}: no file name", path.display())))?;
    if !is_dem_file_name(name) {
        return Err(BackendError::InvalidFile(format!(
            "{name}: only .tif and .tiff files are accepted"
        )));
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| BackendError::InvalidFile(format!("{}: {e}", path.display())))?;
    info!(file = name, bytes = bytes.len(), "uploading DEM");
    let result = backend.upload_dem(name.to_string(), bytes).await?;
    info!(volume_m3 = ?result.volume_m3, "DEM analysis finished");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::upload_dem_file;
    use crate::backend::BackendError;
    use crate::testing::FakeBackend;
    use formats::DemVolumeResult;
    use std::io::Write;

    #[tokio::test]
    async fn rejects_non_tiff_without_uploading() {
        let backend = FakeBackend::default();
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"png").unwrap();

        let err = upload_dem_file(&backend, file.path()).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidFile(_)));
        assert!(backend.uploads.lock().is_empty());
    }

    #[tokio::test]
    async fn uploads_file_contents() {
        let backend = FakeBackend {
            dem: Some(DemVolumeResult {
                volume_m3: Some(42.0),
                ..DemVolumeResult::default()
            }),
            ..FakeBackend::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.TIF");
        std::fs::write(&path, [0u8; 16]).unwrap();

        let result = upload_dem_file(&backend, &path).await.unwrap();
        assert_eq!(result.volume_m3, Some(42.0));
        assert_eq!(backend.uploads.lock().as_slice(), &[("site.TIF".to_string(), 16)]);
    }

    #[tokio::test]
    async fn surfaces_backend_detail() {
        let backend = FakeBackend::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.tiff");
        std::fs::write(&path, [1u8; 4]).unwrap();

        match upload_dem_file(&backend, &path).await {
            Err(BackendError::Rejected { detail, .. }) => assert_eq!(detail, "DEM analysis failed"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
