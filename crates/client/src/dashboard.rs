//! The dashboard session: store, backend and poll supervisor wired together.

use std::path::Path;
use std::sync::Arc;

use formats::{Aoi, DemVolumeResult};
use foundation::SubmissionId;
use layers::{DrawAction, DrawEvent, DrawTool, MapScene};
use runtime::{DashboardStore, StoreSnapshot};
use tracing::{info, warn};

use crate::backend::{Backend, BackendError};
use crate::config::PollPolicy;
use crate::dem::upload_dem_file;
use crate::poll::{fetch_attempt, PollOutcome};
use crate::submit::{PollSupervisor, SubmissionError};

pub struct Dashboard {
    backend: Arc<dyn Backend>,
    store: Arc<DashboardStore>,
    supervisor: PollSupervisor,
    policy: PollPolicy,
    draw: DrawTool,
}

impl Dashboard {
    pub fn new(backend: Arc<dyn Backend>, policy: PollPolicy) -> Self {
        Self {
            backend,
            store: Arc::new(DashboardStore::new()),
            supervisor: PollSupervisor::new(),
            policy,
            draw: DrawTool::new(),
        }
    }

    pub fn store(&self) -> &Arc<DashboardStore> {
        &self.store
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    pub fn scene(&self) -> MapScene {
        MapScene::from_snapshot(&self.store.snapshot())
    }

    /// Initial mount: one fetch of the four data endpoints, applied under a fresh submission id.
    pub async fn load_initial(&self) -> SubmissionId {
        let id = self.store.begin_refresh();
        let update = fetch_attempt(self.backend.as_ref()).await;
        if let Err(err) = self.store.apply_poll_update(id, update) {
            warn!(%err, "initial load superseded");
        }
        id
    }

    /// Validates uploaded file contents and submits them. Invalid input sends nothing and
    /// leaves the store untouched.
    pub async fn submit_aoi_text(&self, text: &str) -> Result<SubmissionId, SubmissionError> {
        let aoi = Aoi::parse(text)?;
        self.submit_aoi(aoi).await
    }

    /// Replaces the AOI locally, POSTs it, and starts polling for the new results. A failed
    /// POST starts no poll task; the AOI stays replaced.
    pub async fn submit_aoi(&self, aoi: Aoi) -> Result<SubmissionId, SubmissionError> {
        self.supervisor.cancel();
        let id = self.store.replace_aoi(aoi.clone());
        info!(submission = %id, features = aoi.feature_count(), "submitting AOI");

        if let Err(err) = self.backend.submit_aoi(aoi).await {
            warn!(submission = %id, %err, "AOI submission failed");
            return Err(err.into());
        }

        if !self
            .supervisor
            .start(id, self.backend.clone(), self.store.clone(), self.policy)
        {
            info!(submission = %id, "newer AOI submitted while posting; not polling");
        }
        Ok(id)
    }

    /// Applies a map drawing event. Returns the new submission for a created polygon and
    /// `None` after a deletion.
    pub async fn handle_draw_event(
        &self,
        event: DrawEvent,
    ) -> Result<Option<SubmissionId>, SubmissionError> {
        match self.draw.handle(event)? {
            DrawAction::Submit(aoi) => self.submit_aoi(aoi).await.map(Some),
            DrawAction::CancelAndClear => {
                self.supervisor.cancel();
                self.store.clear_aoi();
                info!("drawn AOI deleted");
                Ok(None)
            }
        }
    }

    /// Waits for the outstanding poll task, if any.
    pub async fn wait_for_results(&self) -> Option<PollOutcome> {
        self.supervisor.wait().await
    }

    pub async fn upload_dem(&self, path: &Path) -> Result<DemVolumeResult, BackendError> {
        let result = upload_dem_file(self.backend.as_ref(), path).await?;
        self.store.set_dem_result(result.clone());
        Ok(result)
    }
}
