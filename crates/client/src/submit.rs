use std::sync::Arc;

use formats::AoiError;
use foundation::SubmissionId;
use layers::DrawError;
use parking_lot::Mutex;
use runtime::DashboardStore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::{Backend, BackendError};
use crate::config::PollPolicy;
use crate::poll::{poll_for_results, PollOutcome};

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Invalid(#[from] AoiError),
    #[error(transparent)]
    Draw(#[from] DrawError),
    #[error("AOI submission failed: {0}")]
    Backend(#[from] BackendError),
}

/// Owns the single outstanding poll task. Starting a new one aborts the previous task first.
#[derive(Default)]
pub struct PollSupervisor {
    current: Mutex<Option<(SubmissionId, JoinHandle<PollOutcome>)>>,
}

impl PollSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts polling for `submission`. Returns `false` without touching the outstanding task
    /// when `submission` is no longer active or is older than the one already being polled.
    pub fn start(
        &self,
        submission: SubmissionId,
        backend: Arc<dyn Backend>,
        store: Arc<DashboardStore>,
        policy: PollPolicy,
    ) -> bool {
        let mut current = self.current.lock();
        if !store.is_active(submission)
            || current
                .as_ref()
                .is_some_and(|(polling, _)| *polling > submission)
        {
            debug!(%submission, "submission superseded before polling began");
            return false;
        }
        if let Some((previous, handle)) = current.take() {
            debug!(%previous, next = %submission, "aborting superseded poll task");
            handle.abort();
        }
        let handle = tokio::spawn(async move {
            poll_for_results(backend.as_ref(), &store, submission, policy).await
        });
        *current = Some((submission, handle));
        true
    }

    /// Aborts the outstanding poll task; returns the submission it belonged to.
    pub fn cancel(&self) -> Option<SubmissionId> {
        let (submission, handle) = self.current.lock().take()?;
        handle.abort();
        debug!(%submission, "poll task cancelled");
        Some(submission)
    }

    pub fn outstanding(&self) -> Option<SubmissionId> {
        self.current
            .lock()
            .as_ref()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(id, _)| *id)
    }

    /// Waits for the outstanding task. `None` when there is none.
    pub async fn wait(&self) -> Option<PollOutcome> {
        let (submission, handle) = self.current.lock().take()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(err) if err.is_cancelled() => Some(PollOutcome::Superseded { attempts: 0 }),
            Err(err) => {
                warn!(%submission, %err, "poll task failed");
                None
            }
        }
    }
}
