use formats::{Aoi, ComparisonPayload, ComparisonSummary, DetectionLayer};
use foundation::SubmissionId;
use runtime::{DashboardStore, PollUpdate};
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendError};
use crate::config::PollPolicy;

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// A summary with a defined detected area was observed on attempt `attempts`.
    Completed {
        attempts: u32,
        summary: ComparisonSummary,
    },
    /// The attempt budget ran out; whatever was applied along the way stays.
    Exhausted { attempts: u32 },
    /// A newer submission took over; nothing further was written.
    Superseded { attempts: u32 },
}

impl PollOutcome {
    pub fn summary(&self) -> Option<&ComparisonSummary> {
        match self {
            PollOutcome::Completed { summary, .. } => Some(summary),
            _ => None,
        }
    }
}

/// One attempt: the four endpoints fetched concurrently. Failed fetches and empty collections
/// count as absent.
pub async fn fetch_attempt(backend: &dyn Backend) -> PollUpdate {
    let (detected, outside, comparison, aoi) = tokio::join!(
        backend.fetch_detected(),
        backend.fetch_outside(),
        backend.fetch_comparison(),
        backend.fetch_aoi(),
    );
    PollUpdate {
        detected: settle(detected, "detected").filter(|l: &DetectionLayer| !l.is_empty()),
        outside: settle(outside, "outside").filter(|l: &DetectionLayer| !l.is_empty()),
        aoi: settle(aoi, "aoi").filter(|a: &Aoi| !a.is_empty()),
        summary: settle(comparison, "comparison").and_then(ComparisonPayload::into_summary),
    }
}

fn settle<T>(result: Result<Option<T>, BackendError>, what: &'static str) -> Option<T> {
    match result {
        Ok(value) => value,
        Err(err) => {
            warn!(what, %err, "fetch failed");
            None
        }
    }
}

/// Polls until the summary is ready, the budget runs out, or `submission` is superseded.
pub async fn poll_for_results(
    backend: &dyn Backend,
    store: &DashboardStore,
    submission: SubmissionId,
    policy: PollPolicy,
) -> PollOutcome {
    let mut attempts = 0;
    while attempts < policy.max_attempts {
        if !store.is_active(submission) {
            return PollOutcome::Superseded { attempts };
        }
        attempts += 1;

        let update = fetch_attempt(backend).await;
        let summary = update.summary.clone();
        if store.apply_poll_update(submission, update).is_err() {
            return PollOutcome::Superseded { attempts };
        }

        if let Some(summary) = summary {
            info!(%submission, attempts, pct_outside = summary.pct_outside, "results ready");
            return PollOutcome::Completed { attempts, summary };
        }
        debug!(%submission, attempt = attempts, "results not ready");

        if attempts < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    debug!(%submission, attempts, "poll budget exhausted");
    PollOutcome::Exhausted { attempts }
}

#[cfg(test)]
mod tests {
    use super::{fetch_attempt, poll_for_results, PollOutcome};
    use crate::config::PollPolicy;
    use crate::testing::{empty_layer, square_aoi, square_layer, FakeBackend};
    use runtime::DashboardStore;
    use std::time::Duration;

    fn policy() -> PollPolicy {
        PollPolicy {
            max_attempts: 20,
            interval: Duration::from_millis(500),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_the_attempt_that_sees_the_summary() {
        let backend = FakeBackend {
            ready_on: Some(3),
            ..FakeBackend::default()
        };
        let store = DashboardStore::new();
        let id = store.replace_aoi(square_aoi(0.0));

        let start = tokio::time::Instant::now();
        let outcome = poll_for_results(&backend, &store, id, policy()).await;
        match outcome {
            PollOutcome::Completed { attempts, summary } => {
                assert_eq!(attempts, 3);
                assert_eq!(summary.detected_area_m2, 1000.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(backend.comparison_calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
        assert!(store.snapshot().summary.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_leaves_stats_unchanged() {
        let backend = FakeBackend::default();
        let store = DashboardStore::new();
        let id = store.replace_aoi(square_aoi(0.0));

        let outcome = poll_for_results(&backend, &store, id, policy()).await;
        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 20 });
        assert_eq!(backend.comparison_calls(), 20);
        assert!(store.snapshot().summary.is_none());
    }

    #[tokio::test]
    async fn partial_responses_are_applied_independently() {
        let backend = FakeBackend {
            detected: Some(square_layer(0.0)),
            outside: Some(square_layer(3.0)),
            fail_outside: true,
            aoi_echo: None,
            ..FakeBackend::default()
        };
        let update = fetch_attempt(&backend).await;
        assert!(update.detected.is_some());
        assert!(update.outside.is_none());
        assert!(update.aoi.is_none());
        assert!(update.summary.is_none());
    }

    #[tokio::test]
    async fn empty_collections_count_as_absent() {
        let backend = FakeBackend {
            detected: Some(empty_layer()),
            ..FakeBackend::default()
        };
        assert!(fetch_attempt(&backend).await.detected.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_submission_stops_polling() {
        let backend = FakeBackend::default();
        let store = DashboardStore::new();
        let first = store.replace_aoi(square_aoi(0.0));
        store.replace_aoi(square_aoi(5.0));

        let outcome = poll_for_results(&backend, &store, first, policy()).await;
        assert_eq!(outcome, PollOutcome::Superseded { attempts: 0 });
        assert_eq!(backend.comparison_calls(), 0);
    }
}
