//! Dashboard state: the active AOI, the detection layers and summary produced for it, and the
//! latest DEM result.
//!
//! Writers:
//! - `aoi`: `replace_aoi` / `clear_aoi`, plus the AOI echo inside `apply_poll_update`;
//! - `detected`, `outside`, `summary`: `apply_poll_update` only;
//! - `dem`: `set_dem_result` only.
//!
//! Every `replace_aoi` / `begin_refresh` issues a new [`SubmissionId`] and makes it the only id
//! allowed to apply poll updates. Updates carrying any other id are rejected, so a superseded
//! poll task cannot overwrite newer state.

use formats::{Aoi, ComparisonSummary, DemVolumeResult, DetectionLayer};
use foundation::SubmissionId;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::event_bus::{Event, EventLog};

/// Responses gathered by one poll attempt. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct PollUpdate {
    pub detected: Option<DetectionLayer>,
    pub outside: Option<DetectionLayer>,
    pub aoi: Option<Aoi>,
    pub summary: Option<ComparisonSummary>,
}

impl PollUpdate {
    pub fn is_empty(&self) -> bool {
        self.detected.is_none() && self.outside.is_none() && self.aoi.is_none() && self.summary.is_none()
    }
}

/// Which fields an applied update wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    pub detected: bool,
    pub outside: bool,
    pub aoi: bool,
    pub summary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("submission {submission} is no longer active")]
pub struct StaleSubmission {
    pub submission: SubmissionId,
    pub active: Option<SubmissionId>,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: Option<T>,
    written_by: Option<SubmissionId>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            written_by: None,
        }
    }
}

impl<T> Slot<T> {
    fn set(&mut self, value: T, by: SubmissionId) {
        self.value = Some(value);
        self.written_by = Some(by);
    }
}

#[derive(Debug, Default)]
struct StoreState {
    last_issued: Option<SubmissionId>,
    active: Option<SubmissionId>,
    /// Submission that produced the current AOI.
    aoi_set_by: Option<SubmissionId>,
    aoi: Slot<Aoi>,
    detected: Slot<DetectionLayer>,
    outside: Slot<DetectionLayer>,
    summary: Slot<ComparisonSummary>,
    dem: Option<DemVolumeResult>,
}

impl StoreState {
    fn issue(&mut self) -> SubmissionId {
        let id = match self.last_issued {
            Some(prev) => prev.next(),
            None => SubmissionId::new(1),
        };
        self.last_issued = Some(id);
        self.active = Some(id);
        id
    }

    fn is_stale<T>(&self, slot: &Slot<T>) -> bool {
        match (slot.value.as_ref(), slot.written_by, self.aoi_set_by) {
            (Some(_), Some(written), Some(aoi)) => written < aoi,
            _ => false,
        }
    }
}

/// Point-in-time copy of the dashboard state.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub active_submission: Option<SubmissionId>,
    pub aoi: Option<Aoi>,
    pub detected: Option<DetectionLayer>,
    pub outside: Option<DetectionLayer>,
    pub summary: Option<ComparisonSummary>,
    pub dem: Option<DemVolumeResult>,
    /// True when the cached layers or summary were produced for an earlier AOI.
    pub results_stale: bool,
}

#[derive(Debug, Default)]
pub struct DashboardStore {
    state: RwLock<StoreState>,
    log: Mutex<EventLog>,
}

impl DashboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `aoi` the active AOI. Cached layers and summary become stale until a poll update
    /// for the returned submission arrives.
    pub fn replace_aoi(&self, aoi: Aoi) -> SubmissionId {
        let mut state = self.state.write();
        let id = state.issue();
        let features = aoi.feature_count();
        state.aoi.set(aoi, id);
        state.aoi_set_by = Some(id);
        self.log
            .lock()
            .emit(Some(id), "aoi", format!("replaced ({features} features)"));
        debug!(submission = %id, features, "AOI replaced");
        id
    }

    /// Issues a submission id for loading existing backend state without changing the AOI.
    pub fn begin_refresh(&self) -> SubmissionId {
        let mut state = self.state.write();
        let id = state.issue();
        self.log.lock().emit(Some(id), "refresh", "started");
        id
    }

    /// Drops the active AOI; no submission stays active.
    pub fn clear_aoi(&self) {
        let mut state = self.state.write();
        let previous = state.active.take();
        state.aoi = Slot::default();
        state.aoi_set_by = state.last_issued;
        self.log.lock().emit(previous, "aoi", "cleared");
    }

    pub fn active_submission(&self) -> Option<SubmissionId> {
        self.state.read().active
    }

    pub fn is_active(&self, submission: SubmissionId) -> bool {
        self.state.read().active == Some(submission)
    }

    pub fn apply_poll_update(
        &self,
        submission: SubmissionId,
        update: PollUpdate,
    ) -> Result<Applied, StaleSubmission> {
        let mut state = self.state.write();
        if state.active != Some(submission) {
            let err = StaleSubmission {
                submission,
                active: state.active,
            };
            warn!(%submission, active = ?state.active, "rejected poll update from superseded submission");
            self.log
                .lock()
                .emit(Some(submission), "rejected", "poll update from superseded submission");
            return Err(err);
        }

        let mut applied = Applied::default();
        if let Some(aoi) = update.aoi {
            if state.aoi.value.as_ref() != Some(&aoi) {
                state.aoi_set_by = Some(submission);
            }
            state.aoi.set(aoi, submission);
            applied.aoi = true;
        }
        if let Some(detected) = update.detected {
            state.detected.set(detected, submission);
            applied.detected = true;
        }
        if let Some(outside) = update.outside {
            state.outside.set(outside, submission);
            applied.outside = true;
        }
        if let Some(summary) = update.summary {
            state.summary.set(summary, submission);
            applied.summary = true;
        }

        if applied != Applied::default() {
            self.log.lock().emit(
                Some(submission),
                "poll",
                format!(
                    "applied detected={} outside={} aoi={} summary={}",
                    applied.detected, applied.outside, applied.aoi, applied.summary
                ),
            );
        }
        Ok(applied)
    }

    pub fn set_dem_result(&self, result: DemVolumeResult) {
        self.state.write().dem = Some(result);
        self.log.lock().emit(None, "dem", "stored");
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read();
        StoreSnapshot {
            active_submission: state.active,
            aoi: state.aoi.value.clone(),
            detected: state.detected.value.clone(),
            outside: state.outside.value.clone(),
            summary: state.summary.value.clone(),
            dem: state.dem.clone(),
            results_stale: state.is_stale(&state.detected)
                || state.is_stale(&state.outside)
                || state.is_stale(&state.summary),
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().events().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::{Applied, DashboardStore, PollUpdate, StaleSubmission};
    use formats::{Aoi, ComparisonSummary, DemVolumeResult};
    use pretty_assertions::assert_eq;

    fn aoi(lon: f64) -> Aoi {
        Aoi::parse(&format!(
            r#"{{"type":"Feature","properties":{{}},"geometry":{{"type":"Polygon",
                "coordinates":[[[{lon},0],[{lon2},0],[{lon2},1],[{lon},1],[{lon},0]]]}}}}"#,
            lon = lon,
            lon2 = lon + 1.0
        ))
        .unwrap()
    }

    fn summary(detected: f64) -> ComparisonSummary {
        ComparisonSummary {
            detected_area_m2: detected,
            outside_area_m2: 0.0,
            pct_outside: 0.0,
            time_start: None,
            time_end: None,
        }
    }

    #[test]
    fn superseded_submission_cannot_write() {
        let store = DashboardStore::new();
        let first = store.replace_aoi(aoi(0.0));
        let second = store.replace_aoi(aoi(5.0));
        assert!(second > first);

        let err = store
            .apply_poll_update(
                first,
                PollUpdate {
                    summary: Some(summary(1.0)),
                    ..PollUpdate::default()
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            StaleSubmission {
                submission: first,
                active: Some(second)
            }
        );
        assert!(store.snapshot().summary.is_none());

        let applied = store
            .apply_poll_update(
                second,
                PollUpdate {
                    summary: Some(summary(2.0)),
                    ..PollUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(
            applied,
            Applied {
                summary: true,
                ..Applied::default()
            }
        );
        assert_eq!(store.snapshot().summary, Some(summary(2.0)));
        assert!(store.events().iter().any(|e| e.kind == "rejected"));
    }

    #[test]
    fn replacing_aoi_marks_results_stale_until_refreshed() {
        let store = DashboardStore::new();
        let first = store.replace_aoi(aoi(0.0));
        store
            .apply_poll_update(
                first,
                PollUpdate {
                    summary: Some(summary(1.0)),
                    ..PollUpdate::default()
                },
            )
            .unwrap();
        assert!(!store.snapshot().results_stale);

        let second = store.replace_aoi(aoi(5.0));
        let snap = store.snapshot();
        assert!(snap.results_stale);
        assert_eq!(snap.summary, Some(summary(1.0)));

        store
            .apply_poll_update(
                second,
                PollUpdate {
                    summary: Some(summary(3.0)),
                    ..PollUpdate::default()
                },
            )
            .unwrap();
        assert!(!store.snapshot().results_stale);
    }

    #[test]
    fn clear_deactivates_submission() {
        let store = DashboardStore::new();
        let id = store.replace_aoi(aoi(0.0));
        store.clear_aoi();
        assert!(store.snapshot().aoi.is_none());
        assert!(!store.is_active(id));
        assert!(store.apply_poll_update(id, PollUpdate::default()).is_err());
    }

    #[test]
    fn refresh_can_load_aoi_echo() {
        let store = DashboardStore::new();
        let id = store.begin_refresh();
        let applied = store
            .apply_poll_update(
                id,
                PollUpdate {
                    aoi: Some(aoi(1.0)),
                    summary: Some(summary(4.0)),
                    ..PollUpdate::default()
                },
            )
            .unwrap();
        assert!(applied.aoi && applied.summary);
        let snap = store.snapshot();
        assert_eq!(snap.aoi, Some(aoi(1.0)));
        assert!(!snap.results_stale);
    }

    #[test]
    fn dem_result_is_independent_of_submissions() {
        let store = DashboardStore::new();
        store.set_dem_result(DemVolumeResult {
            volume_m3: Some(10.0),
            ..DemVolumeResult::default()
        });
        store.replace_aoi(aoi(0.0));
        assert_eq!(store.snapshot().dem.and_then(|d| d.volume_m3), Some(10.0));
    }
}
