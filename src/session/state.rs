use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::captions::{CaptionStore, FetchedTrack, LoadPhase};
use crate::models::PlaybackSnapshot;
use crate::overlay::{CaptionOverlay, HostSurfaceState};
use crate::sync::{select, DisplayReconciler, ReconcileOutcome, SyncConfig};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Active,
}

/// Store updates produced off the per-tick path.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Phase(LoadPhase),
    TrackLoaded(FetchedTrack),
    Translated(Vec<String>),
    Refresh,
}

/// Everything one playback session owns. Built on `enter`, reset on `exit`.
pub struct SessionState {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub source_id: Option<String>,
    pub entered_at: Option<DateTime<Utc>>,
    pub store: CaptionStore,
    pub reconciler: DisplayReconciler,
    pub last_snapshot: Option<PlaybackSnapshot>,
    pub host_state: Option<HostSurfaceState>,
    config: SyncConfig,
    max_load_attempts: u32,
}

impl SessionState {
    pub fn new(config: SyncConfig, max_load_attempts: u32) -> Self {
        Self {
            status: SessionStatus::Idle,
            session_id: None,
            source_id: None,
            entered_at: None,
            store: CaptionStore::new(),
            reconciler: DisplayReconciler::new(config.debounce),
            last_snapshot: None,
            host_state: None,
            config,
            max_load_attempts,
        }
    }

    pub fn begin(&mut self, session_id: String, source_id: String, host_state: HostSurfaceState) {
        *self = Self {
            status: SessionStatus::Active,
            session_id: Some(session_id),
            source_id: Some(source_id),
            entered_at: Some(Utc::now()),
            host_state: Some(host_state),
            ..Self::new(self.config.clone(), self.max_load_attempts)
        };
    }

    /// Back to idle. Returns the host state captured on entry, if any.
    pub fn reset(&mut self) -> Option<HostSurfaceState> {
        let host_state = self.host_state.take();
        *self = Self::new(self.config.clone(), self.max_load_attempts);
        host_state
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Select and render for a newly accepted snapshot.
    pub fn apply_snapshot(
        &mut self,
        snapshot: PlaybackSnapshot,
        overlay: &mut dyn CaptionOverlay,
        now: Instant,
    ) -> ReconcileOutcome {
        self.last_snapshot = Some(snapshot);
        self.reconcile(overlay, now)
    }

    pub fn apply_event(
        &mut self,
        event: SessionEvent,
        overlay: &mut dyn CaptionOverlay,
        now: Instant,
    ) -> ReconcileOutcome {
        match event {
            SessionEvent::Phase(phase) => {
                if let Some(progress) = phase.progress(self.max_load_attempts) {
                    overlay.show_progress(progress);
                }
                self.store.set_phase(phase);
                ReconcileOutcome::Unchanged
            }
            SessionEvent::TrackLoaded(fetched) => {
                self.store.replace(fetched);
                if let Some(progress) = self.store.phase().progress(self.max_load_attempts) {
                    overlay.show_progress(progress);
                }
                self.reconcile(overlay, now)
            }
            SessionEvent::Translated(translations) => {
                self.store.apply_translations(translations);
                overlay.hide_progress();
                self.reconcile(overlay, now)
            }
            SessionEvent::Refresh => self.reconcile(overlay, now),
        }
    }

    /// Re-run selection against the last snapshot and the live track.
    pub fn reconcile(&mut self, overlay: &mut dyn CaptionOverlay, now: Instant) -> ReconcileOutcome {
        let Some(snapshot) = self.last_snapshot.as_ref() else {
            return ReconcileOutcome::Unchanged;
        };
        let track = self.store.track();
        let selection = select(
            snapshot,
            track,
            self.reconciler.active_index(),
            &self.config,
            now,
        );
        self.reconciler.reconcile(selection.index, track, overlay, now)
    }

    pub fn debounce(&self) -> Duration {
        self.config.debounce
    }
}

/// Serializable view of a session for callers and logs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub source_id: Option<String>,
    pub entered_at: Option<DateTime<Utc>>,
    pub active_index: Option<usize>,
    pub caption_count: usize,
    pub using_backup: bool,
    pub loading: bool,
    pub current_time: Option<f64>,
    pub render_count: u64,
}

impl From<&SessionState> for SessionSnapshot {
    fn from(state: &SessionState) -> Self {
        Self {
            status: state.status,
            session_id: state.session_id.clone(),
            source_id: state.source_id.clone(),
            entered_at: state.entered_at,
            active_index: state.reconciler.active_index(),
            caption_count: state.store.track().len(),
            using_backup: state.store.is_backup(),
            loading: !matches!(
                state.store.phase(),
                LoadPhase::Ready | LoadPhase::Fallback | LoadPhase::Idle
            ),
            current_time: state.last_snapshot.as_ref().map(|s| s.current_time),
            render_count: state.reconciler.render_count(),
        }
    }
}
