use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Mutex};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::captions::{CaptionLoader, TranslationPipeline};
use crate::models::PlaybackSnapshot;
use crate::sync::ReconcileOutcome;

use super::controller::SessionInner;
use super::state::SessionEvent;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Consume snapshots and store events strictly in arrival order and run
/// select → reconcile for each. Also owns the one-shot debounce timer.
pub(crate) async fn sync_loop(
    inner: Arc<Mutex<SessionInner>>,
    mut snapshot_rx: mpsc::UnboundedReceiver<PlaybackSnapshot>,
    mut event_rx: mpsc::UnboundedReceiver<SessionEvent>,
    cancel_token: CancellationToken,
    announce_switches: bool,
) {
    let mut debounce_deadline: Option<time::Instant> = None;

    loop {
        let debounce = async move {
            match debounce_deadline {
                Some(deadline) => time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        let outcome = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("sync loop shutting down");
                break;
            }
            Some(snapshot) = snapshot_rx.recv() => {
                let mut guard = inner.lock().await;
                let SessionInner { state, overlay } = &mut *guard;
                let outcome = state.apply_snapshot(snapshot, overlay.as_mut(), Instant::now());
                if announce_switches && outcome == ReconcileOutcome::Rendered {
                    log_info!("caption -> {:?}", state.reconciler.state().rendered);
                }
                outcome
            }
            Some(event) = event_rx.recv() => {
                let mut guard = inner.lock().await;
                let SessionInner { state, overlay } = &mut *guard;
                state.apply_event(event, overlay.as_mut(), Instant::now())
            }
            _ = debounce => {
                debounce_deadline = None;
                let mut guard = inner.lock().await;
                let SessionInner { state, overlay } = &mut *guard;
                state.reconcile(overlay.as_mut(), Instant::now())
            }
        };

        debounce_deadline = match outcome {
            ReconcileOutcome::Deferred(delay) => {
                log_debug!("debounce timer armed for {}ms", delay.as_millis());
                Some(time::Instant::now() + delay)
            }
            ReconcileOutcome::Unchanged => debounce_deadline,
            ReconcileOutcome::Rendered | ReconcileOutcome::Cleared => None,
        };
    }
}

/// Fetch, install, translate. Runs once per load; every result goes through
/// the sync loop so the store is only touched there.
pub(crate) async fn load_captions(
    loader: Arc<CaptionLoader>,
    pipeline: Arc<TranslationPipeline>,
    source_id: String,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    let fetched = loader
        .fetch(&source_id, |phase| {
            let _ = events.send(SessionEvent::Phase(phase.clone()));
        })
        .await;

    let texts = fetched.track.texts();
    if events.send(SessionEvent::TrackLoaded(fetched)).is_err() {
        return;
    }

    let translations = pipeline.translate(&texts).await;
    let _ = events.send(SessionEvent::Translated(translations));
}
