use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    bridge::{BridgeConfig, PlayerChannel, RemoteClockBridge},
    captions::{
        CaptionLoader, RetryPolicy, TranscriptSource, TranslationConfig, TranslationPipeline,
        Translator,
    },
    overlay::CaptionOverlay,
    settings::CaptionSettings,
    sync::SyncConfig,
};

use super::state::{SessionEvent, SessionSnapshot, SessionState, SessionStatus};
use super::sync_loop::{load_captions, sync_loop};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub(crate) struct SessionInner {
    pub(crate) state: SessionState,
    pub(crate) overlay: Box<dyn CaptionOverlay>,
}

/// Background work owned by one active session.
#[derive(Default)]
struct SessionTasks {
    cancel_token: Option<CancellationToken>,
    sync_handle: Option<JoinHandle<()>>,
    load_handle: Option<JoinHandle<()>>,
    event_tx: Option<mpsc::UnboundedSender<SessionEvent>>,
}

impl SessionTasks {
    fn running(&self) -> usize {
        [&self.sync_handle, &self.load_handle]
            .into_iter()
            .flatten()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

/// Out-of-process collaborators a session talks to.
#[derive(Clone)]
pub struct SessionDeps {
    pub channel: Arc<dyn PlayerChannel>,
    pub transcripts: Arc<dyn TranscriptSource>,
    pub translator: Arc<dyn Translator>,
}

/// Idle ⇄ Active lifecycle around one overlay and one player channel.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Mutex<SessionInner>>,
    bridge: Arc<Mutex<RemoteClockBridge>>,
    tasks: Arc<Mutex<SessionTasks>>,
    channel: Arc<dyn PlayerChannel>,
    loader: Arc<CaptionLoader>,
    pipeline: Arc<TranslationPipeline>,
    announce_switches: bool,
}

impl SessionController {
    pub fn new(
        overlay: Box<dyn CaptionOverlay>,
        deps: SessionDeps,
        settings: &CaptionSettings,
    ) -> Self {
        let debug_mode = std::env::var("CAPTIONSYNC_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let policy = RetryPolicy::from(settings);
        let state = SessionState::new(SyncConfig::from(settings), policy.max_attempts);

        Self {
            inner: Arc::new(Mutex::new(SessionInner { state, overlay })),
            bridge: Arc::new(Mutex::new(RemoteClockBridge::new(BridgeConfig::from(settings)))),
            tasks: Arc::new(Mutex::new(SessionTasks::default())),
            channel: deps.channel,
            loader: Arc::new(CaptionLoader::new(deps.transcripts, policy)),
            pipeline: Arc::new(TranslationPipeline::new(
                deps.translator,
                TranslationConfig::from(settings),
            )),
            announce_switches: debug_mode,
        }
    }

    pub async fn status(&self) -> SessionStatus {
        self.inner.lock().await.state.status
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from(&self.inner.lock().await.state)
    }

    /// Background tasks still alive: poll loop, sync loop, caption load.
    pub async fn running_tasks(&self) -> usize {
        let bridge = usize::from(self.bridge.lock().await.is_running());
        bridge + self.tasks.lock().await.running()
    }

    /// Idle → Active. An already active session is exited first.
    pub async fn enter(&self, source_id: &str) -> Result<()> {
        if self.status().await == SessionStatus::Active {
            log_warn!("enter while active, tearing down the previous session first");
            self.exit().await?;
        }

        let session_id = Uuid::new_v4().to_string();

        {
            let mut guard = self.inner.lock().await;
            let SessionInner { state, overlay } = &mut *guard;
            let host_state = overlay.capture_host_state();
            if let Err(err) = overlay.mount() {
                overlay.restore_host_state(host_state);
                return Err(err).context("failed to mount caption overlay");
            }
            state.begin(session_id.clone(), source_id.to_string(), host_state);
        }

        let cancel_token = CancellationToken::new();
        let (snapshot_tx, snapshot_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let sync_handle = tokio::spawn(sync_loop(
            self.inner.clone(),
            snapshot_rx,
            event_rx,
            cancel_token.clone(),
            self.announce_switches,
        ));
        let load_handle = self.spawn_load(source_id, event_tx.clone());

        self.bridge
            .lock()
            .await
            .start(self.channel.clone(), snapshot_tx, &session_id)
            .await;

        *self.tasks.lock().await = SessionTasks {
            cancel_token: Some(cancel_token),
            sync_handle: Some(sync_handle),
            load_handle: Some(load_handle),
            event_tx: Some(event_tx),
        };

        log_info!("caption session {session_id} entered for {source_id}");
        Ok(())
    }

    /// Active → Idle. Safe from any state; every timer and listener the
    /// session installed is gone when this returns.
    pub async fn exit(&self) -> Result<()> {
        let tasks = std::mem::take(&mut *self.tasks.lock().await);

        if let Some(token) = &tasks.cancel_token {
            token.cancel();
        }

        self.bridge.lock().await.stop().await;

        if let Some(handle) = tasks.load_handle {
            handle.abort();
        }
        if let Some(handle) = tasks.sync_handle {
            if let Err(err) = handle.await {
                log_warn!("sync loop ended abnormally, tearing down anyway: {err:?}");
            }
        }

        let mut guard = self.inner.lock().await;
        let SessionInner { state, overlay } = &mut *guard;
        if !state.is_active() {
            return Ok(());
        }

        let session_id = state.session_id.clone().unwrap_or_default();
        let renders = state.reconciler.render_count();
        overlay.hide_progress();
        overlay.unmount();
        if let Some(host_state) = state.reset() {
            overlay.restore_host_state(host_state);
        }

        log_info!("caption session {session_id} exited after {renders} caption renders");
        Ok(())
    }

    /// Ask the player for time and state right now.
    pub async fn resync(&self) {
        if self.status().await != SessionStatus::Active {
            return;
        }
        self.bridge.lock().await.resync();
    }

    /// Re-render against the last snapshot without waiting for a time change.
    pub async fn refresh(&self) {
        if let Some(tx) = &self.tasks.lock().await.event_tx {
            let _ = tx.send(SessionEvent::Refresh);
        }
    }

    /// Throw away the current track and load it again.
    pub async fn reload(&self) -> Result<()> {
        let source_id = {
            let guard = self.inner.lock().await;
            match (&guard.state.source_id, guard.state.is_active()) {
                (Some(source_id), true) => source_id.clone(),
                _ => return Ok(()),
            }
        };

        let mut tasks = self.tasks.lock().await;
        let Some(event_tx) = tasks.event_tx.clone() else {
            return Ok(());
        };
        if let Some(handle) = tasks.load_handle.take() {
            handle.abort();
        }
        tasks.load_handle = Some(self.spawn_load(&source_id, event_tx));

        log_info!("reloading captions for {source_id}");
        Ok(())
    }

    fn spawn_load(
        &self,
        source_id: &str,
        event_tx: mpsc::UnboundedSender<SessionEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(load_captions(
            self.loader.clone(),
            self.pipeline.clone(),
            source_id.to_string(),
            event_tx,
        ))
    }
}
