use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::PlaybackSnapshot;

use super::channel::{ListenerId, PlayerChannel};
use super::loop_worker::{poll_loop, request_playback_state};
use super::messages::OutboundMessage;
use super::BridgeConfig;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Owns the listener and poll task installed on a player channel.
pub struct RemoteClockBridge {
    config: BridgeConfig,
    channel: Option<Arc<dyn PlayerChannel>>,
    listener_id: Option<ListenerId>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl RemoteClockBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            channel: None,
            listener_id: None,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Register one listener, greet the player, request its state once and
    /// start polling. Snapshots worth acting on go to `snapshot_tx`.
    ///
    /// A running bridge is stopped first so registrations never pile up.
    pub async fn start(
        &mut self,
        channel: Arc<dyn PlayerChannel>,
        snapshot_tx: mpsc::UnboundedSender<PlaybackSnapshot>,
        session_id: &str,
    ) {
        if self.is_running() || self.listener_id.is_some() {
            log_warn!("clock bridge already running, restarting");
            self.stop().await;
        }

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let listener_id = channel.add_listener(inbound_tx);

        if let Err(err) = channel.post(&OutboundMessage::listening(session_id).to_json()) {
            log_warn!("player handshake failed: {err:?}");
        }
        request_playback_state(channel.as_ref());

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            channel.clone(),
            inbound_rx,
            snapshot_tx,
            self.config.clone(),
            cancel_token.clone(),
        ));

        log_info!(
            "clock bridge started (listener {listener_id}, every {}ms)",
            self.config.poll_interval.as_millis()
        );

        self.channel = Some(channel);
        self.listener_id = Some(listener_id);
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
    }

    /// Immediate time/state request, outside the poll cadence.
    pub fn resync(&self) {
        if let Some(channel) = &self.channel {
            request_playback_state(channel.as_ref());
        }
    }

    /// Cancel the poll task, wait for it to finish and remove the listener.
    /// Safe to call any number of times.
    pub async fn stop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                log_warn!("clock bridge poll task failed to join: {err:?}");
            }
        }

        if let Some(channel) = self.channel.take() {
            if let Some(listener_id) = self.listener_id.take() {
                channel.remove_listener(listener_id);
                log_info!("clock bridge stopped (listener {listener_id} removed)");
            }
        }
    }
}

impl Drop for RemoteClockBridge {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        if let (Some(channel), Some(listener_id)) = (self.channel.take(), self.listener_id.take()) {
            channel.remove_listener(listener_id);
        }
    }
}
