use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::PlaybackSnapshot;

use super::channel::PlayerChannel;
use super::messages::{InboundMessage, OutboundMessage, PlayerCommand};
use super::tracker::SnapshotTracker;
use super::BridgeConfig;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_debug, log_info, log_warn};

/// Ask the player for its time and state. Post failures are logged and
/// swallowed; a missing answer just leaves the last snapshot in place.
pub(crate) fn request_playback_state(channel: &dyn PlayerChannel) {
    for func in [PlayerCommand::GetCurrentTime, PlayerCommand::GetPlayerState] {
        let message = OutboundMessage::command(func).to_json();
        if let Err(err) = channel.post(&message) {
            log_warn!("player command {func:?} failed: {err:?}");
        }
    }
}

pub(crate) async fn poll_loop(
    channel: Arc<dyn PlayerChannel>,
    mut inbound_rx: mpsc::UnboundedReceiver<String>,
    snapshot_tx: mpsc::UnboundedSender<PlaybackSnapshot>,
    config: BridgeConfig,
    cancel_token: CancellationToken,
) {
    // The immediate request is sent by `start`; the first tick waits a period.
    let mut ticker = time::interval_at(
        time::Instant::now() + config.poll_interval,
        config.poll_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut tracker = SnapshotTracker::new(config.dead_band_secs);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("clock bridge poll loop shutting down");
                break;
            }
            Some(raw) = inbound_rx.recv() => {
                let Some(message) = InboundMessage::parse(&raw) else {
                    log_debug!("discarding player message: {raw}");
                    continue;
                };
                if let Some(snapshot) = tracker.ingest(message, Instant::now()) {
                    log_debug!(
                        "snapshot t={:.2} paused={} rate={}",
                        snapshot.current_time,
                        snapshot.is_paused,
                        snapshot.playback_rate
                    );
                    if snapshot_tx.send(snapshot).is_err() {
                        log_info!("snapshot consumer gone, stopping clock bridge");
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                request_playback_state(channel.as_ref());
            }
        }
    }
}
