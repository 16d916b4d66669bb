pub mod channel;
pub mod controller;
pub mod loop_worker;
pub mod messages;
pub mod tracker;

use std::time::Duration;

use crate::settings::CaptionSettings;

pub use channel::{ListenerId, PlayerChannel};
pub use controller::RemoteClockBridge;
pub use messages::{InboundMessage, OutboundMessage, PlayerCommand, PlayerState};
pub use tracker::SnapshotTracker;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// How often time and state are requested from the player
    pub poll_interval: Duration,

    /// Time changes below this many seconds are not forwarded
    pub dead_band_secs: f64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            dead_band_secs: 0.1,
        }
    }
}

impl From<&CaptionSettings> for BridgeConfig {
    fn from(settings: &CaptionSettings) -> Self {
        Self {
            poll_interval: Duration::from_millis(settings.poll_interval_ms.max(1)),
            dead_band_secs: settings.dead_band_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeChannel;
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn fast_config() -> BridgeConfig {
        BridgeConfig {
            poll_interval: Duration::from_millis(5),
            ..BridgeConfig::default()
        }
    }

    #[tokio::test]
    async fn start_greets_and_requests_state_immediately() {
        let channel = Arc::new(FakeChannel::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut bridge = RemoteClockBridge::new(BridgeConfig {
            poll_interval: Duration::from_secs(60),
            ..BridgeConfig::default()
        });

        bridge.start(channel.clone(), tx, "session-1").await;

        let posted: Vec<Value> = channel
            .posted()
            .iter()
            .map(|raw| serde_json::from_str(raw).unwrap())
            .collect();
        assert_eq!(posted.len(), 3);
        assert_eq!(posted[0]["event"], "listening");
        assert_eq!(posted[0]["id"], "session-1");
        assert_eq!(posted[1]["func"], "getCurrentTime");
        assert_eq!(posted[2]["func"], "getPlayerState");
        assert_eq!(channel.listener_count(), 1);

        bridge.stop().await;
    }

    #[tokio::test]
    async fn polls_on_cadence_until_stopped() {
        let channel = Arc::new(FakeChannel::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut bridge = RemoteClockBridge::new(fast_config());

        bridge.start(channel.clone(), tx, "s").await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        bridge.stop().await;

        let after_stop = channel.command_count();
        assert!(after_stop > 2, "expected polling, saw {after_stop} commands");

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(channel.command_count(), after_stop);
        assert_eq!(channel.listener_count(), 0);
    }

    #[tokio::test]
    async fn inbound_messages_become_snapshots() {
        let channel = Arc::new(FakeChannel::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut bridge = RemoteClockBridge::new(fast_config());
        bridge.start(channel.clone(), tx, "s").await;

        channel.deliver(r#"{"event":"onStateChange","info":1}"#);
        channel.deliver("garbage");
        channel.deliver(r#"{"event":"infoDelivery","info":{"currentTime":12.0}}"#);
        channel.deliver(r#"{"event":"infoDelivery","info":{"currentTime":12.04}}"#);
        channel.deliver(r#"{"event":"infoDelivery","info":{"currentTime":13.0}}"#);

        let first = rx.recv().await.unwrap();
        assert_eq!(first.current_time, 12.0);
        assert!(!first.is_paused);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.current_time, 13.0);

        bridge.stop().await;
    }

    #[tokio::test]
    async fn post_failures_are_swallowed() {
        let channel = Arc::new(FakeChannel::failing());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut bridge = RemoteClockBridge::new(fast_config());

        bridge.start(channel.clone(), tx, "s").await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        bridge.resync();

        assert!(bridge.is_running());
        bridge.stop().await;
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_restart_does_not_leak() {
        let channel = Arc::new(FakeChannel::default());
        let mut bridge = RemoteClockBridge::new(fast_config());

        bridge.stop().await;
        for _ in 0..5 {
            let (tx, _rx) = mpsc::unbounded_channel();
            bridge.start(channel.clone(), tx, "s").await;
            assert_eq!(channel.listener_count(), 1);
        }
        bridge.stop().await;
        bridge.stop().await;

        assert_eq!(channel.listener_count(), 0);
        assert!(!bridge.is_running());
        assert_eq!(channel.listeners_added(), 5);
    }

    #[tokio::test]
    async fn resync_sends_one_command_pair() {
        let channel = Arc::new(FakeChannel::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut bridge = RemoteClockBridge::new(BridgeConfig {
            poll_interval: Duration::from_secs(60),
            ..BridgeConfig::default()
        });
        bridge.start(channel.clone(), tx, "s").await;
        let before = channel.command_count();

        bridge.resync();

        assert_eq!(channel.command_count(), before + 2);
        bridge.stop().await;
    }
}
