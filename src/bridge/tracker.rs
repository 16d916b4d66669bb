use std::time::Instant;

use crate::models::PlaybackSnapshot;

use super::messages::InboundMessage;

/// Folds inbound player messages into the latest known playback state and
/// decides which updates are worth forwarding.
///
/// Time changes smaller than the dead-band are absorbed. Pause and rate
/// changes always go through.
#[derive(Debug, Clone)]
pub struct SnapshotTracker {
    dead_band_secs: f64,
    current_time: Option<f64>,
    is_paused: bool,
    playback_rate: f64,
    latest: Option<PlaybackSnapshot>,
    last_forwarded: Option<PlaybackSnapshot>,
}

impl SnapshotTracker {
    pub fn new(dead_band_secs: f64) -> Self {
        Self {
            dead_band_secs,
            current_time: None,
            is_paused: true,
            playback_rate: 1.0,
            latest: None,
            last_forwarded: None,
        }
    }

    /// Latest state estimate, forwarded or not.
    pub fn latest(&self) -> Option<&PlaybackSnapshot> {
        self.latest.as_ref()
    }

    pub fn ingest(&mut self, message: InboundMessage, now: Instant) -> Option<PlaybackSnapshot> {
        match message {
            InboundMessage::StateChange(state) => {
                if let Some(paused) = state.paused_flag() {
                    self.is_paused = paused;
                }
            }
            InboundMessage::RateChange(rate) => self.set_rate(rate),
            InboundMessage::Info(info) => {
                if let Some(time) = info.current_time.filter(|t| t.is_finite() && *t >= 0.0) {
                    self.current_time = Some(time);
                }
                if let Some(paused) = info.player_state.and_then(|state| state.paused_flag()) {
                    self.is_paused = paused;
                }
                if let Some(rate) = info.playback_rate {
                    self.set_rate(rate);
                }
            }
        }

        // Without a time observation there is nothing to select against.
        let current_time = self.current_time?;
        let snapshot =
            PlaybackSnapshot::received(current_time, self.is_paused, self.playback_rate, now);
        self.latest = Some(snapshot.clone());

        if !self.should_forward(&snapshot) {
            return None;
        }
        self.last_forwarded = Some(snapshot.clone());
        Some(snapshot)
    }

    fn set_rate(&mut self, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.playback_rate = rate;
        }
    }

    fn should_forward(&self, snapshot: &PlaybackSnapshot) -> bool {
        let Some(previous) = &self.last_forwarded else {
            return true;
        };
        (snapshot.current_time - previous.current_time).abs() >= self.dead_band_secs
            || snapshot.is_paused != previous.is_paused
            || snapshot.playback_rate != previous.playback_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::messages::{InfoDelivery, PlayerState};

    fn time(seconds: f64) -> InboundMessage {
        InboundMessage::Info(InfoDelivery {
            current_time: Some(seconds),
            ..InfoDelivery::default()
        })
    }

    #[test]
    fn nothing_forwarded_before_first_time() {
        let mut tracker = SnapshotTracker::new(0.1);
        let now = Instant::now();

        assert!(tracker
            .ingest(InboundMessage::StateChange(PlayerState::Playing), now)
            .is_none());
        assert!(tracker.latest().is_none());

        let first = tracker.ingest(time(4.0), now).expect("first time is forwarded");
        assert_eq!(first.current_time, 4.0);
        assert!(!first.is_paused);
    }

    #[test]
    fn small_deltas_are_absorbed() {
        let mut tracker = SnapshotTracker::new(0.1);
        let now = Instant::now();

        assert!(tracker.ingest(time(10.0), now).is_some());
        assert!(tracker.ingest(time(10.05), now).is_none());
        assert!(tracker.ingest(time(10.09), now).is_none());
        assert_eq!(tracker.latest().map(|s| s.current_time), Some(10.09));

        let forwarded = tracker.ingest(time(10.2), now).expect("beyond dead-band");
        assert_eq!(forwarded.current_time, 10.2);
        // Measured from the last forwarded value, not the last seen one.
        assert!(tracker.ingest(time(10.25), now).is_none());
    }

    #[test]
    fn backwards_seek_is_forwarded() {
        let mut tracker = SnapshotTracker::new(0.1);
        let now = Instant::now();

        tracker.ingest(time(30.0), now);
        let snapshot = tracker.ingest(time(2.0), now).expect("seek back");
        assert_eq!(snapshot.current_time, 2.0);
    }

    #[test]
    fn pause_and_rate_changes_bypass_dead_band() {
        let mut tracker = SnapshotTracker::new(0.1);
        let now = Instant::now();

        tracker.ingest(time(10.0), now);
        let paused = tracker
            .ingest(InboundMessage::StateChange(PlayerState::Paused), now)
            .expect("pause forwarded");
        assert!(paused.is_paused);

        let faster = tracker
            .ingest(InboundMessage::RateChange(2.0), now)
            .expect("rate forwarded");
        assert_eq!(faster.playback_rate, 2.0);

        // Buffering says nothing about pause; nothing changed.
        assert!(tracker
            .ingest(InboundMessage::StateChange(PlayerState::Buffering), now)
            .is_none());
    }

    #[test]
    fn invalid_values_are_ignored() {
        let mut tracker = SnapshotTracker::new(0.1);
        let now = Instant::now();

        tracker.ingest(time(5.0), now);
        assert!(tracker.ingest(time(f64::NAN), now).is_none());
        assert!(tracker.ingest(time(-1.0), now).is_none());
        assert!(tracker.ingest(InboundMessage::RateChange(0.0), now).is_none());
        assert_eq!(tracker.latest().map(|s| s.current_time), Some(5.0));
        assert_eq!(tracker.latest().map(|s| s.playback_rate), Some(1.0));
    }
}
