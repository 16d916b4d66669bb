use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;

/// Best-effort estimate of the remote player's position, aged from receipt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    pub current_time: f64,
    pub is_paused: bool,
    pub playback_rate: f64,
    pub received_at_wall: DateTime<Utc>,
    #[serde(skip)]
    pub received_at: Instant,
}

impl PlaybackSnapshot {
    pub fn received(
        current_time: f64,
        is_paused: bool,
        playback_rate: f64,
        received_at: Instant,
    ) -> Self {
        Self {
            current_time,
            is_paused,
            playback_rate,
            received_at_wall: Utc::now(),
            received_at,
        }
    }

    pub fn age(&self, now: Instant) -> std::time::Duration {
        now.saturating_duration_since(self.received_at)
    }

    /// `current_time + rate * age` while playing, `current_time` while paused.
    pub fn extrapolated_time(&self, now: Instant) -> f64 {
        if self.is_paused {
            return self.current_time;
        }
        self.current_time + self.playback_rate * self.age(now).as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn extrapolation_scales_with_rate_and_age() {
        let received = Instant::now();
        let snapshot = PlaybackSnapshot::received(10.0, false, 2.0, received);
        let later = received + Duration::from_millis(500);

        assert!((snapshot.extrapolated_time(later) - 11.0).abs() < 1e-9);
    }

    #[test]
    fn paused_snapshot_does_not_extrapolate() {
        let received = Instant::now();
        let snapshot = PlaybackSnapshot::received(10.0, true, 1.0, received);

        assert_eq!(snapshot.extrapolated_time(received + Duration::from_secs(5)), 10.0);
    }
}
