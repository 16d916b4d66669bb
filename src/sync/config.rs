use std::time::Duration;

use crate::settings::CaptionSettings;

/// Thresholds for caption selection and display reconciliation.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// An upcoming caption is shown early if it starts within this many seconds
    pub upcoming_window_secs: f64,

    /// A caption that just ended stays up for at most this many seconds
    pub recent_window_secs: f64,

    /// Minimum time between accepted same-index refreshes
    pub debounce: Duration,

    /// Advance the snapshot time by its age before selecting
    pub extrapolate: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            upcoming_window_secs: 3.0,
            recent_window_secs: 2.0,
            debounce: Duration::from_millis(100),
            extrapolate: false,
        }
    }
}

impl From<&CaptionSettings> for SyncConfig {
    fn from(settings: &CaptionSettings) -> Self {
        Self {
            upcoming_window_secs: settings.upcoming_window_secs,
            recent_window_secs: settings.recent_window_secs,
            debounce: Duration::from_millis(settings.debounce_ms),
            extrapolate: settings.extrapolate,
        }
    }
}
