use std::time::Instant;

use crate::models::{CaptionTrack, PlaybackSnapshot};

use super::config::SyncConfig;

/// Outcome of one selection: which entry should be visible and whether that
/// differs from what the caller had before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub index: Option<usize>,
    pub changed: bool,
}

impl Selection {
    pub fn changed_from(index: Option<usize>, previous: Option<usize>) -> Self {
        Self {
            index,
            changed: index != previous,
        }
    }
}

/// Which entry should be visible for `snapshot`, compared against `previous`.
pub fn select(
    snapshot: &PlaybackSnapshot,
    track: &CaptionTrack,
    previous: Option<usize>,
    config: &SyncConfig,
    now: Instant,
) -> Selection {
    let time = if config.extrapolate {
        snapshot.extrapolated_time(now)
    } else {
        snapshot.current_time
    };
    Selection::changed_from(select_at(time, track, config), previous)
}

/// Pure lookup of the entry to show at `time`.
///
/// Precedence:
/// 1. the first entry in track order whose range contains `time`
///    (overlaps resolve to the lower index),
/// 2. the nearest entry starting after `time`, within the upcoming window,
/// 3. the nearest entry that ended before `time`, within the recent window,
/// 4. nothing.
///
/// Distance ties in steps 2 and 3 also resolve to the lower index.
pub fn select_at(time: f64, track: &CaptionTrack, config: &SyncConfig) -> Option<usize> {
    if !time.is_finite() {
        return None;
    }

    let entries = track.entries();

    if let Some(index) = entries.iter().position(|entry| entry.contains(time)) {
        return Some(index);
    }

    let upcoming = nearest(entries.iter().map(|entry| entry.start - time));
    if let Some((index, gap)) = upcoming {
        if gap < config.upcoming_window_secs {
            return Some(index);
        }
    }

    let recent = nearest(entries.iter().map(|entry| time - entry.end));
    if let Some((index, gap)) = recent {
        if gap < config.recent_window_secs {
            return Some(index);
        }
    }

    None
}

/// Index and value of the smallest strictly positive distance, first wins.
fn nearest(distances: impl Iterator<Item = f64>) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, distance) in distances.enumerate() {
        if distance <= 0.0 {
            continue;
        }
        match best {
            Some((_, current)) if current <= distance => {}
            _ => best = Some((index, distance)),
        }
    }
    best
}
