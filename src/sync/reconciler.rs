use std::time::{Duration, Instant};

use crate::models::CaptionTrack;
use crate::overlay::{CaptionOverlay, RenderedLines};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// What is currently on screen, as last accepted by the reconciler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    pub active_index: Option<usize>,
    pub last_switch: Option<Instant>,
    pub rendered: RenderedLines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Rendered,
    Cleared,
    Unchanged,
    /// Same entry with new content inside the debounce window; retry after
    /// the given delay.
    Deferred(Duration),
}

/// Applies selector decisions to the overlay.
///
/// Rendering is declarative: the desired lines are derived from the live
/// track on every call and compared with what is on screen, so repeated
/// calls with the same selection never touch the overlay twice.
pub struct DisplayReconciler {
    state: SelectionState,
    debounce: Duration,
    render_count: u64,
}

impl DisplayReconciler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: SelectionState::default(),
            debounce,
            render_count: 0,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn active_index(&self) -> Option<usize> {
        self.state.active_index
    }

    /// Number of accepted overlay mutations since creation.
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn reset(&mut self) {
        self.state = SelectionState::default();
    }

    pub fn reconcile(
        &mut self,
        selection: Option<usize>,
        track: &CaptionTrack,
        overlay: &mut dyn CaptionOverlay,
        now: Instant,
    ) -> ReconcileOutcome {
        // A stale index from a replaced track shows nothing.
        let selection = selection.filter(|index| *index < track.len());
        let desired = desired_lines(selection, track);

        let same_index = selection == self.state.active_index;
        if same_index && desired == self.state.rendered {
            return ReconcileOutcome::Unchanged;
        }

        if same_index {
            if let Some(last) = self.state.last_switch {
                let elapsed = now.saturating_duration_since(last);
                if elapsed < self.debounce {
                    let remaining = self.debounce - elapsed;
                    log_debug!(
                        "refresh of caption {:?} deferred {}ms",
                        selection,
                        remaining.as_millis()
                    );
                    return ReconcileOutcome::Deferred(remaining);
                }
            }
        }

        let outcome = match selection {
            Some(_) => {
                if let Err(err) = overlay.render_lines(&desired) {
                    log_warn!("caption render failed, writing plain text: {err:?}");
                    overlay.write_plain(&desired.source, &desired.translated);
                }
                ReconcileOutcome::Rendered
            }
            None => {
                if let Err(err) = overlay.clear() {
                    log_warn!("caption clear failed, writing empty text: {err:?}");
                    overlay.write_plain("", "");
                }
                ReconcileOutcome::Cleared
            }
        };

        log_debug!(
            "caption {:?} -> {:?} ({:?})",
            self.state.active_index,
            selection,
            outcome
        );

        self.state = SelectionState {
            active_index: selection,
            last_switch: Some(now),
            rendered: desired,
        };
        self.render_count += 1;

        outcome
    }
}

fn desired_lines(selection: Option<usize>, track: &CaptionTrack) -> RenderedLines {
    selection
        .and_then(|index| track.get(index))
        .map(|entry| {
            RenderedLines::new(
                entry.text.clone(),
                entry.translated_text.clone().unwrap_or_default(),
            )
        })
        .unwrap_or_default()
}
