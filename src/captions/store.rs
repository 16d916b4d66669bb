use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CaptionEntry, CaptionTrack};
use crate::overlay::{LoadProgress, LoadStage};
use crate::settings::CaptionSettings;

use super::backup::backup_track;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// External transcript fetcher.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn load_captions(&self, source_id: &str) -> Result<Vec<CaptionEntry>>;
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl From<&CaptionSettings> for RetryPolicy {
    fn from(settings: &CaptionSettings) -> Self {
        Self {
            max_attempts: settings.load_max_attempts.max(1),
            ..Self::default()
        }
    }
}

/// Where the caption load currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadPhase {
    Idle,
    Fetching { attempt: u32 },
    BackingOff { attempt: u32, delay: Duration },
    Translating,
    Ready,
    Fallback,
}

impl LoadPhase {
    pub fn progress(&self, max_attempts: u32) -> Option<LoadProgress> {
        let progress = match self {
            LoadPhase::Idle => return None,
            LoadPhase::Fetching { attempt } | LoadPhase::BackingOff { attempt, .. } => {
                let step = 30 * attempt.saturating_sub(1) / max_attempts.max(1);
                LoadProgress {
                    stage: LoadStage::Fetching,
                    percent: (10 + step.min(30)) as u8,
                }
            }
            LoadPhase::Translating => LoadProgress {
                stage: LoadStage::Translating,
                percent: 60,
            },
            LoadPhase::Ready => LoadProgress {
                stage: LoadStage::Done,
                percent: 100,
            },
            LoadPhase::Fallback => LoadProgress {
                stage: LoadStage::Fallback,
                percent: 100,
            },
        };
        Some(progress)
    }
}

/// Track obtained by the fetch state machine.
#[derive(Debug, Clone)]
pub struct FetchedTrack {
    pub track: CaptionTrack,
    pub from_backup: bool,
    pub attempts: u32,
}

/// Fetches a transcript with bounded retries, then the backup track.
pub struct CaptionLoader {
    source: Arc<dyn TranscriptSource>,
    policy: RetryPolicy,
}

impl CaptionLoader {
    pub fn new(source: Arc<dyn TranscriptSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Drive the fetch state machine to completion. `on_phase` sees every
    /// transition. Never fails: exhausting the attempts yields the backup.
    pub async fn fetch<F>(&self, source_id: &str, mut on_phase: F) -> FetchedTrack
    where
        F: FnMut(&LoadPhase),
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut backoff = self.policy.initial_backoff;
        let mut phase = LoadPhase::Fetching { attempt: 1 };

        loop {
            on_phase(&phase);
            phase = match phase {
                LoadPhase::Fetching { attempt } => {
                    match self.source.load_captions(source_id).await {
                        Ok(entries) => {
                            let track = CaptionTrack::from_entries(entries);
                            if !track.is_empty() {
                                log_info!(
                                    "loaded {} captions for {source_id} on attempt {attempt}",
                                    track.len()
                                );
                                return FetchedTrack {
                                    track,
                                    from_backup: false,
                                    attempts: attempt,
                                };
                            }
                            log_warn!("transcript for {source_id} empty (attempt {attempt}/{max_attempts})");
                        }
                        Err(err) => {
                            log_warn!(
                                "transcript fetch for {source_id} failed (attempt {attempt}/{max_attempts}): {err:?}"
                            );
                        }
                    }

                    if attempt >= max_attempts {
                        LoadPhase::Fallback
                    } else {
                        LoadPhase::BackingOff {
                            attempt,
                            delay: backoff,
                        }
                    }
                }
                LoadPhase::BackingOff { attempt, delay } => {
                    tokio::time::sleep(delay).await;
                    backoff = backoff.saturating_mul(2);
                    LoadPhase::Fetching {
                        attempt: attempt + 1,
                    }
                }
                LoadPhase::Fallback => {
                    log_warn!("using backup captions for {source_id} after {max_attempts} attempts");
                    return FetchedTrack {
                        track: backup_track(),
                        from_backup: true,
                        attempts: max_attempts,
                    };
                }
                // Only fetch phases are produced above.
                other => other,
            };
        }
    }
}

/// The session's caption sequence and its translated counterpart.
#[derive(Debug, Clone)]
pub struct CaptionStore {
    track: CaptionTrack,
    phase: LoadPhase,
    from_backup: bool,
}

impl Default for CaptionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptionStore {
    pub fn new() -> Self {
        Self {
            track: CaptionTrack::new(),
            phase: LoadPhase::Idle,
            from_backup: false,
        }
    }

    pub fn track(&self) -> &CaptionTrack {
        &self.track
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn is_backup(&self) -> bool {
        self.from_backup
    }

    pub fn set_phase(&mut self, phase: LoadPhase) {
        self.phase = phase;
    }

    /// Install a freshly fetched track, dropping whatever was there.
    pub fn replace(&mut self, fetched: FetchedTrack) {
        self.track = fetched.track;
        self.from_backup = fetched.from_backup;
        self.phase = LoadPhase::Translating;
    }

    /// Apply the translation stage's output in one go.
    pub fn apply_translations(&mut self, translations: Vec<String>) {
        if translations.len() != self.track.len() {
            log_warn!(
                "translation count {} does not match track length {}",
                translations.len(),
                self.track.len()
            );
        }
        self.track.apply_translations(translations);
        self.phase = if self.from_backup {
            LoadPhase::Fallback
        } else {
            LoadPhase::Ready
        };
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}
