use serde::{Deserialize, Serialize};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_warn;

/// One timed caption line with its (eventual) translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionEntry {
    /// Seconds from the start of the video.
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
}

impl CaptionEntry {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            translated_text: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start < self.end
    }

    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time <= self.end
    }
}

/// Ordered caption sequence for one playback session.
///
/// Built once from the transcript source and replaced wholesale on retry.
/// Entries with `start >= end` never make it in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptionTrack {
    entries: Vec<CaptionEntry>,
}

impl CaptionTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and order raw entries.
    ///
    /// Invalid entries are dropped with a warning. The sort is stable so that
    /// entries sharing a start time keep their source order, which the
    /// selector's first-match tie-break depends on.
    pub fn from_entries(entries: Vec<CaptionEntry>) -> Self {
        let total = entries.len();
        let mut kept: Vec<CaptionEntry> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                if entry.is_valid() {
                    Some(entry)
                } else {
                    log_warn!(
                        "dropping caption #{index} with invalid range [{}, {}]: {:?}",
                        entry.start,
                        entry.end,
                        entry.text
                    );
                    None
                }
            })
            .collect();

        kept.sort_by(|a, b| a.start.total_cmp(&b.start));

        if kept.len() != total {
            log_warn!("caption track kept {} of {} entries", kept.len(), total);
        }

        Self { entries: kept }
    }

    pub fn entries(&self) -> &[CaptionEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&CaptionEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn texts(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.text.clone()).collect()
    }

    /// Replace the translated counterpart for the whole track at once.
    ///
    /// `translations` is index-aligned with the track; missing trailing
    /// values leave the corresponding entries untouched.
    pub fn apply_translations(&mut self, translations: Vec<String>) {
        for (entry, translated) in self.entries.iter_mut().zip(translations) {
            entry.translated_text = Some(translated);
        }
    }

    pub fn is_fully_translated(&self) -> bool {
        self.entries.iter().all(|entry| {
            entry
                .translated_text
                .as_deref()
                .map(|text| !text.trim().is_empty())
                .unwrap_or(false)
        })
    }

    /// Time span covered by the track, if any.
    pub fn span(&self) -> Option<(f64, f64)> {
        let start = self.entries.first()?.start;
        let end = self
            .entries
            .iter()
            .map(|entry| entry.end)
            .fold(f64::NEG_INFINITY, f64::max);
        Some((start, end))
    }
}
