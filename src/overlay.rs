use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The pair of lines the overlay shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedLines {
    pub source: String,
    pub translated: String,
}

impl RenderedLines {
    pub fn new(source: impl Into<String>, translated: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            translated: translated.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.source.is_empty() && self.translated.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadStage {
    Fetching,
    Translating,
    Done,
    Fallback,
}

/// Progress shown while the caption store loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadProgress {
    pub stage: LoadStage,
    pub percent: u8,
}

/// Host page state captured on entry and put back on exit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSurfaceState {
    pub properties: BTreeMap<String, String>,
}

/// Render target for the two caption lines.
///
/// Implementations wrap whatever actually paints (DOM overlay, terminal,
/// test recorder). The reconciler only calls `render_lines`/`clear` when the
/// visible content must change.
pub trait CaptionOverlay: Send {
    fn capture_host_state(&mut self) -> HostSurfaceState;

    fn restore_host_state(&mut self, state: HostSurfaceState);

    fn mount(&mut self) -> Result<()>;

    fn unmount(&mut self);

    fn render_lines(&mut self, lines: &RenderedLines) -> Result<()>;

    /// Plain-text write used when `render_lines` fails.
    fn write_plain(&mut self, source: &str, translated: &str);

    fn clear(&mut self) -> Result<()> {
        self.render_lines(&RenderedLines::default())
    }

    fn show_progress(&mut self, progress: LoadProgress);

    fn hide_progress(&mut self);
}
