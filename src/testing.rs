//! In-memory collaborators for unit tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::bridge::{ListenerId, PlayerChannel};
use crate::captions::{TranscriptSource, Translator};
use crate::models::CaptionEntry;
use crate::overlay::{CaptionOverlay, HostSurfaceState, LoadProgress, RenderedLines};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Player surface double: records posts, fans deliveries out to listeners.
#[derive(Default)]
pub struct FakeChannel {
    posted: Mutex<Vec<String>>,
    listeners: Mutex<BTreeMap<ListenerId, mpsc::UnboundedSender<String>>>,
    next_id: AtomicU64,
    added: AtomicUsize,
    fail_posts: bool,
}

impl FakeChannel {
    pub fn failing() -> Self {
        Self {
            fail_posts: true,
            ..Self::default()
        }
    }

    pub fn deliver(&self, raw: &str) {
        for sender in lock(&self.listeners).values() {
            let _ = sender.send(raw.to_string());
        }
    }

    pub fn posted(&self) -> Vec<String> {
        lock(&self.posted).clone()
    }

    pub fn command_count(&self) -> usize {
        lock(&self.posted)
            .iter()
            .filter(|raw| raw.contains("\"command\""))
            .count()
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.listeners).len()
    }

    pub fn listeners_added(&self) -> usize {
        self.added.load(Ordering::SeqCst)
    }
}

impl PlayerChannel for FakeChannel {
    fn post(&self, message: &str) -> Result<()> {
        if self.fail_posts {
            bail!("player frame detached");
        }
        lock(&self.posted).push(message.to_string());
        Ok(())
    }

    fn add_listener(&self, sender: mpsc::UnboundedSender<String>) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.added.fetch_add(1, Ordering::SeqCst);
        lock(&self.listeners).insert(id, sender);
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        lock(&self.listeners).remove(&id);
    }
}

#[derive(Debug, Default)]
struct OverlayLog {
    lines: RenderedLines,
    history: Vec<RenderedLines>,
    mutations: usize,
    plain_writes: usize,
    mounted: bool,
    mounts: usize,
    unmounts: usize,
    progress: Vec<LoadProgress>,
    progress_visible: bool,
    restored: Vec<HostSurfaceState>,
}

/// Overlay double; clones share one log so tests can inspect an overlay
/// after handing it to a controller.
#[derive(Clone, Default)]
pub struct RecordingOverlay {
    log: Arc<Mutex<OverlayLog>>,
    fail_renders: bool,
    panic_renders: bool,
}

impl RecordingOverlay {
    pub fn failing() -> Self {
        Self {
            fail_renders: true,
            ..Self::default()
        }
    }

    /// Panics inside `render_lines`, taking the sync task down with it.
    pub fn panicking() -> Self {
        Self {
            panic_renders: true,
            ..Self::default()
        }
    }

    pub fn lines(&self) -> RenderedLines {
        lock(&self.log).lines.clone()
    }

    pub fn history(&self) -> Vec<RenderedLines> {
        lock(&self.log).history.clone()
    }

    pub fn mutations(&self) -> usize {
        lock(&self.log).mutations
    }

    pub fn plain_writes(&self) -> usize {
        lock(&self.log).plain_writes
    }

    pub fn is_mounted(&self) -> bool {
        lock(&self.log).mounted
    }

    pub fn mounts(&self) -> (usize, usize) {
        let log = lock(&self.log);
        (log.mounts, log.unmounts)
    }

    pub fn progress(&self) -> Vec<LoadProgress> {
        lock(&self.log).progress.clone()
    }

    pub fn progress_visible(&self) -> bool {
        lock(&self.log).progress_visible
    }

    pub fn restored(&self) -> Vec<HostSurfaceState> {
        lock(&self.log).restored.clone()
    }

    fn record(&self, lines: RenderedLines) {
        let mut log = lock(&self.log);
        log.mutations += 1;
        log.history.push(lines.clone());
        log.lines = lines;
    }
}

pub fn host_state() -> HostSurfaceState {
    HostSurfaceState {
        properties: BTreeMap::from([("nativeCaptions".to_string(), "visible".to_string())]),
    }
}

impl CaptionOverlay for RecordingOverlay {
    fn capture_host_state(&mut self) -> HostSurfaceState {
        host_state()
    }

    fn restore_host_state(&mut self, state: HostSurfaceState) {
        lock(&self.log).restored.push(state);
    }

    fn mount(&mut self) -> Result<()> {
        let mut log = lock(&self.log);
        log.mounted = true;
        log.mounts += 1;
        Ok(())
    }

    fn unmount(&mut self) {
        let mut log = lock(&self.log);
        log.mounted = false;
        log.unmounts += 1;
        log.lines = RenderedLines::default();
    }

    fn render_lines(&mut self, lines: &RenderedLines) -> Result<()> {
        if self.panic_renders {
            panic!("caption node vanished mid-render");
        }
        if self.fail_renders {
            return Err(anyhow!("caption node detached"));
        }
        self.record(lines.clone());
        Ok(())
    }

    fn write_plain(&mut self, source: &str, translated: &str) {
        lock(&self.log).plain_writes += 1;
        self.record(RenderedLines::new(source, translated));
    }

    fn show_progress(&mut self, progress: LoadProgress) {
        let mut log = lock(&self.log);
        log.progress.push(progress);
        log.progress_visible = true;
    }

    fn hide_progress(&mut self) {
        lock(&self.log).progress_visible = false;
    }
}

/// Transcript source returning fixed entries, optionally failing first.
pub struct StaticTranscript {
    entries: Vec<CaptionEntry>,
    failures_left: AtomicU32,
    calls: AtomicU32,
}

impl StaticTranscript {
    pub fn new(entries: Vec<CaptionEntry>) -> Self {
        Self {
            entries,
            failures_left: AtomicU32::new(0),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing_first(self, failures: u32) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptSource for StaticTranscript {
    async fn load_captions(&self, _source_id: &str) -> Result<Vec<CaptionEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            bail!("transcript endpoint unavailable");
        }
        Ok(self.entries.clone())
    }
}

enum Script {
    Uppercase,
    Reject,
    Respond(Vec<Option<String>>),
}

/// Translator with canned behaviour per batch.
pub struct ScriptedTranslator {
    script: Script,
    failing_batches: Vec<usize>,
    batches: AtomicUsize,
    delay: Duration,
}

impl ScriptedTranslator {
    fn with(script: Script) -> Self {
        Self {
            script,
            failing_batches: Vec::new(),
            batches: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn uppercase() -> Self {
        Self::with(Script::Uppercase)
    }

    pub fn rejecting() -> Self {
        Self::with(Script::Reject)
    }

    pub fn responding(response: Vec<Option<String>>) -> Self {
        Self::with(Script::Respond(response))
    }

    pub fn failing_batches(mut self, batches: &[usize]) -> Self {
        self.failing_batches = batches.to_vec();
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Translator for ScriptedTranslator {
    async fn translate_batch(
        &self,
        texts: &[String],
        _target_language: &str,
    ) -> Result<Vec<Option<String>>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let batch = self.batches.fetch_add(1, Ordering::SeqCst);
        if self.failing_batches.contains(&batch) {
            bail!("translation quota exceeded");
        }
        match &self.script {
            Script::Uppercase => Ok(texts.iter().map(|t| Some(t.to_uppercase())).collect()),
            Script::Reject => Err(anyhow!("translation provider rejected request")),
            Script::Respond(response) => Ok(response.clone()),
        }
    }
}
