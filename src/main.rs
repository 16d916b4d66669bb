//! Drives the caption engine against a simulated player for manual checks.
//!
//! `captionsync [seconds] [start-offset]` plays the built-in backup track
//! through a fake embedded player with jittery reply latency and prints every
//! caption change. Settings come from `$CAPTIONSYNC_SETTINGS`, or a JSON file
//! in the temp directory, and fall back to defaults when neither exists.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use captionsync_lib::{
    bridge::ListenerId,
    init_logging,
    overlay::{CaptionOverlay, HostSurfaceState, LoadProgress, RenderedLines},
    CaptionEntry, PlayerChannel, SessionController, SessionDeps, SettingsStore,
    TranscriptSource, Translator,
};

/// Fake embedded player: answers commands after a random delay with a
/// slightly noisy position.
struct SimulatedPlayer {
    started: Instant,
    offset_secs: f64,
    listeners: Mutex<HashMap<ListenerId, mpsc::UnboundedSender<String>>>,
    next_id: Mutex<ListenerId>,
}

impl SimulatedPlayer {
    fn new(offset_secs: f64) -> Self {
        Self {
            started: Instant::now(),
            offset_secs,
            listeners: Mutex::new(HashMap::new()),
            next_id: Mutex::new(0),
        }
    }

    fn reply(&self, message: Value) {
        let mut rng = rand::thread_rng();
        let latency = Duration::from_millis(rng.gen_range(5..80));
        // Occasionally the reply never comes back.
        if rng.gen_bool(0.05) {
            return;
        }
        let senders: Vec<_> = match self.listeners.lock() {
            Ok(listeners) => listeners.values().cloned().collect(),
            Err(_) => return,
        };
        let raw = message.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            for sender in senders {
                let _ = sender.send(raw.clone());
            }
        });
    }

    fn position(&self) -> f64 {
        let noise = rand::thread_rng().gen_range(-0.04..0.04);
        (self.offset_secs + self.started.elapsed().as_secs_f64() + noise).max(0.0)
    }
}

impl PlayerChannel for SimulatedPlayer {
    fn post(&self, message: &str) -> Result<()> {
        let request: Value = serde_json::from_str(message)?;
        match request["func"].as_str() {
            Some("getCurrentTime") => self.reply(json!({
                "event": "infoDelivery",
                "info": { "currentTime": self.position() }
            })),
            Some("getPlayerState") => self.reply(json!({
                "event": "onStateChange",
                "info": 1
            })),
            _ => {}
        }
        Ok(())
    }

    fn add_listener(&self, sender: mpsc::UnboundedSender<String>) -> ListenerId {
        let mut next_id = self.next_id.lock().unwrap_or_else(|p| p.into_inner());
        *next_id += 1;
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(*next_id, sender);
        }
        *next_id
    }

    fn remove_listener(&self, id: ListenerId) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.remove(&id);
        }
    }
}

/// No network in the demo: every fetch fails and the backup track is used.
struct OfflineTranscripts;

#[async_trait]
impl TranscriptSource for OfflineTranscripts {
    async fn load_captions(&self, source_id: &str) -> Result<Vec<CaptionEntry>> {
        Err(anyhow!("no transcript service configured for {source_id}"))
    }
}

struct OfflineTranslator;

#[async_trait]
impl Translator for OfflineTranslator {
    async fn translate_batch(
        &self,
        _texts: &[String],
        target_language: &str,
    ) -> Result<Vec<Option<String>>> {
        Err(anyhow!("no translation provider configured for {target_language}"))
    }
}

struct StdoutOverlay;

impl CaptionOverlay for StdoutOverlay {
    fn capture_host_state(&mut self) -> HostSurfaceState {
        HostSurfaceState::default()
    }

    fn restore_host_state(&mut self, _state: HostSurfaceState) {}

    fn mount(&mut self) -> Result<()> {
        println!("── overlay mounted ──");
        Ok(())
    }

    fn unmount(&mut self) {
        println!("── overlay removed ──");
    }

    fn render_lines(&mut self, lines: &RenderedLines) -> Result<()> {
        if lines.is_blank() {
            println!("   (no caption)");
        } else {
            println!("   {}\n   {}", lines.source, lines.translated);
        }
        Ok(())
    }

    fn write_plain(&mut self, source: &str, translated: &str) {
        println!("   {source} / {translated}");
    }

    fn show_progress(&mut self, progress: LoadProgress) {
        println!("   loading captions: {:?} {}%", progress.stage, progress.percent);
    }

    fn hide_progress(&mut self) {}
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let seconds: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(15);
    let offset: f64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(0.0);

    let settings_path = std::env::var_os("CAPTIONSYNC_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("captionsync-settings.json"));
    let settings_store = SettingsStore::new(settings_path)?;
    let settings = settings_store.captions();
    info!(
        "translating to {} with {} load attempts",
        settings.target_language, settings.load_max_attempts
    );
    let player = Arc::new(SimulatedPlayer::new(offset));
    let controller = SessionController::new(
        Box::new(StdoutOverlay),
        SessionDeps {
            channel: player,
            transcripts: Arc::new(OfflineTranscripts),
            translator: Arc::new(OfflineTranslator),
        },
        &settings,
    );

    info!("simulating {seconds}s of playback from {offset}s");
    controller.enter("demo").await?;
    tokio::time::sleep(Duration::from_secs(seconds)).await;

    let summary = controller.snapshot().await;
    info!("session summary: {}", serde_json::to_string(&summary)?);
    controller.exit().await?;
    Ok(())
}
