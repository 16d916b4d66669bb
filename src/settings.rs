use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// User-facing knobs the sync engine reads. Written by the options UI,
/// read-only from the engine's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptionSettings {
    pub target_language: String,
    pub poll_interval_ms: u64,
    pub upcoming_window_secs: f64,
    pub recent_window_secs: f64,
    pub dead_band_secs: f64,
    pub debounce_ms: u64,
    pub extrapolate: bool,
    pub translation_batch_size: usize,
    pub load_max_attempts: u32,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        Self {
            target_language: "zh-CN".into(),
            poll_interval_ms: 50,
            upcoming_window_secs: 3.0,
            recent_window_secs: 2.0,
            dead_band_secs: 0.1,
            debounce_ms: 100,
            extrapolate: false,
            translation_batch_size: 40,
            load_max_attempts: 3,
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<CaptionSettings>,
}

impl SettingsStore {
    /// Open the settings file, falling back to defaults when it is missing
    /// or unreadable as JSON.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            CaptionSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn captions(&self) -> CaptionSettings {
        self.read().clone()
    }

    pub fn target_language(&self) -> String {
        self.read().target_language.clone()
    }

    pub fn update_captions(&self, settings: CaptionSettings) -> Result<()> {
        let mut guard = self.write();
        *guard = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: CaptionSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed settings in {}", self.path.display()))?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &CaptionSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, CaptionSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CaptionSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
