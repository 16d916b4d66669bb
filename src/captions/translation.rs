use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::settings::CaptionSettings;

use super::backup::backup_translations;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// External translation provider.
///
/// May return fewer items than requested or `None` holes; the pipeline
/// fills both from the fallback table.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate_batch(
        &self,
        texts: &[String],
        target_language: &str,
    ) -> Result<Vec<Option<String>>>;
}

/// Deterministic offline translations keyed by exact source text.
#[derive(Debug, Clone, Default)]
pub struct FallbackTable {
    entries: HashMap<String, String>,
}

impl FallbackTable {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Table shipped with the crate for `target_language`.
    pub fn builtin(target_language: &str) -> Self {
        Self::new(backup_translations(target_language))
    }

    /// Table value, or the source wrapped in brackets when there is none.
    pub fn lookup(&self, text: &str) -> String {
        self.entries
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("[{text}]"))
    }
}

#[derive(Debug, Clone)]
pub struct TranslationConfig {
    pub target_language: String,
    pub batch_size: usize,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target_language: "zh-CN".into(),
            batch_size: 40,
        }
    }
}

impl From<&CaptionSettings> for TranslationConfig {
    fn from(settings: &CaptionSettings) -> Self {
        Self {
            target_language: settings.target_language.clone(),
            batch_size: settings.translation_batch_size.max(1),
        }
    }
}

pub struct TranslationPipeline {
    translator: Arc<dyn Translator>,
    fallback: FallbackTable,
    config: TranslationConfig,
}

impl TranslationPipeline {
    pub fn new(translator: Arc<dyn Translator>, config: TranslationConfig) -> Self {
        let fallback = FallbackTable::builtin(&config.target_language);
        Self::with_fallback(translator, config, fallback)
    }

    pub fn with_fallback(
        translator: Arc<dyn Translator>,
        config: TranslationConfig,
        fallback: FallbackTable,
    ) -> Self {
        Self {
            translator,
            fallback,
            config,
        }
    }

    /// Translate every text, batch by batch. The result is index-aligned
    /// with `texts` and never contains an empty string.
    pub async fn translate(&self, texts: &[String]) -> Vec<String> {
        let mut translated = Vec::with_capacity(texts.len());
        let mut fallback_count = 0usize;

        for (batch_index, batch) in texts.chunks(self.config.batch_size.max(1)).enumerate() {
            let response = match self
                .translator
                .translate_batch(batch, &self.config.target_language)
                .await
            {
                Ok(response) => {
                    if response.len() < batch.len() {
                        log_warn!(
                            "translation batch {batch_index} returned {} of {} items",
                            response.len(),
                            batch.len()
                        );
                    }
                    response
                }
                Err(err) => {
                    log_warn!("translation batch {batch_index} failed, using fallback: {err:?}");
                    Vec::new()
                }
            };

            let mut response = response.into_iter();
            for text in batch {
                match response.next().flatten().filter(|t| !t.trim().is_empty()) {
                    Some(value) => translated.push(value),
                    None => {
                        fallback_count += 1;
                        translated.push(self.fallback.lookup(text));
                    }
                }
            }
        }

        log_info!(
            "translated {} captions to {} ({} from fallback)",
            texts.len(),
            self.config.target_language,
            fallback_count
        );
        translated
    }
}
