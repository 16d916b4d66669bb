pub mod backup;
pub mod store;
pub mod translation;

pub use backup::backup_track;
pub use store::{
    CaptionLoader, CaptionStore, FetchedTrack, LoadPhase, RetryPolicy, TranscriptSource,
};
pub use translation::{FallbackTable, TranslationConfig, TranslationPipeline, Translator};
