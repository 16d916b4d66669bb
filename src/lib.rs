//! Keeps a bilingual caption overlay in sync with a video playing inside an
//! isolated player that can only be reached through asynchronous messages.
//!
//! The pieces, leaf first:
//! - [`captions`]: caption store, transcript loading with retries and the
//!   backup track, batched translation with a local fallback.
//! - [`bridge`]: the remote clock bridge that polls the player and turns its
//!   replies into [`models::PlaybackSnapshot`]s.
//! - [`sync`]: the caption selector and the display reconciler.
//! - [`session`]: the enter/exit lifecycle wiring it all together.

pub mod bridge;
pub mod captions;
pub mod models;
pub mod overlay;
pub mod session;
pub mod settings;
pub mod sync;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{BridgeConfig, PlayerChannel, RemoteClockBridge};
pub use captions::{CaptionStore, TranscriptSource, Translator};
pub use models::{CaptionEntry, CaptionTrack, PlaybackSnapshot};
pub use overlay::{CaptionOverlay, HostSurfaceState, LoadProgress, RenderedLines};
pub use session::{SessionController, SessionDeps, SessionSnapshot, SessionStatus};
pub use settings::{CaptionSettings, SettingsStore};
pub use sync::{select, select_at, DisplayReconciler, SyncConfig};
pub use utils::init_logging;
