pub mod caption;
pub mod snapshot;

pub use caption::{CaptionEntry, CaptionTrack};
pub use snapshot::PlaybackSnapshot;
