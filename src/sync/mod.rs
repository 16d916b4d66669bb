pub mod config;
pub mod reconciler;
pub mod selector;

pub use config::SyncConfig;
pub use reconciler::{DisplayReconciler, ReconcileOutcome, SelectionState};
pub use selector::{select, select_at, Selection};
