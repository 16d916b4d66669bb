pub mod controller;
pub mod state;
mod sync_loop;

pub use controller::{SessionController, SessionDeps};
pub use state::{SessionEvent, SessionSnapshot, SessionState, SessionStatus};
