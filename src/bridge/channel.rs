use anyhow::Result;
use tokio::sync::mpsc;

pub type ListenerId = u64;

/// Asynchronous message link to the isolated playback surface.
///
/// There are no synchronous reads: the only way to learn anything about the
/// player is to `post` a request and wait for raw messages to show up on a
/// registered listener. Responses carry no request id.
pub trait PlayerChannel: Send + Sync {
    fn post(&self, message: &str) -> Result<()>;

    /// Route every inbound raw message to `sender` until removed.
    fn add_listener(&self, sender: mpsc::UnboundedSender<String>) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}
