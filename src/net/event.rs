//! Events a listener emits on its subscription stream.

use std::net::SocketAddr;
use std::sync::Arc;

/// # State-change notification from a listener.
///
/// Delivered through [`Listener::events`](crate::Listener::events). After a
/// successful start, `Error` is the signal the lifecycle reacts to; it means
/// the accept loop hit a failure the listener could not absorb.
#[derive(Debug, Clone)]
pub enum NetEvent {
    /// The listener is bound and accepting.
    Started {
        /// The bound local address.
        addr: SocketAddr,
    },
    /// The listener stopped accepting and drained its connections.
    Closed,
    /// The accept loop reported a runtime error.
    Error {
        /// Failure description.
        message: Arc<str>,
    },
}

impl NetEvent {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            NetEvent::Started { .. } => "listener_started",
            NetEvent::Closed => "listener_closed",
            NetEvent::Error { .. } => "listener_error",
        }
    }
}
