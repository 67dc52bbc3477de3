//! The [`Listener`] trait: the contract between the lifecycle and a server.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{ListenError, NetEvent};

/// Shared handle type used across the runtime.
pub type ListenerRef = Arc<dyn Listener>;

/// # Network listener lifecycle, as seen by the controller.
///
/// ## Contract
/// - `start` binds and begins accepting; it resolves with the bound address
///   once the listener is ready. The lifecycle races it against the start
///   deadline, so implementations must tolerate being dropped mid-start.
/// - `is_listening` is a cheap, non-blocking snapshot. Teardown consults
///   it: a listener that is not listening gets no close operation.
/// - `close` stops accepting and drains in-flight connections.
/// - `events` returns a fresh receiver on the listener's broadcast stream.
///   Runtime errors after start surface there; the lifecycle shuts down on
///   them.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Binds and begins accepting; resolves with the bound address.
    async fn start(&self) -> Result<SocketAddr, ListenError>;

    /// Snapshot of whether the listener is currently accepting.
    fn is_listening(&self) -> bool;

    /// Stops accepting and drains in-flight connections.
    async fn close(&self) -> Result<(), ListenError>;

    /// Subscribes to the listener's event stream.
    fn events(&self) -> broadcast::Receiver<NetEvent>;
}
