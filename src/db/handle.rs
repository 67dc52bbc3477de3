//! The [`Database`] trait: the contract between the lifecycle and a driver.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{DbEvent, DriverError};

/// Shared handle type used across the runtime.
pub type DbRef = Arc<dyn Database>;

/// Connection state of a database handle.
///
/// Teardown consults this: a handle that already reports `Disconnected`
/// gets no close operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbState {
    /// No connection. The idle and terminal state.
    Disconnected,
    /// A connect call is in flight.
    Connecting,
    /// Connected and usable.
    Connected,
    /// A close call is in flight.
    Disconnecting,
}

impl DbState {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DbState::Disconnected => "disconnected",
            DbState::Connecting => "connecting",
            DbState::Connected => "connected",
            DbState::Disconnecting => "disconnecting",
        }
    }
}

/// # Database connection lifecycle, as seen by the controller.
///
/// ## Contract
/// - `connect` performs one connection attempt and resolves when the
///   connection is usable (or fails with the raw [`DriverError`]). The
///   establisher calls it once per retry attempt.
/// - `state` is a cheap, non-blocking snapshot.
/// - `close` tears the connection down gracefully and is safe to call in
///   any state.
/// - `events` returns a fresh receiver on the handle's broadcast stream;
///   implementations emit [`DbEvent`]s for connects, disconnects, and
///   runtime errors. Dropped receivers must not block the driver.
///
/// # Example
/// ```no_run
/// use async_trait::async_trait;
/// use tokio::sync::broadcast;
/// use servisor::{Database, DbEvent, DbState, DriverError};
///
/// struct PoolHandle {
///     events: broadcast::Sender<DbEvent>,
///     // driver pool, state tracking, ...
/// }
///
/// #[async_trait]
/// impl Database for PoolHandle {
///     async fn connect(&self) -> Result<(), DriverError> {
///         // drive the pool, map the driver error onto DriverError
///         Ok(())
///     }
///
///     fn state(&self) -> DbState {
///         DbState::Connected
///     }
///
///     async fn close(&self) -> Result<(), DriverError> {
///         Ok(())
///     }
///
///     fn events(&self) -> broadcast::Receiver<DbEvent> {
///         self.events.subscribe()
///     }
/// }
/// ```
#[async_trait]
pub trait Database: Send + Sync + 'static {
    /// Performs one connection attempt.
    async fn connect(&self) -> Result<(), DriverError>;

    /// Snapshot of the current connection state.
    fn state(&self) -> DbState;

    /// Gracefully closes the connection.
    async fn close(&self) -> Result<(), DriverError>;

    /// Subscribes to the handle's event stream.
    fn events(&self) -> broadcast::Receiver<DbEvent>;
}
