//! Events a database handle emits on its subscription stream.

use std::sync::Arc;

/// # State-change notification from a database handle.
///
/// Delivered through [`Database::events`](crate::Database::events). The
/// lifecycle controller reacts to these during steady state; during an
/// intentional close, `Disconnected` is the expected echo of the close and
/// is ignored.
#[derive(Debug, Clone)]
pub enum DbEvent {
    /// The connection is established (initial connect or driver-internal
    /// reconnect).
    Connected,
    /// The connection is gone.
    Disconnected,
    /// The driver reported a runtime error on an established connection.
    Errored {
        /// Driver-provided description.
        message: Arc<str>,
    },
}

impl DbEvent {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DbEvent::Connected => "db_connected",
            DbEvent::Disconnected => "db_disconnected",
            DbEvent::Errored { .. } => "db_errored",
        }
    }
}
