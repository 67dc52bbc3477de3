//! Errors returned by listener start/close.

use thiserror::Error;

/// # Failure starting or closing a listener.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ListenError {
    /// Binding the socket failed.
    #[error("bind failed: {0}")]
    Bind(#[from] std::io::Error),

    /// `start` was called while the listener was already running.
    #[error("listener already started")]
    AlreadyStarted,

    /// `close` was called before a successful `start`.
    #[error("listener not started")]
    NotStarted,

    /// The accept loop could not be joined cleanly during close.
    #[error("close failed: {reason}")]
    CloseFailed {
        /// Join failure description.
        reason: String,
    },
}

impl ListenError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenError::Bind(_) => "listener_bind_failed",
            ListenError::AlreadyStarted => "listener_already_started",
            ListenError::NotStarted => "listener_not_started",
            ListenError::CloseFailed { .. } => "listener_close_failed",
        }
    }
}
