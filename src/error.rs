//! Error types used across the service lifecycle.
//!
//! This module defines the lifecycle error taxonomy:
//!
//! - [`ConnectError`] — a classified database connection failure.
//! - [`ShutdownReason`] — why a shutdown was requested.
//! - [`ShutdownError`] — a failure inside the teardown sequence.
//!
//! All types provide stable snake_case labels (`as_label`) for logging and
//! metrics, and human-readable `Display` output.

use thiserror::Error;

use crate::db::{DriverError, DriverErrorKind};

/// Authentication-failure code reported by the database server on the wire.
const SERVER_AUTH_FAILED: i32 = 18;

/// Classification of a database connection failure.
///
/// Every raw [`DriverError`] maps to exactly one kind; see
/// [`ConnectError::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectErrorKind {
    /// Generic connection failure (the catch-all class).
    Connection,
    /// Network-level failure (DNS, refused, reset).
    Network,
    /// The driver gave up waiting for a reachable server.
    Timeout,
    /// The server rejected the credentials.
    Auth,
}

impl ConnectErrorKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConnectErrorKind::Connection => "database_connection_error",
            ConnectErrorKind::Network => "database_network_error",
            ConnectErrorKind::Timeout => "database_timeout_error",
            ConnectErrorKind::Auth => "database_auth_error",
        }
    }
}

/// # A classified database connection failure.
///
/// Produced by [`ConnectError::classify`] from the raw driver failure plus
/// the 0-based attempt index, and returned by the connection establisher
/// once its retry budget is exhausted.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ConnectError {
    /// Failure class.
    pub kind: ConnectErrorKind,
    /// Human-facing number of attempts performed when this was classified.
    /// Fixed at 0 for [`ConnectErrorKind::Auth`].
    pub attempts: u32,
    /// Human-readable description.
    pub message: String,
}

impl ConnectError {
    /// Classifies a raw driver failure observed on the given 0-based attempt.
    ///
    /// The mapping is total:
    ///
    /// - selection timeouts and operation timeouts → [`ConnectErrorKind::Timeout`],
    ///   with the attempt count and the raw driver text baked into the message;
    /// - network failures → [`ConnectErrorKind::Network`];
    /// - server code 18 (authentication failed) → [`ConnectErrorKind::Auth`],
    ///   with `attempts` fixed at 0: credentials do not get better with
    ///   retries, so the count carries no signal (the retry loop still runs
    ///   its full budget regardless);
    /// - every other server code, and anything unrecognized →
    ///   [`ConnectErrorKind::Connection`].
    ///
    /// # Example
    /// ```
    /// use servisor::{ConnectError, ConnectErrorKind, DriverError, DriverErrorKind};
    ///
    /// let raw = DriverError::new(DriverErrorKind::SelectionTimeout, "no servers reachable");
    /// let err = ConnectError::classify(&raw, 4);
    /// assert_eq!(err.kind, ConnectErrorKind::Timeout);
    /// assert_eq!(err.message, "database timeout after 5 attempts: no servers reachable");
    /// ```
    pub fn classify(raw: &DriverError, attempt: u32) -> ConnectError {
        let attempts = attempt.saturating_add(1);
        match raw.kind {
            DriverErrorKind::SelectionTimeout | DriverErrorKind::Timeout => ConnectError {
                kind: ConnectErrorKind::Timeout,
                attempts,
                message: format!("database timeout after {attempts} attempts: {}", raw.message),
            },
            DriverErrorKind::Network => ConnectError {
                kind: ConnectErrorKind::Network,
                attempts,
                message: raw.message.clone(),
            },
            // Auth failures are not retryable in spirit; the count stays 0.
            DriverErrorKind::Server { code } if code == SERVER_AUTH_FAILED => ConnectError {
                kind: ConnectErrorKind::Auth,
                attempts: 0,
                message: raw.message.clone(),
            },
            DriverErrorKind::Server { .. } | DriverErrorKind::Other => ConnectError {
                kind: ConnectErrorKind::Connection,
                attempts,
                message: raw.message.clone(),
            },
        }
    }

    /// Sentinel for the defensive arm of the retry loop: the budget ran out
    /// without any failure being captured. A correct loop never builds one.
    pub fn unknown() -> ConnectError {
        ConnectError {
            kind: ConnectErrorKind::Connection,
            attempts: 0,
            message: "unknown error during database connection attempts".to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        self.kind.as_label()
    }
}

/// # Why a shutdown was requested.
///
/// Every trigger that can end the process maps to one of these; the reason
/// travels with shutdown events and with [`ShutdownError`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownReason {
    /// SIGTERM received.
    Sigterm,
    /// SIGINT (ctrl-c) received.
    Sigint,
    /// A supervised background task failed or panicked.
    TaskFailure,
    /// An uncaught panic was reported through the panic hook.
    Panic,
    /// The network listener reported a runtime error after starting.
    ListenerError,
    /// The database reported a runtime error.
    DatabaseError,
    /// The database disconnected outside of an intentional close.
    UnexpectedDisconnect,
    /// The startup sequence failed.
    StartupFailure,
}

impl ShutdownReason {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servisor::ShutdownReason;
    ///
    /// assert_eq!(ShutdownReason::Sigterm.as_label(), "sigterm");
    /// assert_eq!(ShutdownReason::UnexpectedDisconnect.as_label(), "unexpected_disconnect");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownReason::Sigterm => "sigterm",
            ShutdownReason::Sigint => "sigint",
            ShutdownReason::TaskFailure => "task_failure",
            ShutdownReason::Panic => "panic",
            ShutdownReason::ListenerError => "listener_error",
            ShutdownReason::DatabaseError => "database_error",
            ShutdownReason::UnexpectedDisconnect => "unexpected_disconnect",
            ShutdownReason::StartupFailure => "startup_failure",
        }
    }
}

impl std::fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ShutdownReason::Sigterm => "SIGTERM",
            ShutdownReason::Sigint => "SIGINT",
            ShutdownReason::TaskFailure => "background task failure",
            ShutdownReason::Panic => "uncaught panic",
            ShutdownReason::ListenerError => "listener error",
            ShutdownReason::DatabaseError => "database error",
            ShutdownReason::UnexpectedDisconnect => "unexpected database disconnection",
            ShutdownReason::StartupFailure => "startup failure",
        };
        f.write_str(text)
    }
}

/// # A failure inside the teardown sequence.
///
/// One instance describes either a single close operation that failed, the
/// aggregate of several, or the teardown deadline firing. The originating
/// [`ShutdownReason`] travels with it.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ShutdownError {
    /// The reason of the shutdown this failure occurred in.
    pub reason: ShutdownReason,
    /// Human-readable description.
    pub message: String,
}

impl ShutdownError {
    /// Wraps a single close failure.
    pub fn new(reason: ShutdownReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    /// Folds several close failures into one summary error.
    ///
    /// # Example
    /// ```
    /// use servisor::{ShutdownError, ShutdownReason};
    ///
    /// let errs = vec![
    ///     ShutdownError::new(ShutdownReason::Sigterm, "listener close failed: still draining"),
    ///     ShutdownError::new(ShutdownReason::Sigterm, "database close failed: socket reset"),
    /// ];
    /// let agg = ShutdownError::aggregate(ShutdownReason::Sigterm, &errs);
    /// assert_eq!(
    ///     agg.message,
    ///     "shutdown completed with 2 error(s): listener close failed: still draining; database close failed: socket reset",
    /// );
    /// ```
    pub fn aggregate(reason: ShutdownReason, errors: &[ShutdownError]) -> Self {
        let joined = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            reason,
            message: format!("shutdown completed with {} error(s): {joined}", errors.len()),
        }
    }

    /// The teardown deadline fired before the close operations settled.
    pub fn timed_out(reason: ShutdownReason) -> Self {
        Self {
            reason,
            message: "shutdown timeout exceeded".to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "shutdown_error"
    }
}

/// # Final disposition of the lifecycle.
///
/// Returned by [`Lifecycle::run`](crate::Lifecycle::run); the host binary
/// maps it onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Every close operation finished cleanly within the deadline.
    Clean,
    /// Teardown reported failures, hit its deadline, or startup failed.
    Failed,
}

impl ExitStatus {
    /// The process exit code for this disposition.
    pub fn code(&self) -> i32 {
        match self {
            ExitStatus::Clean => 0,
            ExitStatus::Failed => 1,
        }
    }

    /// True for [`ExitStatus::Clean`].
    pub fn is_clean(&self) -> bool {
        matches!(self, ExitStatus::Clean)
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Clean => std::process::ExitCode::SUCCESS,
            ExitStatus::Failed => std::process::ExitCode::FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(kind: DriverErrorKind) -> DriverError {
        DriverError::new(kind, "boom")
    }

    #[test]
    fn selection_timeout_classifies_as_timeout() {
        let err = ConnectError::classify(&raw(DriverErrorKind::SelectionTimeout), 0);
        assert_eq!(err.kind, ConnectErrorKind::Timeout);
        assert_eq!(err.attempts, 1);
        assert_eq!(err.message, "database timeout after 1 attempts: boom");
    }

    #[test]
    fn operation_timeout_classifies_as_timeout() {
        let err = ConnectError::classify(&raw(DriverErrorKind::Timeout), 2);
        assert_eq!(err.kind, ConnectErrorKind::Timeout);
        assert_eq!(err.message, "database timeout after 3 attempts: boom");
    }

    #[test]
    fn network_failure_keeps_raw_message() {
        let err = ConnectError::classify(&raw(DriverErrorKind::Network), 1);
        assert_eq!(err.kind, ConnectErrorKind::Network);
        assert_eq!(err.attempts, 2);
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn server_code_18_classifies_as_auth() {
        let err = ConnectError::classify(&raw(DriverErrorKind::Server { code: 18 }), 0);
        assert_eq!(err.kind, ConnectErrorKind::Auth);
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn auth_attempt_count_stays_zero_regardless_of_retries() {
        for attempt in [0, 1, 3, 4] {
            let err = ConnectError::classify(&raw(DriverErrorKind::Server { code: 18 }), attempt);
            assert_eq!(err.kind, ConnectErrorKind::Auth);
            assert_eq!(err.attempts, 0, "attempt {attempt}");
        }
    }

    #[test]
    fn other_server_codes_classify_as_connection() {
        for code in [0, 1, 13, 17, 19, 211] {
            let err = ConnectError::classify(&raw(DriverErrorKind::Server { code }), 0);
            assert_eq!(err.kind, ConnectErrorKind::Connection, "code {code}");
        }
    }

    #[test]
    fn unrecognized_failures_classify_as_connection() {
        let err = ConnectError::classify(&raw(DriverErrorKind::Other), 3);
        assert_eq!(err.kind, ConnectErrorKind::Connection);
        assert_eq!(err.message, "boom");
    }

    #[test]
    fn sentinel_has_connection_kind_and_fixed_message() {
        let err = ConnectError::unknown();
        assert_eq!(err.kind, ConnectErrorKind::Connection);
        assert_eq!(err.message, "unknown error during database connection attempts");
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(ConnectErrorKind::Connection.as_label(), "database_connection_error");
        assert_eq!(ConnectErrorKind::Network.as_label(), "database_network_error");
        assert_eq!(ConnectErrorKind::Timeout.as_label(), "database_timeout_error");
        assert_eq!(ConnectErrorKind::Auth.as_label(), "database_auth_error");
    }

    #[test]
    fn aggregate_counts_and_joins_messages() {
        let errs = vec![
            ShutdownError::new(ShutdownReason::Sigint, "a"),
            ShutdownError::new(ShutdownReason::Sigint, "b"),
            ShutdownError::new(ShutdownReason::Sigint, "c"),
        ];
        let agg = ShutdownError::aggregate(ShutdownReason::Sigint, &errs);
        assert_eq!(agg.message, "shutdown completed with 3 error(s): a; b; c");
        assert_eq!(agg.reason, ShutdownReason::Sigint);
    }

    #[test]
    fn exit_status_maps_to_process_codes() {
        assert_eq!(ExitStatus::Clean.code(), 0);
        assert_eq!(ExitStatus::Failed.code(), 1);
        assert!(ExitStatus::Clean.is_clean());
        assert!(!ExitStatus::Failed.is_clean());
    }

    #[test]
    fn reason_display_matches_trigger_names() {
        assert_eq!(ShutdownReason::Sigterm.to_string(), "SIGTERM");
        assert_eq!(ShutdownReason::Sigint.to_string(), "SIGINT");
        assert_eq!(
            ShutdownReason::UnexpectedDisconnect.to_string(),
            "unexpected database disconnection"
        );
    }
}
