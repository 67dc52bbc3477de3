//! Raw failure model reported by [`Database`](crate::Database) implementations.
//!
//! This is the unclassified, driver-shaped view of a failure. The lifecycle
//! never branches on it directly; it goes through
//! [`ConnectError::classify`](crate::ConnectError::classify) first.

use thiserror::Error;

/// Driver-level failure category, as reported by the implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// The driver could not find a reachable server before giving up.
    SelectionTimeout,
    /// An established operation timed out.
    Timeout,
    /// Network-level failure (DNS, refused, reset).
    Network,
    /// The server answered with an error code.
    Server {
        /// Numeric server error code from the wire protocol.
        code: i32,
    },
    /// Anything the implementation could not place in the above.
    Other,
}

/// # Raw failure from a database handle.
///
/// Implementations build these from their driver's native error type; the
/// `kind` drives classification, the `message` is carried through verbatim.
///
/// # Example
/// ```
/// use servisor::{DriverError, DriverErrorKind};
///
/// let err = DriverError::server(13, "not authorized on admin");
/// assert_eq!(err.kind, DriverErrorKind::Server { code: 13 });
/// assert_eq!(err.to_string(), "not authorized on admin");
/// ```
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct DriverError {
    /// Failure category.
    pub kind: DriverErrorKind,
    /// Driver-provided description.
    pub message: String,
}

impl DriverError {
    /// Builds a failure with an explicit kind.
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Server-selection gave up before finding a reachable node.
    pub fn selection_timeout(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::SelectionTimeout, message)
    }

    /// An operation on an established connection timed out.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Timeout, message)
    }

    /// Network-level failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Network, message)
    }

    /// Server-reported failure with its wire error code.
    pub fn server(code: i32, message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Server { code }, message)
    }

    /// Unrecognized failure.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Other, message)
    }
}
