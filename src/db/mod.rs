//! Database collaborator contract.
//!
//! The lifecycle controller never talks to a driver directly; it drives an
//! injected [`Database`] handle through connect/close and observes its
//! [`DbEvent`] stream. Failures surface as the raw [`DriverError`] model,
//! which the classifier in [`crate::error`] maps onto connect error classes.

mod error;
mod event;
mod handle;

pub use error::{DriverError, DriverErrorKind};
pub use event::DbEvent;
pub use handle::{Database, DbRef, DbState};
