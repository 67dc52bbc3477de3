//! # Teardown: concurrent, isolated, deadline-bounded resource closes.
//!
//! Runs after [`Lifecycle::shutdown`](crate::Lifecycle::shutdown) wins the
//! idempotency gate. Builds one close operation per **active** resource,
//! runs them concurrently, aggregates their failures order-independently,
//! and races the whole settlement against the teardown deadline.
//!
//! ```text
//! run(reason)
//!   ├─► listener.is_listening()      → close the listener
//!   ├─► db.state() != Disconnected   → close the database
//!   │     (neither? → NothingToClose, Clean)
//!   │
//!   ├─► join_all(closes)  ─┐
//!   │                      ├─ with_deadline(shutdown_timeout)
//!   │   deadline timer  ───┘
//!   │
//!   ├─ all Ok          → ShutdownComplete, Clean
//!   ├─ some Err        → ShutdownFailed ("{n} error(s): ..."), Failed
//!   └─ deadline fired  → ShutdownFailed ("shutdown timeout exceeded"), Failed
//! ```
//!
//! ## Rules
//! - Each close is isolated: an error or panic in one never blocks or skips
//!   the other (`catch_unwind` per operation).
//! - Relative completion order of the closes does not affect the aggregate.
//! - On a deadline the lifecycle token is cancelled so in-flight closes are
//!   told to stop, not merely abandoned.

use std::future::Future;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use tokio_util::sync::CancellationToken;

use crate::core::deadline::with_deadline;
use crate::db::{Database, DbState};
use crate::error::{ExitStatus, ShutdownError, ShutdownReason};
use crate::events::{Bus, Event, EventKind, Resource};
use crate::net::Listener;

/// Closes every active resource and reports the disposition.
///
/// Never returns an error; all failure modes fold into
/// [`ExitStatus::Failed`].
pub(crate) async fn run(
    reason: ShutdownReason,
    db: &dyn Database,
    listener: &dyn Listener,
    timeout: Duration,
    cancel: &CancellationToken,
    bus: &Bus,
) -> ExitStatus {
    let mut closes: Vec<BoxFuture<'_, Result<(), ShutdownError>>> = Vec::new();

    if listener.is_listening() {
        closes.push(close_resource(Resource::Listener, reason, bus, listener.close()).boxed());
    }
    if db.state() != DbState::Disconnected {
        closes.push(close_resource(Resource::Database, reason, bus, db.close()).boxed());
    }

    if closes.is_empty() {
        bus.publish(Event::new(EventKind::NothingToClose).with_trigger(reason));
        return ExitStatus::Clean;
    }

    match with_deadline(timeout, cancel, join_all(closes)).await {
        Ok(settled) => {
            let failures: Vec<ShutdownError> =
                settled.into_iter().filter_map(Result::err).collect();
            if failures.is_empty() {
                bus.publish(Event::new(EventKind::ShutdownComplete).with_trigger(reason));
                ExitStatus::Clean
            } else {
                let agg = ShutdownError::aggregate(reason, &failures);
                bus.publish(
                    Event::new(EventKind::ShutdownFailed)
                        .with_trigger(reason)
                        .with_reason(agg.message),
                );
                ExitStatus::Failed
            }
        }
        Err(_deadline) => {
            let err = ShutdownError::timed_out(reason);
            bus.publish(
                Event::new(EventKind::ShutdownFailed)
                    .with_trigger(reason)
                    .with_reason(err.message),
            );
            ExitStatus::Failed
        }
    }
}

/// Drives one close operation and converts every outcome into a value.
///
/// Errors map to a [`ShutdownError`] with a resource-specific message;
/// panics are caught and mapped the same way. Publishes `CloseSucceeded` /
/// `CloseFailed` per resource.
async fn close_resource<E>(
    resource: Resource,
    reason: ShutdownReason,
    bus: &Bus,
    close: impl Future<Output = Result<(), E>>,
) -> Result<(), ShutdownError>
where
    E: std::fmt::Display,
{
    let outcome = std::panic::AssertUnwindSafe(close).catch_unwind().await;

    let message = match outcome {
        Ok(Ok(())) => {
            bus.publish(
                Event::new(EventKind::CloseSucceeded)
                    .with_resource(resource)
                    .with_trigger(reason),
            );
            return Ok(());
        }
        Ok(Err(err)) => format!("{} close failed: {err}", resource.as_label()),
        Err(panic) => format!(
            "{} close panicked: {}",
            resource.as_label(),
            panic_message(&panic)
        ),
    };

    let err = ShutdownError::new(reason, message);
    bus.publish(
        Event::new(EventKind::CloseFailed)
            .with_resource(resource)
            .with_trigger(reason)
            .with_reason(err.message.clone()),
    );
    Err(err)
}

/// Best-effort extraction of a panic payload message.
fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
