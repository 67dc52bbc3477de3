//! # Lifecycle events published by the controller.
//!
//! The [`EventKind`] enum classifies event types across the lifecycle:
//! - **Connect events**: the retry loop driving the database connection
//! - **Collaborator events**: state changes observed on the database and
//!   the network listener
//! - **Trigger events**: process-level failures that request a shutdown
//! - **Shutdown events**: the teardown sequence and the final disposition
//!
//! The [`Event`] struct carries optional metadata such as attempt numbers,
//! backoff delays, resources, and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use servisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ConnectFailed)
//!     .with_attempt(3)
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::ConnectFailed);
//! assert_eq!(ev.attempt, Some(3));
//! assert_eq!(ev.reason.as_deref(), Some("connection refused"));
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::error::ShutdownReason;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// A resource the teardown sequence closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// The network listener.
    Listener,
    /// The database connection.
    Database,
}

impl Resource {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Resource::Listener => "listener",
            Resource::Database => "database",
        }
    }
}

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `subscriber`, `reason`.
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `subscriber`, `reason`.
    SubscriberOverflow,

    // === Connect events ===
    /// A connection attempt is starting.
    ///
    /// Sets: `attempt` (1-based).
    ConnectAttempt,

    /// A connection attempt failed; the error has been classified.
    ///
    /// Sets: `attempt`, `reason` (classified message).
    ConnectFailed,

    /// A retry is scheduled after a failed attempt.
    ///
    /// Sets: `attempt` (the attempt that failed), `delay_ms`.
    RetryScheduled,

    // === Collaborator events ===
    /// The database connection is established.
    DbConnected,

    /// The database disconnected.
    DbDisconnected,

    /// The database reported a runtime error.
    ///
    /// Sets: `reason`.
    DbErrored,

    /// The network listener is bound and accepting.
    ///
    /// Sets: `addr`.
    ListenerStarted,

    /// The network listener reported a runtime error after starting.
    ///
    /// Sets: `reason`.
    ListenerErrored,

    /// The startup sequence finished; the service is running.
    BootCompleted,

    // === Trigger events ===
    /// A supervised background task failed or panicked.
    ///
    /// Sets: `task`, `reason`.
    TaskFailed,

    /// An uncaught panic was reported through the panic hook.
    ///
    /// Sets: `reason`.
    PanicCaught,

    // === Shutdown events ===
    /// A shutdown was requested and this call won the idempotency gate.
    ///
    /// Sets: `trigger`.
    ShutdownRequested,

    /// A shutdown was requested while one was already in progress; the
    /// request is ignored.
    ///
    /// Sets: `trigger`.
    ShutdownIgnored,

    /// A close operation finished cleanly.
    ///
    /// Sets: `resource`.
    CloseSucceeded,

    /// A close operation failed.
    ///
    /// Sets: `resource`, `reason`.
    CloseFailed,

    /// Neither the listener nor the database was active; teardown had no
    /// work to do.
    NothingToClose,

    /// Every close operation finished cleanly within the deadline.
    ShutdownComplete,

    /// Teardown finished with failures or hit its deadline.
    ///
    /// Sets: `trigger`, `reason` (aggregate or timeout message).
    ShutdownFailed,

    /// The lifecycle is returning its final disposition.
    ///
    /// Sets: `code` (process exit code).
    Exiting,
}

impl EventKind {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::SubscriberPanicked => "subscriber_panicked",
            EventKind::SubscriberOverflow => "subscriber_overflow",
            EventKind::ConnectAttempt => "connect_attempt",
            EventKind::ConnectFailed => "connect_failed",
            EventKind::RetryScheduled => "retry_scheduled",
            EventKind::DbConnected => "db_connected",
            EventKind::DbDisconnected => "db_disconnected",
            EventKind::DbErrored => "db_errored",
            EventKind::ListenerStarted => "listener_started",
            EventKind::ListenerErrored => "listener_errored",
            EventKind::BootCompleted => "boot_completed",
            EventKind::TaskFailed => "task_failed",
            EventKind::PanicCaught => "panic_caught",
            EventKind::ShutdownRequested => "shutdown_requested",
            EventKind::ShutdownIgnored => "shutdown_ignored",
            EventKind::CloseSucceeded => "close_succeeded",
            EventKind::CloseFailed => "close_failed",
            EventKind::NothingToClose => "nothing_to_close",
            EventKind::ShutdownComplete => "shutdown_complete",
            EventKind::ShutdownFailed => "shutdown_failed",
            EventKind::Exiting => "exiting",
        }
    }
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Connection attempt number (1-based).
    pub attempt: Option<u32>,
    /// Backoff delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, panic payloads, aggregates).
    pub reason: Option<Arc<str>>,
    /// The shutdown trigger, where one is in play.
    pub trigger: Option<ShutdownReason>,
    /// The resource a close event refers to.
    pub resource: Option<Resource>,
    /// Bound address of the listener.
    pub addr: Option<SocketAddr>,
    /// Process exit code.
    pub code: Option<i32>,
    /// Name of a supervised background task or a subscriber.
    pub task: Option<Arc<str>>,
    /// Name of the subscriber, for subscriber events.
    pub subscriber: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            attempt: None,
            delay_ms: None,
            reason: None,
            trigger: None,
            resource: None,
            addr: None,
            code: None,
            task: None,
            subscriber: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the shutdown trigger.
    #[inline]
    pub fn with_trigger(mut self, trigger: ShutdownReason) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Attaches a resource.
    #[inline]
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches an attempt number (1-based).
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a bound address.
    #[inline]
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    /// Attaches a process exit code.
    #[inline]
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Attaches a background task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(Arc::from(subscriber));
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(Arc::from(subscriber));
        ev
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::BootCompleted);
        let b = Event::new(EventKind::BootCompleted);
        let c = Event::new(EventKind::BootCompleted);
        assert!(a.seq < b.seq);
        assert!(b.seq < c.seq);
    }

    #[test]
    fn builders_set_fields() {
        let ev = Event::new(EventKind::RetryScheduled)
            .with_attempt(2)
            .with_delay(Duration::from_millis(4000));
        assert_eq!(ev.attempt, Some(2));
        assert_eq!(ev.delay_ms, Some(4000));
        assert!(ev.reason.is_none());
    }

    #[test]
    fn trigger_and_resource_travel_with_shutdown_events() {
        let ev = Event::new(EventKind::CloseFailed)
            .with_resource(Resource::Database)
            .with_trigger(ShutdownReason::Sigterm)
            .with_reason("socket reset");
        assert_eq!(ev.resource, Some(Resource::Database));
        assert_eq!(ev.trigger, Some(ShutdownReason::Sigterm));
    }

    #[test]
    fn delay_saturates_at_u32() {
        let ev = Event::new(EventKind::RetryScheduled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }
}
