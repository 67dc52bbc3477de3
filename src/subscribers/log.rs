//! # LogWriter — tracing-backed event renderer
//!
//! A subscriber that translates lifecycle [`Event`]s into `tracing` records
//! with structured fields. Progress is logged at `info`, degradations at
//! `warn`, failures at `error`.
//!
//! ## Example output (pretty format)
//! ```text
//! INFO  database connection attempt attempt=1
//! ERROR database connection attempt failed attempt=1 reason="connection refused"
//! INFO  retrying connection delay_ms=2000
//! INFO  database connected
//! INFO  listener started addr=127.0.0.1:8080
//! INFO  service started
//! INFO  shutdown requested reason="SIGTERM" label="sigterm"
//! INFO  resource closed resource="listener"
//! INFO  graceful shutdown completed
//! INFO  process exiting code=0
//! ```

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Structured logging subscriber.
///
/// Renders every lifecycle event as a `tracing` record; pair it with
/// [`logging::init`](crate::logging::init) or the host's own subscriber
/// setup.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref();
        match e.kind {
            EventKind::SubscriberPanicked => {
                error!(subscriber = e.subscriber.as_deref(), reason, "subscriber panicked");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = e.subscriber.as_deref(), reason, "subscriber dropped event");
            }
            EventKind::ConnectAttempt => {
                info!(attempt = e.attempt, "database connection attempt");
            }
            EventKind::ConnectFailed => {
                error!(attempt = e.attempt, reason, "database connection attempt failed");
            }
            EventKind::RetryScheduled => {
                info!(delay_ms = e.delay_ms, "retrying connection");
            }
            EventKind::DbConnected => {
                info!("database connected");
            }
            EventKind::DbDisconnected => {
                warn!("database disconnected");
            }
            EventKind::DbErrored => {
                error!(reason, "database error");
            }
            EventKind::ListenerStarted => match e.addr {
                Some(addr) => info!(addr = %addr, "listener started"),
                None => info!("listener started"),
            },
            EventKind::ListenerErrored => {
                error!(reason, "listener error");
            }
            EventKind::BootCompleted => {
                info!("service started");
            }
            EventKind::TaskFailed => {
                error!(task = e.task.as_deref(), reason, "background task failed");
            }
            EventKind::PanicCaught => {
                error!(reason, "uncaught panic, shutting down");
            }
            EventKind::ShutdownRequested => match e.trigger {
                Some(t) => info!(reason = %t, label = t.as_label(), "shutdown requested"),
                None => info!("shutdown requested"),
            },
            EventKind::ShutdownIgnored => match e.trigger {
                Some(t) => warn!(reason = %t, "shutdown already in progress, ignoring"),
                None => warn!("shutdown already in progress, ignoring"),
            },
            EventKind::CloseSucceeded => {
                info!(resource = e.resource.map(|r| r.as_label()), "resource closed");
            }
            EventKind::CloseFailed => {
                error!(resource = e.resource.map(|r| r.as_label()), reason, "close failed");
            }
            EventKind::NothingToClose => {
                info!("no active connections to close");
            }
            EventKind::ShutdownComplete => {
                info!("graceful shutdown completed");
            }
            EventKind::ShutdownFailed => {
                error!(reason, "shutdown failed");
            }
            EventKind::Exiting => match e.code {
                Some(0) => info!(code = 0, "process exiting"),
                code => error!(code, "process exiting with errors"),
            },
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
