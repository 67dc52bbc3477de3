//! # servisor
//!
//! **Servisor** is a lifecycle controller for database-backed network
//! services: supervised startup with bounded connection retries, steady-state
//! watching of collaborator event streams, and an idempotent, deadline-bounded
//! graceful shutdown with a final process exit disposition.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐        ┌──────────────┐
//!     │   Database   │        │   Listener   │
//!     │ (trait impl) │        │ (trait impl) │
//!     └──────┬───────┘        └──────┬───────┘
//!            ▼                       ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Lifecycle (controller)                                           │
//! │  - establish(): ≤ 5 connect attempts, 2s→10s capped backoff       │
//! │  - with_deadline(): listener start vs. start_timeout              │
//! │  - watchers: db/listener event streams → shutdown triggers        │
//! │  - shutdown(): gate → concurrent closes → shutdown_timeout        │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        │ publishes Events (ConnectAttempt, ShutdownRequested, ...)
//!        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │    fan-out listener    │
//!                       │     (in Lifecycle)     │
//!                       └───┬────────────────┬───┘
//!                           ▼                ▼
//!                    [queue] worker    [queue] worker
//!                           ▼                ▼
//!                   LogWriter.on_event  custom.on_event
//! ```
//!
//! ### Lifecycle
//! ```text
//! Lifecycle::run()
//!   ├─► establish database connection (≤ 5 attempts, 2000/4000/8000/10000 ms)
//!   ├─► watch db events: Disconnected → shutdown(UnexpectedDisconnect)
//!   │                    Errored      → shutdown(DatabaseError)
//!   ├─► start listener, raced against start_timeout
//!   ├─► watch listener events: Error → shutdown(ListenerError)
//!   ├─► steady state: SIGTERM/SIGINT, watch_task failures, panic hook
//!   │
//!   └─► shutdown(reason)          (idempotent; first caller wins)
//!         ├─► close listener  ─┐  concurrent, isolated, raced against
//!         ├─► close database  ─┘  shutdown_timeout
//!         └─► ExitStatus::Clean (0) | ExitStatus::Failed (1)
//! ```
//!
//! ## Features
//! | Area               | Description                                                   | Key types / traits                        |
//! |--------------------|---------------------------------------------------------------|-------------------------------------------|
//! | **Lifecycle**      | Startup, supervision, and idempotent graceful shutdown.       | [`Lifecycle`], [`ExitStatus`]             |
//! | **Collaborators**  | Injected database and listener contracts, plus a TCP battery. | [`Database`], [`Listener`], [`TcpAcceptor`] |
//! | **Errors**         | Classified connect failures and teardown errors.              | [`ConnectError`], [`ShutdownError`]       |
//! | **Policies**       | Retry pacing for the connection establisher.                  | [`BackoffPolicy`], [`JitterPolicy`]       |
//! | **Events**         | Bus-published lifecycle events with subscriber fan-out.       | [`Event`], [`Subscribe`], [`SubscriberSet`] |
//! | **Configuration**  | Ports, deadlines, and bus capacity from the environment.      | [`Config`]                                |
//!
//! ## Optional features
//! - `logging` *(default)*: exports the [`logging`] bootstrap module for the
//!   `tracing-subscriber` setup paired with the bundled [`LogWriter`].
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use servisor::{Config, Lifecycle, LogWriter, Subscribe, TcpAcceptor};
//! # use servisor::{Database, DbEvent, DbState, DriverError};
//! # use tokio::sync::broadcast;
//! # struct Driver { events: broadcast::Sender<DbEvent> }
//! # #[async_trait::async_trait]
//! # impl Database for Driver {
//! #     async fn connect(&self) -> Result<(), DriverError> { Ok(()) }
//! #     fn state(&self) -> DbState { DbState::Connected }
//! #     async fn close(&self) -> Result<(), DriverError> { Ok(()) }
//! #     fn events(&self) -> broadcast::Receiver<DbEvent> { self.events.subscribe() }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "logging")]
//!     servisor::logging::init(servisor::logging::LogFormat::Pretty)?;
//!
//!     let cfg = Config::from_env()?;
//!     # let (tx, _) = broadcast::channel(8);
//!     # let db = Arc::new(Driver { events: tx });
//!     let listener = TcpAcceptor::new(cfg.bind_addr(), |_stream, _peer, _ctx| async {});
//!
//!     let lifecycle = Lifecycle::builder(cfg)
//!         .database(db)
//!         .listener(listener)
//!         .subscribers(vec![Arc::new(LogWriter::new()) as Arc<dyn Subscribe>])
//!         .build()?;
//!
//!     lifecycle.install_panic_hook();
//!     let status = lifecycle.run().await;
//!     std::process::exit(status.code());
//! }
//! ```

mod core;
mod db;
mod error;
mod events;
mod net;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use core::{
    BuildError, Config, ConfigError, DeadlineExceeded, Lifecycle, LifecycleBuilder, with_deadline,
};
pub use db::{Database, DbEvent, DbRef, DbState, DriverError, DriverErrorKind};
pub use error::{
    ConnectError, ConnectErrorKind, ExitStatus, ShutdownError, ShutdownReason,
};
pub use events::{Bus, Event, EventKind, Resource};
pub use net::{ListenError, Listener, ListenerRef, NetEvent, TcpAcceptor};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};

// Optional: a tracing-subscriber bootstrap for hosts without their own.
// Enable with: `--features logging` (on by default).
#[cfg(feature = "logging")]
pub mod logging;
