//! # Event subscribers for the lifecycle runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out, and the bundled [`LogWriter`] that renders lifecycle events as
//! `tracing` records.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Lifecycle ── publish(Event) ──► Bus ──► fan-out listener
//!                                               │
//!                                               ├──► [queue] ─► LogWriter
//!                                               ├──► [queue] ─► Metrics
//!                                               └──► [queue] ─► Custom...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use servisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct ConnectFailures;
//!
//! #[async_trait]
//! impl Subscribe for ConnectFailures {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::ConnectFailed {
//!             // increment a failure counter
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "connect_failures" }
//! }
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
