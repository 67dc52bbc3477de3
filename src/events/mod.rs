//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the connection establisher, the
//! collaborator watchers, the teardown sequence and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`], [`Resource`] event classification and payload
//!   metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Lifecycle`, `establish`, the db/listener watchers,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the lifecycle's fan-out listener (feeds `SubscriberSet`),
//!   plus any receiver obtained through [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind, Resource};
