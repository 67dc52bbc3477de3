//! Lifecycle core: startup, supervision, and teardown.
//!
//! This module contains the embedded implementation of the servisor
//! lifecycle. The public API from this module is [`Lifecycle`] (plus its
//! builder and configuration); everything else is internal machinery.
//!
//! Internal modules:
//! - [`connect`]: bounded-retry connection establishment with backoff;
//! - [`deadline`]: race an operation against a timer, cancel the loser;
//! - [`lifecycle`]: the controller wiring startup, watchers, and triggers;
//! - [`signals`]: cross-platform termination signal handling;
//! - [`teardown`]: concurrent, deadline-bounded resource closes.

mod config;
mod connect;
mod deadline;
mod lifecycle;
mod signals;
mod teardown;

pub use config::{Config, ConfigError};
pub use deadline::{DeadlineExceeded, with_deadline};
pub use lifecycle::{BuildError, Lifecycle, LifecycleBuilder};
