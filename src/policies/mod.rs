//! Retry pacing policies.
//!
//! This module groups the knobs that control **how long** the connection
//! establisher waits between failed attempts.
//!
//! ## Contents
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  optional randomization for fleet deployments
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → first=2s, factor=2.0, max=10s, jitter=None:
//!   the deterministic database-connect schedule (2000, 4000, 8000, 10000 ms).
//! - `JitterPolicy::None` by default; the establisher requires it.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
