//! # OS termination signals, mapped to shutdown reasons.
//!
//! **Unix:** `SIGTERM` → [`ShutdownReason::Sigterm`], `SIGINT` (Ctrl-C) →
//! [`ShutdownReason::Sigint`].
//!
//! **Other platforms:** Ctrl-C via [`tokio::signal::ctrl_c`] →
//! [`ShutdownReason::Sigint`].

use crate::error::ShutdownReason;

/// Waits for a termination signal and reports which one arrived.
///
/// Each call creates independent signal listeners. If the listeners cannot
/// be registered the future never resolves; the trigger paths must not
/// raise, and a process without signal delivery still shuts down through
/// the other triggers.
#[cfg(unix)]
pub(crate) async fn wait_for_signal() -> ShutdownReason {
    use tokio::signal::unix::{SignalKind, signal};

    let streams = (|| {
        let sigterm = signal(SignalKind::terminate())?;
        let sigint = signal(SignalKind::interrupt())?;
        std::io::Result::Ok((sigterm, sigint))
    })();

    match streams {
        Ok((mut sigterm, mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => ShutdownReason::Sigterm,
                _ = sigint.recv() => ShutdownReason::Sigint,
            }
        }
        Err(_) => std::future::pending().await,
    }
}

/// Waits for a termination signal and reports which one arrived.
///
/// Each call creates independent signal listeners. If the listener cannot
/// be registered the future never resolves.
#[cfg(not(unix))]
pub(crate) async fn wait_for_signal() -> ShutdownReason {
    match tokio::signal::ctrl_c().await {
        Ok(()) => ShutdownReason::Sigint,
        Err(_) => std::future::pending().await,
    }
}
