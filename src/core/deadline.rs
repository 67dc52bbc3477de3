//! # Deadline race: run an operation against a timer.
//!
//! [`with_deadline`] is the single primitive behind both time bounds the
//! lifecycle enforces: the listener start deadline and the teardown deadline.
//! It carries no domain knowledge; whichever side settles first is
//! authoritative.
//!
//! ```text
//! with_deadline(limit, cancel, op)
//!   ├─ op settles first      → Ok(op output), timer dropped
//!   └─ timer fires first     → cancel.cancel(), op dropped
//!                              → Err(DeadlineExceeded { limit })
//! ```
//!
//! The loser is not merely abandoned: on a deadline the provided
//! [`CancellationToken`] is cancelled, so work the operation spawned beyond
//! its own future is told to stop.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The timer won the race.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("deadline of {}ms exceeded", limit.as_millis())]
pub struct DeadlineExceeded {
    /// The limit that was exceeded.
    pub limit: Duration,
}

/// Runs `op` against a timer of `limit`.
///
/// If `op` settles first its output is returned untouched; the helper never
/// inspects it. If the timer fires first, `cancel` is cancelled, the
/// operation future is dropped, and [`DeadlineExceeded`] is returned.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use servisor::with_deadline;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cancel = CancellationToken::new();
/// let out = with_deadline(Duration::from_secs(1), &cancel, async { 7 }).await;
/// assert_eq!(out, Ok(7));
/// # }
/// ```
pub async fn with_deadline<F>(
    limit: Duration,
    cancel: &CancellationToken,
    op: F,
) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    match tokio::time::timeout(limit, op).await {
        Ok(out) => Ok(out),
        Err(_elapsed) => {
            cancel.cancel();
            Err(DeadlineExceeded { limit })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn operation_wins_and_token_stays_live() {
        let cancel = CancellationToken::new();
        let out = with_deadline(Duration::from_millis(200), &cancel, async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            "done"
        })
        .await;

        assert_eq!(out, Ok("done"));
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn timer_wins_and_cancels_the_token() {
        let cancel = CancellationToken::new();
        let out = with_deadline(Duration::from_millis(20), &cancel, async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            "never"
        })
        .await;

        assert_eq!(
            out,
            Err(DeadlineExceeded {
                limit: Duration::from_millis(20)
            })
        );
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn result_of_the_operation_passes_through() {
        let cancel = CancellationToken::new();
        let out: Result<Result<(), &str>, DeadlineExceeded> =
            with_deadline(Duration::from_millis(200), &cancel, async { Err("inner") }).await;

        assert_eq!(out, Ok(Err("inner")));
    }
}
