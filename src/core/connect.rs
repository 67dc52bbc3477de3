//! # Connection establisher: bounded retries with deterministic backoff.
//!
//! Drives [`Database::connect`] to success or to a final classified
//! [`ConnectError`], publishing one event per attempt along the way.
//!
//! ## Flow
//! ```text
//! for attempt in 0..attempts {
//!   ├─► publish ConnectAttempt { attempt: n+1 }
//!   ├─► db.connect()
//!   │     ├─ Ok  → publish DbConnected, return Ok(())
//!   │     └─ Err → classify, publish ConnectFailed, retain as last
//!   └─► if attempts remain:
//!         publish RetryScheduled { delay }, sleep(delay)
//! }
//! return Err(last)
//! ```
//!
//! ## Rules
//! - Success short-circuits; no further attempts, no further sleeps.
//! - No sleep after the **final** failed attempt.
//! - The error that escapes is always the last classified failure.
//! - Classification never alters the loop: every failure kind is retried
//!   until the budget runs out.

use crate::db::Database;
use crate::error::ConnectError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::BackoffPolicy;

/// Fixed attempt budget for the database connection.
pub(crate) const CONNECT_ATTEMPTS: u32 = 5;

/// Attempts to connect up to `attempts` times, pacing retries with `policy`.
///
/// Returns `Ok(())` on the first successful attempt. Once the budget is
/// exhausted, returns the last classified error; the sentinel
/// [`ConnectError::unknown`] covers the defensive zero-attempt arm.
pub(crate) async fn establish(
    db: &dyn Database,
    policy: &BackoffPolicy,
    attempts: u32,
    bus: &Bus,
) -> Result<(), ConnectError> {
    let mut last: Option<ConnectError> = None;

    for attempt in 0..attempts {
        bus.publish(Event::new(EventKind::ConnectAttempt).with_attempt(attempt + 1));

        match db.connect().await {
            Ok(()) => {
                bus.publish(Event::new(EventKind::DbConnected));
                return Ok(());
            }
            Err(raw) => {
                let classified = ConnectError::classify(&raw, attempt);
                bus.publish(
                    Event::new(EventKind::ConnectFailed)
                        .with_attempt(attempt + 1)
                        .with_reason(classified.message.clone()),
                );
                last = Some(classified);

                if attempt + 1 < attempts {
                    let delay = policy.delay(attempt);
                    bus.publish(
                        Event::new(EventKind::RetryScheduled)
                            .with_attempt(attempt + 1)
                            .with_delay(delay),
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(last.unwrap_or_else(ConnectError::unknown))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbEvent, DbState, DriverError};
    use crate::error::ConnectErrorKind;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::broadcast;

    /// Connector that fails `failures` times, then succeeds.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
        errors: Mutex<Vec<DriverError>>,
        events: broadcast::Sender<DbEvent>,
    }

    impl Flaky {
        fn new(failures: usize, err: DriverError) -> Self {
            let (events, _) = broadcast::channel(8);
            Self {
                failures,
                calls: AtomicUsize::new(0),
                errors: Mutex::new(vec![err]),
                events,
            }
        }

        fn scripted(errors: Vec<DriverError>) -> Self {
            let (events, _) = broadcast::channel(8);
            Self {
                failures: errors.len(),
                calls: AtomicUsize::new(0),
                errors: Mutex::new(errors),
                events,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Database for Flaky {
        async fn connect(&self) -> Result<(), DriverError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                let errors = self.errors.lock().unwrap();
                Err(errors[n.min(errors.len() - 1)].clone())
            } else {
                Ok(())
            }
        }

        fn state(&self) -> DbState {
            DbState::Disconnected
        }

        async fn close(&self) -> Result<(), DriverError> {
            Ok(())
        }

        fn events(&self) -> broadcast::Receiver<DbEvent> {
            self.events.subscribe()
        }
    }

    fn fast_policy() -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(1),
            max: Duration::from_millis(4),
            ..BackoffPolicy::default()
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_with_one_call() {
        let db = Flaky::new(0, DriverError::other("unused"));
        let bus = Bus::new(32);

        establish(&db, &fast_policy(), CONNECT_ATTEMPTS, &bus)
            .await
            .unwrap();
        assert_eq!(db.calls(), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let db = Flaky::new(3, DriverError::network("refused"));
        let bus = Bus::new(32);

        establish(&db, &fast_policy(), CONNECT_ATTEMPTS, &bus)
            .await
            .unwrap();
        assert_eq!(db.calls(), 4, "k failures then success means k+1 calls");
    }

    #[tokio::test]
    async fn exhaustion_returns_the_last_classified_error() {
        let db = Flaky::scripted(vec![
            DriverError::network("refused"),
            DriverError::network("refused"),
            DriverError::network("refused"),
            DriverError::network("refused"),
            DriverError::selection_timeout("no servers"),
        ]);
        let bus = Bus::new(32);

        let err = establish(&db, &fast_policy(), CONNECT_ATTEMPTS, &bus)
            .await
            .unwrap_err();
        assert_eq!(db.calls(), 5, "never more than the attempt budget");
        assert_eq!(err.kind, ConnectErrorKind::Timeout);
        assert_eq!(err.message, "database timeout after 5 attempts: no servers");
    }

    #[tokio::test(start_paused = true)]
    async fn default_schedule_sleeps_between_attempts_but_not_after_the_last() {
        let db = Flaky::new(usize::MAX, DriverError::network("refused"));
        let bus = Bus::new(32);
        let begun = tokio::time::Instant::now();

        let err = establish(&db, &BackoffPolicy::default(), CONNECT_ATTEMPTS, &bus)
            .await
            .unwrap_err();

        // 2000 + 4000 + 8000 + 10000 ms of virtual time: four pauses for
        // five attempts, none after the final failure.
        assert_eq!(begun.elapsed(), Duration::from_millis(24_000));
        assert_eq!(err.kind, ConnectErrorKind::Network);
    }

    #[tokio::test]
    async fn publishes_attempt_and_retry_events() {
        let db = Flaky::new(1, DriverError::network("refused"));
        let bus = Bus::new(32);
        let mut rx = bus.subscribe();

        establish(&db, &fast_policy(), CONNECT_ATTEMPTS, &bus)
            .await
            .unwrap();

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::ConnectAttempt,
                EventKind::ConnectFailed,
                EventKind::RetryScheduled,
                EventKind::ConnectAttempt,
                EventKind::DbConnected,
            ]
        );
    }

    #[tokio::test]
    async fn zero_attempts_returns_the_sentinel() {
        let db = Flaky::new(0, DriverError::other("unused"));
        let bus = Bus::new(32);

        let err = establish(&db, &fast_policy(), 0, &bus).await.unwrap_err();
        assert_eq!(db.calls(), 0);
        assert_eq!(err.message, "unknown error during database connection attempts");
    }
}
