//! # Lifecycle: supervised startup, steady-state watch, idempotent shutdown.
//!
//! The [`Lifecycle`] owns the event bus, a [`SubscriberSet`], the injected
//! collaborators (database handle and network listener), and the two pieces
//! of process-wide lifecycle state: the `shutting_down` gate and the exit
//! disposition channel.
//!
//! ## High-level architecture
//! ```text
//! Lifecycle::run():
//!   ├─► fan-out listener: Bus.subscribe() ─► SubscriberSet::emit(&Event)
//!   ├─► signal watcher installed (before startup, so a signal during
//!   │   connect retries is honored)
//!   │
//!   ├─► startup:
//!   │     ├─ establish(db, backoff, 5 attempts)    (may retry ≤ 5 times)
//!   │     ├─ watch_db(): db.events() ─► Disconnected/Errored → shutdown(...)
//!   │     ├─ with_deadline(start_timeout, listener.start())
//!   │     └─ watch_listener(): listener.events() ─► Error → shutdown(...)
//!   │
//!   ├─► steady state: wait on {signal, exit disposition}
//!   └─► return ExitStatus (host maps it to the process exit code)
//!
//! Shutdown path (any trigger):
//!   shutdown(reason)
//!     ├─ gate already set → publish ShutdownIgnored, return None
//!     ├─ publish ShutdownRequested
//!     ├─ teardown::run(...)  (concurrent closes, deadline)
//!     └─ record ExitStatus on the exit channel, return Some(status)
//! ```
//!
//! ## Triggers
//! | trigger                         | reason                 |
//! |---------------------------------|------------------------|
//! | SIGTERM / SIGINT                | `Sigterm` / `Sigint`   |
//! | supervised task failed/panicked | `TaskFailure`          |
//! | uncaught panic (hook installed) | `Panic`                |
//! | listener runtime error          | `ListenerError`        |
//! | database runtime error          | `DatabaseError`        |
//! | database dropped unexpectedly   | `UnexpectedDisconnect` |
//! | startup sequence failed         | `StartupFailure`       |
//!
//! Trigger handlers never raise; they publish and delegate to `shutdown`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::config::Config;
use crate::core::connect::{self, CONNECT_ATTEMPTS};
use crate::core::deadline::with_deadline;
use crate::core::{signals, teardown};
use crate::db::{DbEvent, DbRef};
use crate::error::{ConnectError, ExitStatus, ShutdownReason};
use crate::events::{Bus, Event, EventKind};
use crate::net::{ListenError, ListenerRef, NetEvent};
use crate::policies::BackoffPolicy;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Pause before `run` returns, so subscriber queues drain the final events
/// before the host exits the process.
const FLUSH_GRACE: Duration = Duration::from_millis(50);

/// Diagnostic hint logged alongside a classified connection failure.
const CONNECTIVITY_HINT: &str = "database connectivity issue - check configuration and network";

/// A missing collaborator at build time.
#[derive(Error, Debug)]
pub enum BuildError {
    /// No database handle was provided.
    #[error("lifecycle requires a database handle")]
    MissingDatabase,
    /// No listener was provided.
    #[error("lifecycle requires a listener")]
    MissingListener,
}

/// Failure inside the startup sequence.
#[derive(Error, Debug)]
enum StartError {
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error(transparent)]
    Listen(#[from] ListenError),
    #[error("server start timeout after {}ms", limit.as_millis())]
    StartTimeout { limit: Duration },
}

/// Builder for a [`Lifecycle`].
pub struct LifecycleBuilder {
    cfg: Config,
    db: Option<DbRef>,
    listener: Option<ListenerRef>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl LifecycleBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            db: None,
            listener: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets the database collaborator.
    pub fn database(mut self, db: DbRef) -> Self {
        self.db = Some(db);
        self
    }

    /// Sets the listener collaborator.
    pub fn listener(mut self, listener: ListenerRef) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with
    /// bounded queues; see [`SubscriberSet`].
    pub fn subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the lifecycle.
    ///
    /// Wires the event bus, spawns the subscriber workers, and prepares the
    /// root cancellation token. Fails if a collaborator is missing.
    pub fn build(self) -> Result<Lifecycle, BuildError> {
        let db = self.db.ok_or(BuildError::MissingDatabase)?;
        let listener = self.listener.ok_or(BuildError::MissingListener)?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let (exit_tx, _) = watch::channel(None);

        Ok(Lifecycle {
            shared: Arc::new(Shared {
                cfg: self.cfg,
                db,
                listener,
                bus,
                subs,
                cancel: CancellationToken::new(),
                shutting_down: AtomicBool::new(false),
                exit_tx,
            }),
        })
    }
}

/// State shared between the run loop, the watcher tasks, and trigger sites.
struct Shared {
    cfg: Config,
    db: DbRef,
    listener: ListenerRef,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    /// Root cancellation token; cancelled when a deadline forces teardown off.
    cancel: CancellationToken,
    /// The idempotency gate: set once by the first shutdown attempt, never
    /// reset.
    shutting_down: AtomicBool,
    /// Exit channel; the shutdown winner records the disposition exactly once.
    exit_tx: watch::Sender<Option<ExitStatus>>,
}

/// # The lifecycle controller.
///
/// Owns startup and shutdown sequencing for the whole process. Construct
/// one with [`Lifecycle::builder`], drive it with [`Lifecycle::run`], and
/// map the returned [`ExitStatus`] onto the process exit code.
///
/// Cloning is cheap (a handle onto shared state); every clone drives the
/// same lifecycle.
///
/// ## Example
/// ```no_run
/// use std::sync::Arc;
/// use servisor::{Config, Lifecycle, LogWriter, Subscribe, TcpAcceptor};
/// # use servisor::{Database, DbEvent, DbState, DriverError};
/// # use tokio::sync::broadcast;
/// # struct Mongo { events: broadcast::Sender<DbEvent> }
/// # #[async_trait::async_trait]
/// # impl Database for Mongo {
/// #     async fn connect(&self) -> Result<(), DriverError> { Ok(()) }
/// #     fn state(&self) -> DbState { DbState::Connected }
/// #     async fn close(&self) -> Result<(), DriverError> { Ok(()) }
/// #     fn events(&self) -> broadcast::Receiver<DbEvent> { self.events.subscribe() }
/// # }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let cfg = Config::from_env()?;
///     # let (tx, _) = broadcast::channel(8);
///     # let db = Arc::new(Mongo { events: tx });
///     let listener = TcpAcceptor::new(cfg.bind_addr(), |_stream, _peer, _ctx| async {});
///
///     let lifecycle = Lifecycle::builder(cfg)
///         .database(db)
///         .listener(listener)
///         .subscribers(vec![Arc::new(LogWriter::new()) as Arc<dyn Subscribe>])
///         .build()?;
///
///     lifecycle.install_panic_hook();
///     let status = lifecycle.run().await;
///     std::process::exit(status.code());
/// }
/// ```
#[derive(Clone)]
pub struct Lifecycle {
    shared: Arc<Shared>,
}

impl Lifecycle {
    /// Starts building a lifecycle with the given configuration.
    pub fn builder(cfg: Config) -> LifecycleBuilder {
        LifecycleBuilder::new(cfg)
    }

    /// True once a shutdown attempt has won the gate.
    pub fn is_shutting_down(&self) -> bool {
        self.shared.shutting_down.load(Ordering::SeqCst)
    }

    /// Observes the lifecycle's event stream.
    ///
    /// The receiver only sees events published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Runs the whole supervised lifetime of the service.
    ///
    /// Establishes the database connection, starts the listener under the
    /// start deadline, then supervises until a trigger drives the teardown.
    /// Never returns early: the result is the final disposition after
    /// shutdown has settled.
    pub async fn run(&self) -> ExitStatus {
        let shared = &self.shared;
        shared.spawn_fanout_listener();
        let mut exit_rx = shared.exit_tx.subscribe();

        // Installed before startup so a signal during connect retries wins
        // the race against the (dropped) startup future.
        let signal_fut = signals::wait_for_signal();
        tokio::pin!(signal_fut);

        let mut startup_failed = false;
        tokio::select! {
            reason = signal_fut.as_mut() => {
                let _ = shared.shutdown(reason).await;
            }
            res = start(shared) => match res {
                Ok(()) => {
                    shared.bus.publish(Event::new(EventKind::BootCompleted));
                    tokio::select! {
                        reason = signal_fut.as_mut() => {
                            let _ = shared.shutdown(reason).await;
                        }
                        _ = wait_for_exit(&mut exit_rx) => {}
                    }
                }
                Err(err) => {
                    startup_failed = true;
                    shared.report_start_failure(&err);
                    let _ = shared.shutdown(ShutdownReason::StartupFailure).await;
                }
            }
        }

        let status = wait_for_exit(&mut exit_rx).await;
        // A failed startup is a failed run even when the teardown itself
        // settles cleanly.
        let status = if startup_failed {
            ExitStatus::Failed
        } else {
            status
        };

        shared
            .bus
            .publish(Event::new(EventKind::Exiting).with_code(status.code()));
        tokio::time::sleep(FLUSH_GRACE).await;
        status
    }

    /// Requests a shutdown for `reason`.
    ///
    /// Idempotent: exactly one concurrent caller wins the gate, performs the
    /// teardown, records the disposition, and gets `Some(status)`; every
    /// other caller gets `None` without touching any resource. Never raises.
    pub async fn shutdown(&self, reason: ShutdownReason) -> Option<ExitStatus> {
        self.shared.shutdown(reason).await
    }

    /// Supervises a background task; its failure is a shutdown trigger.
    ///
    /// A task that returns an error or panics publishes `TaskFailed` and
    /// triggers `shutdown(TaskFailure)`. A task that completes cleanly or is
    /// cancelled triggers nothing.
    pub fn watch_task<E>(&self, name: impl Into<Arc<str>>, handle: JoinHandle<Result<(), E>>)
    where
        E: std::fmt::Display + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let name = name.into();
        tokio::spawn(async move {
            let failure = match handle.await {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err.to_string()),
                Err(join) if join.is_cancelled() => None,
                Err(join) if join.is_panic() => Some("task panicked".to_string()),
                Err(join) => Some(join.to_string()),
            };
            if let Some(reason) = failure {
                shared.bus.publish(
                    Event::new(EventKind::TaskFailed)
                        .with_task(Arc::clone(&name))
                        .with_reason(reason),
                );
                if !shared.is_shutting_down() {
                    let _ = shared.shutdown(ShutdownReason::TaskFailure).await;
                }
            }
        });
    }

    /// Installs a process panic hook that triggers `shutdown(Panic)`.
    ///
    /// The previous hook still runs first, so default panic reporting is
    /// preserved. The hook itself never raises; off-runtime panics are
    /// reported but cannot schedule the teardown.
    pub fn install_panic_hook(&self) {
        let weak = Arc::downgrade(&self.shared);
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            previous(info);
            let Some(shared) = weak.upgrade() else { return };

            shared
                .bus
                .publish(Event::new(EventKind::PanicCaught).with_reason(info.to_string()));
            if !shared.is_shutting_down() {
                if let Ok(rt) = tokio::runtime::Handle::try_current() {
                    rt.spawn(async move {
                        let _ = shared.shutdown(ShutdownReason::Panic).await;
                    });
                }
            }
        }));
    }
}

impl Shared {
    fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// The shutdown orchestrator entry: gate, teardown, record.
    async fn shutdown(&self, reason: ShutdownReason) -> Option<ExitStatus> {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            self.bus
                .publish(Event::new(EventKind::ShutdownIgnored).with_trigger(reason));
            return None;
        }
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_trigger(reason));

        let status = teardown::run(
            reason,
            self.db.as_ref(),
            self.listener.as_ref(),
            self.cfg.shutdown_timeout,
            &self.cancel,
            &self.bus,
        )
        .await;

        self.exit_tx.send_replace(Some(status));
        Some(status)
    }

    /// Publishes the startup failure, with the connectivity hint where the
    /// error is a classified connection failure.
    fn report_start_failure(&self, err: &StartError) {
        match err {
            // Per-attempt ConnectFailed events were already published by the
            // establisher; add the diagnostic hint.
            StartError::Connect(_) => {
                self.bus
                    .publish(Event::new(EventKind::DbErrored).with_reason(CONNECTIVITY_HINT));
            }
            StartError::Listen(e) => {
                self.bus
                    .publish(Event::new(EventKind::ListenerErrored).with_reason(e.to_string()));
            }
            StartError::StartTimeout { .. } => {
                self.bus
                    .publish(Event::new(EventKind::ListenerErrored).with_reason(err.to_string()));
            }
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set
    /// (fire-and-forget).
    fn spawn_fanout_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}

/// The startup sequence: connect, watch, start the listener on deadline.
async fn start(shared: &Arc<Shared>) -> Result<(), StartError> {
    connect::establish(
        shared.db.as_ref(),
        &BackoffPolicy::default(),
        CONNECT_ATTEMPTS,
        &shared.bus,
    )
    .await?;
    watch_db(shared);

    let start_token = shared.cancel.child_token();
    let addr =
        match with_deadline(shared.cfg.start_timeout, &start_token, shared.listener.start()).await {
            Ok(bound) => bound?,
            Err(deadline) => {
                return Err(StartError::StartTimeout {
                    limit: deadline.limit,
                });
            }
        };
    shared
        .bus
        .publish(Event::new(EventKind::ListenerStarted).with_addr(addr));
    watch_listener(shared);
    Ok(())
}

/// Watches the database event stream during steady state.
///
/// `Disconnected` during an intentional close is the expected echo of
/// the close and is dropped at the gate; any other arrival is an
/// unexpected disconnection and triggers the teardown.
fn watch_db(shared: &Arc<Shared>) {
    let mut rx = shared.db.events();
    let this = Arc::clone(shared);
    tokio::spawn(async move {
        loop {
            let ev = tokio::select! {
                _ = this.cancel.cancelled() => break,
                ev = rx.recv() => ev,
            };
            match ev {
                Ok(DbEvent::Connected) => {
                    this.bus.publish(Event::new(EventKind::DbConnected));
                }
                Ok(DbEvent::Disconnected) => {
                    if !this.is_shutting_down() {
                        this.bus.publish(Event::new(EventKind::DbDisconnected));
                        let _ = this.shutdown(ShutdownReason::UnexpectedDisconnect).await;
                    }
                }
                Ok(DbEvent::Errored { message }) => {
                    this.bus
                        .publish(Event::new(EventKind::DbErrored).with_reason(message));
                    if !this.is_shutting_down() {
                        let _ = this.shutdown(ShutdownReason::DatabaseError).await;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Watches the listener event stream during steady state.
fn watch_listener(shared: &Arc<Shared>) {
    let mut rx = shared.listener.events();
    let this = Arc::clone(shared);
    tokio::spawn(async move {
        loop {
            let ev = tokio::select! {
                _ = this.cancel.cancelled() => break,
                ev = rx.recv() => ev,
            };
            match ev {
                Ok(NetEvent::Error { message }) => {
                    this.bus
                        .publish(Event::new(EventKind::ListenerErrored).with_reason(message));
                    if !this.is_shutting_down() {
                        let _ = this.shutdown(ShutdownReason::ListenerError).await;
                    }
                }
                // Started was reported by start(); Closed is the expected
                // echo of the teardown.
                Ok(NetEvent::Started { .. }) | Ok(NetEvent::Closed) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Waits for the first recorded exit disposition.
async fn wait_for_exit(rx: &mut watch::Receiver<Option<ExitStatus>>) -> ExitStatus {
    loop {
        if let Some(status) = *rx.borrow_and_update() {
            return status;
        }
        if rx.changed().await.is_err() {
            return ExitStatus::Failed;
        }
    }
}
