//! Scriptable fakes shared by the lifecycle scenario tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use servisor::{Database, DbEvent, DbState, DriverError, ListenError, Listener, NetEvent};

/// What a fake close call does.
#[derive(Clone, Copy)]
pub enum CloseOutcome {
    Ok,
    Fail(&'static str),
    Hang,
}

/// Scriptable [`Database`] fake.
///
/// Connect attempts consume the failure script front to back; once the
/// script is empty, connects succeed. A clean close emits the
/// `Disconnected` echo the way real drivers do.
pub struct FakeDb {
    connect_script: Mutex<VecDeque<DriverError>>,
    state: Mutex<DbState>,
    connect_calls: AtomicUsize,
    close_calls: AtomicUsize,
    close_outcome: Mutex<CloseOutcome>,
    events: broadcast::Sender<DbEvent>,
}

impl FakeDb {
    /// A disconnected fake whose connects succeed and closes are clean.
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(32);
        Arc::new(Self {
            connect_script: Mutex::new(VecDeque::new()),
            state: Mutex::new(DbState::Disconnected),
            connect_calls: AtomicUsize::new(0),
            close_calls: AtomicUsize::new(0),
            close_outcome: Mutex::new(CloseOutcome::Ok),
            events,
        })
    }

    /// A fake that already reports `Connected`.
    pub fn connected() -> Arc<Self> {
        let db = Self::new();
        db.set_state(DbState::Connected);
        db
    }

    pub fn set_state(&self, state: DbState) {
        *self.state.lock().unwrap() = state;
    }

    /// Queues connect failures; attempts beyond the script succeed.
    pub fn fail_connects(&self, errors: Vec<DriverError>) {
        *self.connect_script.lock().unwrap() = errors.into();
    }

    pub fn set_close_outcome(&self, outcome: CloseOutcome) {
        *self.close_outcome.lock().unwrap() = outcome;
    }

    /// Injects an event on the handle's stream.
    pub fn emit(&self, ev: DbEvent) {
        let _ = self.events.send(ev);
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Database for FakeDb {
    async fn connect(&self) -> Result<(), DriverError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.connect_script.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.set_state(DbState::Connected);
        Ok(())
    }

    fn state(&self) -> DbState {
        *self.state.lock().unwrap()
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = *self.close_outcome.lock().unwrap();
        match outcome {
            CloseOutcome::Ok => {
                self.set_state(DbState::Disconnected);
                // Real drivers echo the intentional close on the stream.
                self.emit(DbEvent::Disconnected);
                Ok(())
            }
            CloseOutcome::Fail(msg) => Err(DriverError::other(msg)),
            CloseOutcome::Hang => std::future::pending().await,
        }
    }

    fn events(&self) -> broadcast::Receiver<DbEvent> {
        self.events.subscribe()
    }
}

/// Scriptable [`Listener`] fake.
pub struct FakeListener {
    start_delay: Mutex<Duration>,
    listening: AtomicBool,
    close_calls: AtomicUsize,
    close_outcome: Mutex<CloseOutcome>,
    events: broadcast::Sender<NetEvent>,
}

impl FakeListener {
    /// A stopped fake that starts instantly and closes cleanly.
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(32);
        Arc::new(Self {
            start_delay: Mutex::new(Duration::ZERO),
            listening: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
            close_outcome: Mutex::new(CloseOutcome::Ok),
            events,
        })
    }

    /// A fake that already reports listening.
    pub fn listening() -> Arc<Self> {
        let listener = Self::new();
        listener.listening.store(true, Ordering::SeqCst);
        listener
    }

    /// Makes `start` bind only after `delay`.
    pub fn set_start_delay(&self, delay: Duration) {
        *self.start_delay.lock().unwrap() = delay;
    }

    pub fn set_close_outcome(&self, outcome: CloseOutcome) {
        *self.close_outcome.lock().unwrap() = outcome;
    }

    /// Injects an event on the listener's stream.
    pub fn emit(&self, ev: NetEvent) {
        let _ = self.events.send(ev);
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Listener for FakeListener {
    async fn start(&self) -> Result<SocketAddr, ListenError> {
        let delay = *self.start_delay.lock().unwrap();
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }
        self.listening.store(true, Ordering::SeqCst);
        Ok(SocketAddr::from(([127, 0, 0, 1], 8080)))
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), ListenError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = *self.close_outcome.lock().unwrap();
        match outcome {
            CloseOutcome::Ok => {
                self.listening.store(false, Ordering::SeqCst);
                self.emit(NetEvent::Closed);
                Ok(())
            }
            CloseOutcome::Fail(msg) => Err(ListenError::CloseFailed {
                reason: msg.to_string(),
            }),
            CloseOutcome::Hang => std::future::pending().await,
        }
    }

    fn events(&self) -> broadcast::Receiver<NetEvent> {
        self.events.subscribe()
    }
}
