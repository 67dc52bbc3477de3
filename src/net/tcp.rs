//! # TcpAcceptor — bundled TCP accept-loop listener.
//!
//! A production implementation of [`Listener`] for plain TCP services:
//! binds an address, serves each connection through an injected handler,
//! and drains in-flight handlers on close.
//!
//! ## Close sequence
//! ```text
//! close()
//!   ├─► cancel accept-loop token (children see it too)
//!   ├─► accept loop drops the socket (no new connections)
//!   ├─► await in-flight handlers (drain)
//!   └─► NetEvent::Closed
//! ```
//!
//! Handlers receive a child [`CancellationToken`] and should exit promptly
//! once it fires; a handler that ignores it stalls the drain until the
//! teardown deadline cuts it off.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, broadcast};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use super::{ListenError, Listener, NetEvent};

/// Per-connection handler stored by the acceptor.
type ConnHandler =
    Arc<dyn Fn(TcpStream, SocketAddr, CancellationToken) -> BoxFuture<'static, ()> + Send + Sync>;

/// Running accept loop state.
struct Active {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Bundled TCP listener.
///
/// # Example
/// ```no_run
/// use tokio::io::AsyncWriteExt;
/// use servisor::TcpAcceptor;
///
/// let acceptor = TcpAcceptor::new("127.0.0.1:8080".parse().unwrap(), |mut stream, _peer, _ctx| async move {
///     let _ = stream.write_all(b"hello\n").await;
/// });
/// ```
pub struct TcpAcceptor {
    bind: SocketAddr,
    handler: ConnHandler,
    events: broadcast::Sender<NetEvent>,
    listening: AtomicBool,
    active: Mutex<Option<Active>>,
}

impl TcpAcceptor {
    /// Creates an acceptor that serves each connection with `handler`.
    ///
    /// The handler receives the stream, the peer address, and a child
    /// cancellation token that fires when the acceptor closes.
    pub fn new<F, Fut>(bind: SocketAddr, handler: F) -> Arc<Self>
    where
        F: Fn(TcpStream, SocketAddr, CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (events, _) = broadcast::channel(32);
        Arc::new(Self {
            bind,
            handler: Arc::new(move |stream, peer, ctx| Box::pin(handler(stream, peer, ctx))),
            events,
            listening: AtomicBool::new(false),
            active: Mutex::new(None),
        })
    }
}

#[async_trait]
impl Listener for TcpAcceptor {
    async fn start(&self) -> Result<SocketAddr, ListenError> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(ListenError::AlreadyStarted);
        }

        let listener = TcpListener::bind(self.bind).await?;
        let addr = listener.local_addr()?;
        let token = CancellationToken::new();
        let task = tokio::spawn(accept_loop(
            listener,
            token.clone(),
            Arc::clone(&self.handler),
            self.events.clone(),
        ));

        *active = Some(Active { token, task });
        self.listening.store(true, Ordering::SeqCst);
        let _ = self.events.send(NetEvent::Started { addr });
        Ok(addr)
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), ListenError> {
        let active = match self.active.lock().await.take() {
            Some(active) => active,
            None => return Err(ListenError::NotStarted),
        };

        self.listening.store(false, Ordering::SeqCst);
        active.token.cancel();
        active.task.await.map_err(|e| ListenError::CloseFailed {
            reason: e.to_string(),
        })
    }

    fn events(&self) -> broadcast::Receiver<NetEvent> {
        self.events.subscribe()
    }
}

/// Accepts connections until the token fires, then drains in-flight
/// handlers and reports `Closed`.
async fn accept_loop(
    listener: TcpListener,
    token: CancellationToken,
    handler: ConnHandler,
    events: broadcast::Sender<NetEvent>,
) {
    let mut inflight = JoinSet::new();

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            Some(_) = inflight.join_next(), if !inflight.is_empty() => {}
            res = listener.accept() => match res {
                Ok((stream, peer)) => {
                    let ctx = token.child_token();
                    inflight.spawn(handler(stream, peer, ctx));
                }
                Err(err) => {
                    let _ = events.send(NetEvent::Error {
                        message: err.to_string().into(),
                    });
                }
            },
        }
    }

    // Stop accepting before the drain, not after.
    drop(listener);
    while inflight.join_next().await.is_some() {}
    let _ = events.send(NetEvent::Closed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn start_binds_and_reports_addr() {
        let acceptor = TcpAcceptor::new(loopback(), |_s, _p, _ctx| async {});
        assert!(!acceptor.is_listening());

        let addr = acceptor.start().await.unwrap();
        assert_ne!(addr.port(), 0);
        assert!(acceptor.is_listening());

        acceptor.close().await.unwrap();
        assert!(!acceptor.is_listening());
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let acceptor = TcpAcceptor::new(loopback(), |_s, _p, _ctx| async {});
        acceptor.start().await.unwrap();

        let err = acceptor.start().await.unwrap_err();
        assert!(matches!(err, ListenError::AlreadyStarted));

        acceptor.close().await.unwrap();
    }

    #[tokio::test]
    async fn close_before_start_errors() {
        let acceptor = TcpAcceptor::new(loopback(), |_s, _p, _ctx| async {});
        let err = acceptor.close().await.unwrap_err();
        assert!(matches!(err, ListenError::NotStarted));
    }

    #[tokio::test]
    async fn serves_connections_and_drains_on_close() {
        let acceptor = TcpAcceptor::new(loopback(), |mut stream, _peer, _ctx| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = stream.write_all(b"ready\n").await;
        });
        let addr = acceptor.start().await.unwrap();

        let mut client = TcpStream::connect(addr).await.unwrap();
        // Give the accept loop a beat to hand the stream to the handler.
        tokio::time::sleep(Duration::from_millis(10)).await;

        let begun = Instant::now();
        acceptor.close().await.unwrap();
        assert!(
            begun.elapsed() >= Duration::from_millis(30),
            "close should wait for the in-flight handler"
        );

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"ready\n");
    }

    #[tokio::test]
    async fn closed_event_is_emitted_after_drain() {
        let acceptor = TcpAcceptor::new(loopback(), |_s, _p, _ctx| async {});
        let mut events = acceptor.events();
        acceptor.start().await.unwrap();
        acceptor.close().await.unwrap();

        let started = events.recv().await.unwrap();
        assert!(matches!(started, NetEvent::Started { .. }));
        let closed = events.recv().await.unwrap();
        assert!(matches!(closed, NetEvent::Closed));
    }
}
