//! Network listener collaborator contract and the bundled TCP battery.
//!
//! The lifecycle controller drives an injected [`Listener`] through
//! start/close and observes its [`NetEvent`] stream. Hosts with their own
//! HTTP stack implement [`Listener`] over it; simple TCP services can use
//! the bundled [`TcpAcceptor`].

mod error;
mod event;
mod listener;
mod tcp;

pub use error::ListenError;
pub use event::NetEvent;
pub use listener::{Listener, ListenerRef};
pub use tcp::TcpAcceptor;
