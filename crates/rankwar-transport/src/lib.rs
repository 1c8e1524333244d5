//! Client connections for the rankwar server.
//!
//! [`Transport`] hands out accepted clients; [`Connection`] moves encoded
//! event frames in both directions. The game pushes room updates whenever
//! a timer fires, not only in reply to a request, so a connection must
//! accept a `send` while a `recv` is parked on it.
//!
//! # Feature Flags
//!
//! - `websocket` (default): browser clients via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{DEFAULT_HANDSHAKE_TIMEOUT, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle for an accepted client. Never zero, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id. Meant for tests and for transports that number
    /// their own clients.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next id from the process-wide counter.
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of new clients.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client that completes its handshake.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// One client, carrying one encoded event per frame.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Pushes a frame. Safe to call while a [`recv`](Self::recv) is pending.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Next frame from the client, or `Ok(None)` once it has gone away.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}
