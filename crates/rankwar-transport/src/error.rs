use std::io;

/// Errors raised while listening for or talking to clients.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listening socket could not be opened.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The TCP accept itself failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] io::Error),

    /// The client never completed a valid WebSocket upgrade.
    #[error("handshake with {peer} failed: {reason}")]
    Handshake {
        peer: std::net::SocketAddr,
        reason: String,
    },

    /// The peer closed the connection, or it was already closed locally.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] io::Error),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] io::Error),
}

impl TransportError {
    /// Whether the failure concerns a single client rather than the
    /// listener. The accept loop keeps going after these.
    pub fn is_per_client(&self) -> bool {
        !matches!(self, Self::Bind { .. })
    }
}
