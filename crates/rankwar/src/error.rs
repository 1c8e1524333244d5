//! Unified error type for the rankwar server.

use rankwar_protocol::ProtocolError;
use rankwar_room::RoomError;
use rankwar_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RankwarError {
    /// Binding, a client handshake, or frame I/O failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded, or carried an invalid event.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A refused room operation.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The game actor is no longer running.
    #[error("game actor has stopped")]
    ActorStopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let rankwar_err: RankwarError = err.into();
        assert!(matches!(rankwar_err, RankwarError::Transport(_)));
        assert!(rankwar_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidEvent("bad".into());
        let rankwar_err: RankwarError = err.into();
        assert!(matches!(rankwar_err, RankwarError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error_keeps_client_text() {
        let err = RoomError::RoomNotFound("A".into());
        let rankwar_err: RankwarError = err.into();
        assert!(matches!(rankwar_err, RankwarError::Room(_)));
        assert_eq!(rankwar_err.to_string(), "Room not found");
    }
}
