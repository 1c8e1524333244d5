//! Codec trait and the JSON implementation.
//!
//! The server never touches serde directly: the gateway encodes
//! [`ServerEvent`](crate::ServerEvent)s and decodes
//! [`ClientEvent`](crate::ClientEvent)s through a [`Codec`], so a binary
//! format can be swapped in without changing the handler.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts wire types to bytes and back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do
    /// not match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`. Encoded frames are always valid
/// UTF-8, so the transport ships them as WebSocket text frames.
///
/// ```rust
/// use rankwar_protocol::{Codec, JsonCodec, ServerEvent};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&ServerEvent::TurnTimeout).unwrap();
/// assert_eq!(bytes, br#"{"event":"turn_timeout"}"#);
///
/// let decoded: ServerEvent = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, ServerEvent::TurnTimeout);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientEvent, RoomRef};

    #[test]
    fn test_decode_rejects_unknown_event() {
        let err = JsonCodec
            .decode::<ClientEvent>(br#"{"event":"shuffle_deck","data":{}}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let err = JsonCodec
            .decode::<ClientEvent>(br#"{"event":"join_room","data":{"roomName":"A"}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("playerName"));
    }

    #[test]
    fn test_decode_play_card() {
        let event: ClientEvent = JsonCodec
            .decode(br#"{"event":"play_card","data":{"roomName":"A"}}"#)
            .unwrap();
        assert_eq!(
            event,
            ClientEvent::PlayCard(RoomRef { room_name: "A".into() })
        );
    }
}
