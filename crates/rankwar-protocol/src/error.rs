//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding or validating events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown event name,
    /// or a payload with missing or mistyped fields.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The event decoded but carries an unusable value, such as a blank
    /// room name.
    #[error("invalid event: {0}")]
    InvalidEvent(String),
}
