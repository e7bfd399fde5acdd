//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into a JSON line).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: the bytes are not valid UTF-8 JSON or a
    /// field has the wrong shape.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame parsed as JSON but is not a valid `{type, data}` envelope
    /// (e.g. the top level is not an object, or `type` is not a string).
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The envelope's `type` tag is not part of the protocol vocabulary.
    ///
    /// The router answers these with an `error` message naming the tag;
    /// the connection stays open.
    #[error("unknown message type: {0}")]
    UnknownType(String),
}
