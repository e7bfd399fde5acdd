//! The line codec: one JSON object per `\n`-terminated frame.
//!
//! The codec is deliberately dumb about transport concerns — it maps a
//! single de-framed line to a message and back. Splitting the byte
//! stream into lines is the transport layer's job.

use serde::Serialize;
use serde_json::Value;

use crate::{ClientMessage, Envelope, ProtocolError, ServerMessage};

/// Encodes messages to newline-terminated JSON lines and decodes lines
/// back into typed messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineCodec;

impl LineCodec {
    /// Encodes a server message as one frame: JSON plus a single `\n`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails, and
    /// [`ProtocolError::InvalidMessage`] if the serialized form would
    /// embed a raw newline (JSON string escaping makes this impossible
    /// for well-formed values; the check guards the framing invariant).
    pub fn encode(&self, msg: &ServerMessage) -> Result<Vec<u8>, ProtocolError> {
        encode_frame(msg)
    }

    /// Encodes a client message the same way. Used by client stubs and
    /// the test harness; the server itself never sends these.
    pub fn encode_client(&self, msg: &ClientMessage) -> Result<Vec<u8>, ProtocolError> {
        encode_frame(msg)
    }

    /// Decodes one de-framed line into the raw `{type, data}` envelope.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] when the bytes are not valid
    /// UTF-8 JSON or `type` is missing or not a string,
    /// [`ProtocolError::InvalidMessage`] when the top-level value is not
    /// an object. A missing `data` becomes an empty map.
    pub fn decode_envelope(&self, line: &[u8]) -> Result<Envelope, ProtocolError> {
        let value: Value = serde_json::from_slice(line).map_err(ProtocolError::Decode)?;
        // serde would happily read `["chat", {...}]` as a struct; only a
        // JSON object is a frame.
        if !value.is_object() {
            return Err(ProtocolError::InvalidMessage(
                "frame top level must be a JSON object".into(),
            ));
        }
        serde_json::from_value(value).map_err(ProtocolError::Decode)
    }

    /// Decodes one de-framed line into a typed [`ClientMessage`].
    ///
    /// # Errors
    /// - [`ProtocolError::UnknownType`] when the envelope is well formed
    ///   but its tag is outside the vocabulary — the caller should answer
    ///   with an `error` message and keep reading.
    /// - [`ProtocolError::Decode`] for malformed frames or payloads.
    pub fn decode_client(&self, line: &[u8]) -> Result<ClientMessage, ProtocolError> {
        let envelope = self.decode_envelope(line)?;
        if !ClientMessage::is_known_type(&envelope.kind) {
            return Err(ProtocolError::UnknownType(envelope.kind));
        }
        let tagged = serde_json::json!({
            "type": envelope.kind,
            "data": Value::Object(envelope.data),
        });
        serde_json::from_value(tagged).map_err(ProtocolError::Decode)
    }

    /// Decodes one de-framed line into a typed [`ServerMessage`].
    /// Client-side counterpart of [`decode_client`](Self::decode_client).
    pub fn decode_server(&self, line: &[u8]) -> Result<ServerMessage, ProtocolError> {
        serde_json::from_slice(line).map_err(ProtocolError::Decode)
    }
}

fn encode_frame<T: Serialize>(msg: &T) -> Result<Vec<u8>, ProtocolError> {
    let mut bytes = serde_json::to_vec(msg).map_err(ProtocolError::Encode)?;
    if bytes.contains(&b'\n') {
        return Err(ProtocolError::InvalidMessage(
            "encoded message contains a raw newline".into(),
        ));
    }
    bytes.push(b'\n');
    Ok(bytes)
}
