//! Unified error type for the Scrawl server.

use scrawl_protocol::ProtocolError;
use scrawl_room::RoomError;
use scrawl_session::SessionError;
use scrawl_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Callers of the `scrawl` meta-crate deal with this single type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant lets `?` convert sub-crate errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum ScrawlError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown type).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (unknown connection or player).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (full, not found, invalid state).
    #[error(transparent)]
    Room(#[from] RoomError),
}
