//! The per-connection session record.

use scrawl_protocol::{PlayerId, RoomId, ServerMessage};
use scrawl_transport::ConnectionId;
use tokio::sync::mpsc;

/// Channel sender that delivers outbound messages to a session's writer
/// task. Pushes never block, so broadcasts never wait on a slow socket.
pub type Outbound = mpsc::UnboundedSender<ServerMessage>;

/// Server-side state bound to one live TCP connection.
///
/// Created when a `connect` message is accepted, destroyed when the
/// socket closes or errors. A session never migrates between
/// connections; reconnection means a brand-new session.
#[derive(Debug)]
pub struct Session {
    /// The connection this session is bound to.
    pub conn_id: ConnectionId,

    /// Server-assigned player identity.
    pub player_id: PlayerId,

    /// Display name from the `connect` message (updatable on join).
    pub name: String,

    /// The room the player has joined, if any.
    pub room: Option<RoomId>,

    outbound: Outbound,
}

impl Session {
    /// Creates a session bound to `conn_id` with a fresh identity.
    pub fn new(
        conn_id: ConnectionId,
        player_id: PlayerId,
        name: String,
        outbound: Outbound,
    ) -> Self {
        Self {
            conn_id,
            player_id,
            name,
            room: None,
            outbound,
        }
    }

    /// Queues a message for this session's socket.
    ///
    /// Returns `false` if the writer task is gone (the connection is
    /// already dying); the caller never retries — that session's own
    /// read loop performs cleanup.
    pub fn send(&self, msg: ServerMessage) -> bool {
        self.outbound.send(msg).is_ok()
    }

    /// Returns `true` if the session is in `room`.
    pub fn is_in(&self, room: &RoomId) -> bool {
        self.room.as_ref() == Some(room)
    }
}
