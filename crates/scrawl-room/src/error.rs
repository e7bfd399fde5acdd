//! Error types for the room layer.

use scrawl_protocol::{PlayerId, RoomId};

/// Errors that can occur during room operations.
///
/// These are domain-rule violations: the router reports them back to the
/// requester as `ok: false` results and never closes the connection over
/// them.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room is full — no more player slots available.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player is already in a room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player is not in any room.
    #[error("player {0} not in a room")]
    NotInRoom(PlayerId),

    /// The game has already been started.
    #[error("game already started in room {0}")]
    AlreadyStarted(RoomId),

    /// The game has not been started yet.
    #[error("game not started in room {0}")]
    NotStarted(RoomId),

    /// Too few players for the requested transition.
    #[error("need {need} players, have {have}")]
    NotEnoughPlayers { have: usize, need: usize },
}
