//! Error types for the session layer.

/// Errors that can occur during session registry operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session is registered for the given player.
    #[error("no session for player {0}")]
    PlayerNotFound(scrawl_protocol::PlayerId),
}
