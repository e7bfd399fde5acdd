//! Room configuration.

/// Settings shared by every room on a server.
#[derive(Debug, Clone, Copy)]
pub struct RoomConfig {
    /// Minimum players required to start the game (and each round).
    pub min_players: usize,

    /// Maximum players allowed in a room.
    pub max_players: usize,

    /// Round duration in seconds; scoring tiers are fractions of this.
    pub round_secs: u64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 8,
            round_secs: 60,
        }
    }
}
