//! Registry of live rooms and which room each player is in.

use std::collections::HashMap;
use std::sync::Arc;

use scrawl_protocol::{PlayerId, RoomId};

use crate::{Player, Room, RoomConfig, RoomError, WordList};

/// All rooms on the server, keyed by id, plus a reverse player index.
///
/// Rooms are created on first join and dropped when their last member
/// leaves; the directory never holds an empty room.
#[derive(Debug)]
pub struct RoomDirectory {
    config: RoomConfig,
    words: Arc<WordList>,
    rooms: HashMap<RoomId, Room>,
    player_rooms: HashMap<PlayerId, RoomId>,
}

impl RoomDirectory {
    pub fn new(config: RoomConfig, words: Arc<WordList>) -> Self {
        Self {
            config,
            words,
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Puts `player` into `room`, creating the room if needed.
    ///
    /// A player can be in at most one room; joining while already in a
    /// room (even the same one) fails rather than implicitly moving.
    pub fn join(
        &mut self,
        player: PlayerId,
        name: &str,
        room_id: &RoomId,
    ) -> Result<&Room, RoomError> {
        if let Some(current) = self.player_rooms.get(&player) {
            return Err(RoomError::AlreadyInRoom(player, current.clone()));
        }
        let config = self.config;
        let words = Arc::clone(&self.words);
        let room = self.rooms.entry(room_id.clone()).or_insert_with(|| {
            tracing::info!(room = %room_id, "room created");
            Room::new(room_id.clone(), config, words)
        });
        if !room.add_player(player, name) {
            // The only way add_player can fail here is capacity; the
            // duplicate case is caught by the index above.
            if room.is_empty() {
                self.rooms.remove(room_id);
            }
            return Err(RoomError::RoomFull(room_id.clone()));
        }
        self.player_rooms.insert(player, room_id.clone());
        Ok(&self.rooms[room_id])
    }

    /// Takes `player` out of their room. Empty rooms are dropped.
    pub fn leave(&mut self, player: PlayerId) -> Result<(RoomId, Player), RoomError> {
        let room_id = self
            .player_rooms
            .remove(&player)
            .ok_or(RoomError::NotInRoom(player))?;
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return Err(RoomError::NotFound(room_id));
        };
        let Some(removed) = room.remove_player(player) else {
            return Err(RoomError::NotInRoom(player));
        };
        if room.is_empty() {
            self.rooms.remove(&room_id);
            tracing::info!(room = %room_id, "room dropped (empty)");
        }
        Ok((room_id, removed))
    }

    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    pub fn room_mut(&mut self, id: &RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(id)
    }

    /// The room `player` currently belongs to, if any.
    pub fn room_of(&self, player: PlayerId) -> Option<&Room> {
        self.player_rooms.get(&player).and_then(|id| self.rooms.get(id))
    }

    pub fn room_of_mut(&mut self, player: PlayerId) -> Option<&mut Room> {
        let id = self.player_rooms.get(&player)?;
        self.rooms.get_mut(id)
    }

    pub fn room_id_of(&self, player: PlayerId) -> Option<&RoomId> {
        self.player_rooms.get(&player)
    }
}
