//! The server-wide session registry.
//!
//! One instance per server, shared behind a lock. Every mutation and
//! every broadcast walks this map; since delivery is a non-blocking
//! channel push, a dead receiver mid-broadcast never stops the rest of
//! the fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use scrawl_protocol::{PlayerId, RoomId, ServerMessage};
use scrawl_transport::ConnectionId;

use crate::{Session, SessionError};

/// Counter for server-assigned player ids.
static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);

/// Tracks every live session, keyed by connection identity.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<ConnectionId, Session>,
    by_player: HashMap<PlayerId, ConnectionId>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh, never-reused player id.
    pub fn allocate_player_id() -> PlayerId {
        PlayerId(NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a session. Replaces any previous session on the same
    /// connection (a client re-sending `connect` gets a fresh identity).
    pub fn insert(&mut self, session: Session) {
        let conn_id = session.conn_id;
        let player_id = session.player_id;
        if let Some(old) = self.sessions.insert(conn_id, session) {
            self.by_player.remove(&old.player_id);
        }
        self.by_player.insert(player_id, conn_id);
    }

    /// Removes and returns the session bound to `conn_id`.
    pub fn remove(&mut self, conn_id: ConnectionId) -> Option<Session> {
        let session = self.sessions.remove(&conn_id)?;
        self.by_player.remove(&session.player_id);
        Some(session)
    }

    /// Returns the session bound to `conn_id`.
    pub fn get(&self, conn_id: ConnectionId) -> Option<&Session> {
        self.sessions.get(&conn_id)
    }

    /// Mutable access to the session bound to `conn_id`.
    pub fn get_mut(&mut self, conn_id: ConnectionId) -> Option<&mut Session> {
        self.sessions.get_mut(&conn_id)
    }

    /// Sends `msg` to one player, wherever they are connected.
    pub fn send_to_player(
        &self,
        player_id: PlayerId,
        msg: ServerMessage,
    ) -> Result<(), SessionError> {
        let conn_id = self
            .by_player
            .get(&player_id)
            .ok_or(SessionError::PlayerNotFound(player_id))?;
        if let Some(session) = self.sessions.get(conn_id) {
            session.send(msg);
        }
        Ok(())
    }

    /// Sends `msg` to every session in `room`. Best effort: dead
    /// receivers are skipped and counted, never retried.
    pub fn broadcast_room(&self, room: &RoomId, msg: &ServerMessage) -> usize {
        self.broadcast_where(msg, |s| s.is_in(room))
    }

    /// Like [`broadcast_room`](Self::broadcast_room), but skips the
    /// session whose player id is `except` (draw relays exclude the
    /// stroke's author).
    pub fn broadcast_room_except(
        &self,
        room: &RoomId,
        except: PlayerId,
        msg: &ServerMessage,
    ) -> usize {
        self.broadcast_where(msg, |s| s.is_in(room) && s.player_id != except)
    }

    fn broadcast_where<F>(&self, msg: &ServerMessage, pred: F) -> usize
    where
        F: Fn(&Session) -> bool,
    {
        let mut delivered = 0;
        for session in self.sessions.values().filter(|s| pred(s)) {
            if session.send(msg.clone()) {
                delivered += 1;
            } else {
                tracing::debug!(
                    conn_id = %session.conn_id,
                    player_id = %session.player_id,
                    "skipping dead session in broadcast"
                );
            }
        }
        delivered
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn make_session(
        conn: u64,
        player: u64,
        room: Option<&str>,
    ) -> (Session, UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut s = Session::new(
            ConnectionId::new(conn),
            PlayerId(player),
            format!("p{player}"),
            tx,
        );
        s.room = room.map(RoomId::from);
        (s, rx)
    }

    #[test]
    fn test_allocate_player_id_is_unique() {
        let a = SessionRegistry::allocate_player_id();
        let b = SessionRegistry::allocate_player_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_insert_remove_round_trip() {
        let mut reg = SessionRegistry::new();
        let (s, _rx) = make_session(1, 10, None);
        reg.insert(s);
        assert_eq!(reg.len(), 1);

        let removed = reg.remove(ConnectionId::new(1)).unwrap();
        assert_eq!(removed.player_id, PlayerId(10));
        assert!(reg.is_empty());
        // Player index is cleared too.
        assert!(reg.send_to_player(PlayerId(10), err_msg()).is_err());
    }

    #[test]
    fn test_broadcast_room_scopes_by_room() {
        let mut reg = SessionRegistry::new();
        let (a, mut rx_a) = make_session(1, 10, Some("lobby"));
        let (b, mut rx_b) = make_session(2, 11, Some("lobby"));
        let (c, mut rx_c) = make_session(3, 12, Some("attic"));
        reg.insert(a);
        reg.insert(b);
        reg.insert(c);

        let delivered = reg.broadcast_room(&RoomId::from("lobby"), &err_msg());
        assert_eq!(delivered, 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
        assert!(rx_c.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_room_except_skips_author() {
        let mut reg = SessionRegistry::new();
        let (a, mut rx_a) = make_session(1, 10, Some("lobby"));
        let (b, mut rx_b) = make_session(2, 11, Some("lobby"));
        reg.insert(a);
        reg.insert(b);

        let delivered =
            reg.broadcast_room_except(&RoomId::from("lobby"), PlayerId(10), &err_msg());
        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_broadcast_survives_dead_receiver() {
        let mut reg = SessionRegistry::new();
        let (a, rx_a) = make_session(1, 10, Some("lobby"));
        let (b, mut rx_b) = make_session(2, 11, Some("lobby"));
        reg.insert(a);
        reg.insert(b);
        drop(rx_a); // first session's writer is gone

        let delivered = reg.broadcast_room(&RoomId::from("lobby"), &err_msg());
        assert_eq!(delivered, 1);
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_send_to_player_unknown_is_error() {
        let reg = SessionRegistry::new();
        assert!(matches!(
            reg.send_to_player(PlayerId(99), err_msg()),
            Err(SessionError::PlayerNotFound(_))
        ));
    }

    fn err_msg() -> ServerMessage {
        ServerMessage::Error { msg: "test".into() }
    }
}
