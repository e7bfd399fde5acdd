//! Per-connection handler: decode loop and message routing.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler, plus a writer task that drains the session's outbound
//! channel onto the socket. The flow is:
//!   1. Receive `connect` → assign a PlayerId, register the session
//!   2. Loop: receive frames → decode → route
//!   3. On close or error, a drop guard tears the session down and
//!      tells the room

use std::sync::Arc;

use scrawl_protocol::{
    ClientMessage, LineCodec, PlayerId, ProtocolError, RoomId, ServerMessage,
};
use scrawl_room::{GuessOutcome, Room};
use scrawl_session::{Outbound, Session, SessionRegistry};
use scrawl_transport::{Connection, ConnectionId, TcpConnection};
use tokio::sync::mpsc;

use crate::ScrawlError;
use crate::server::ServerState;

/// Drop guard that removes the connection's session when the handler
/// exits, however it exits.
///
/// Since `Drop` is synchronous, cleanup runs in a fire-and-forget task.
/// Removing an unregistered connection is a no-op, so the guard is safe
/// to arm before `connect` arrives.
struct DisconnectGuard {
    conn_id: ConnectionId,
    state: Arc<ServerState>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            cleanup_session(state, conn_id).await;
        });
    }
}

/// Removes the session and, if it was in a room, takes it out of the
/// room and tells the survivors.
async fn cleanup_session(state: Arc<ServerState>, conn_id: ConnectionId) {
    let session = {
        let mut registry = state.registry.lock().await;
        registry.remove(conn_id)
    };
    let Some(session) = session else {
        return;
    };
    tracing::info!(%conn_id, player_id = %session.player_id, "session closed");

    if session.room.is_none() {
        return;
    }
    let departure = {
        let mut rooms = state.rooms.lock().await;
        match rooms.leave(session.player_id) {
            Ok((room_id, player)) => {
                let snapshot = rooms.room(&room_id).map(Room::snapshot);
                Some((room_id, player.name, snapshot))
            }
            Err(e) => {
                tracing::debug!(player_id = %session.player_id, error = %e, "leave on cleanup failed");
                None
            }
        }
    };

    if let Some((room_id, name, snapshot)) = departure {
        let registry = state.registry.lock().await;
        registry.broadcast_room(
            &room_id,
            &ServerMessage::PlayerLeft {
                player_id: session.player_id,
                player_name: name,
            },
        );
        if let Some(snapshot) = snapshot {
            registry.broadcast_room(&room_id, &ServerMessage::RoomState(snapshot));
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: TcpConnection,
    state: Arc<ServerState>,
) -> Result<(), ScrawlError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    spawn_writer(conn.clone(), rx);

    let _guard = DisconnectGuard {
        conn_id,
        state: Arc::clone(&state),
    };
    let mut ctx = HandlerCtx {
        state,
        conn_id,
        outbound: tx,
        player: None,
    };
    let codec = LineCodec;

    loop {
        let line = match conn.recv().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let msg = match codec.decode_client(&line) {
            Ok(msg) => msg,
            Err(ProtocolError::UnknownType(kind)) => {
                ctx.reply(ServerMessage::Error {
                    msg: format!("unknown message type: {kind}"),
                });
                continue;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode message");
                ctx.reply(ServerMessage::Error {
                    msg: format!("invalid message: {e}"),
                });
                continue;
            }
        };

        if ctx.handle(msg).await {
            break;
        }
    }

    // _guard drops here → session cleanup fires.
    Ok(())
}

/// Spawns the task that drains `rx` onto the socket.
///
/// Encodes each queued message as one frame; a send failure closes the
/// connection, which wakes the read loop and ends the handler.
fn spawn_writer(conn: TcpConnection, mut rx: mpsc::UnboundedReceiver<ServerMessage>) {
    tokio::spawn(async move {
        let codec = LineCodec;
        while let Some(msg) = rx.recv().await {
            let frame = match codec.encode(&msg) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(conn_id = %conn.id(), error = %e, "encode failed");
                    continue;
                }
            };
            if let Err(e) = conn.send(&frame).await {
                tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, closing");
                let _ = conn.close().await;
                break;
            }
        }
    });
}

/// One connection's routing state.
struct HandlerCtx {
    state: Arc<ServerState>,
    conn_id: ConnectionId,
    outbound: Outbound,
    /// Set once `connect` has been accepted.
    player: Option<PlayerId>,
}

impl HandlerCtx {
    /// Routes one decoded message. Returns `true` if the connection
    /// should close.
    async fn handle(&mut self, msg: ClientMessage) -> bool {
        // `connect` and `disconnect` are valid in any state; everything
        // else requires an established identity.
        let msg = match msg {
            ClientMessage::Connect { name, .. } => {
                self.on_connect(name).await;
                return false;
            }
            ClientMessage::Disconnect {} => return true,
            other => other,
        };
        let Some(player) = self.player else {
            self.reply(ServerMessage::Error {
                msg: "connect first".to_string(),
            });
            return false;
        };

        match msg {
            ClientMessage::JoinRoom { room, name } => {
                self.on_join_room(player, room, name).await;
            }
            ClientMessage::LeaveRoom {} => self.on_leave_room(player).await,
            ClientMessage::StartGame {} => {
                self.on_round_transition(player, "start_game").await;
            }
            ClientMessage::NextRound {} => {
                self.on_round_transition(player, "next_round").await;
            }
            ClientMessage::EndGame {} => self.on_end_game(player).await,
            ClientMessage::Guess { text } => self.on_guess(player, text).await,
            ClientMessage::Draw(stroke) => {
                let registry = self.state.registry.lock().await;
                if let Some(room) =
                    registry.get(self.conn_id).and_then(|s| s.room.clone())
                {
                    registry.broadcast_room_except(
                        &room,
                        player,
                        &ServerMessage::DrawSync { by: player, stroke },
                    );
                }
            }
            ClientMessage::Chat { text } => {
                let registry = self.state.registry.lock().await;
                if let Some(session) = registry.get(self.conn_id) {
                    if let Some(room) = session.room.clone() {
                        let chat = ServerMessage::Chat {
                            by: player,
                            by_name: session.name.clone(),
                            text,
                        };
                        registry.broadcast_room(&room, &chat);
                    }
                }
            }
            ClientMessage::Connect { .. } | ClientMessage::Disconnect {} => {
                unreachable!("handled above");
            }
        }
        false
    }

    /// Queues a message for this connection.
    fn reply(&self, msg: ServerMessage) {
        let _ = self.outbound.send(msg);
    }

    fn ack(&self, ok: bool, event: &str) {
        self.reply(ServerMessage::Ack {
            ok,
            event: event.to_string(),
        });
    }

    async fn on_connect(&mut self, name: String) {
        if self.player.is_some() {
            self.reply(ServerMessage::Error {
                msg: "already connected".to_string(),
            });
            return;
        }
        let player_id = SessionRegistry::allocate_player_id();
        let session =
            Session::new(self.conn_id, player_id, name.clone(), self.outbound.clone());
        {
            let mut registry = self.state.registry.lock().await;
            registry.insert(session);
        }
        self.player = Some(player_id);
        tracing::info!(conn_id = %self.conn_id, %player_id, %name, "player connected");
        self.reply(ServerMessage::Connected {
            player_id,
            players: Vec::new(),
        });
    }

    async fn on_join_room(&self, player: PlayerId, room_id: RoomId, name: Option<String>) {
        // A join may rename; the room records whatever name is current.
        let display = {
            let mut registry = self.state.registry.lock().await;
            let Some(session) = registry.get_mut(self.conn_id) else {
                return;
            };
            if let Some(name) = name {
                session.name = name;
            }
            session.name.clone()
        };

        let joined = {
            let mut rooms = self.state.rooms.lock().await;
            rooms.join(player, &display, &room_id).map(|room| {
                let info = room.player(player).map(|p| p.info());
                (info, room.snapshot())
            })
        };

        match joined {
            Ok((info, snapshot)) => {
                let mut registry = self.state.registry.lock().await;
                if let Some(session) = registry.get_mut(self.conn_id) {
                    session.room = Some(room_id.clone());
                }
                if let Some(info) = info {
                    registry.broadcast_room_except(
                        &room_id,
                        player,
                        &ServerMessage::PlayerJoined { player: info },
                    );
                }
                self.ack(true, "join_room");
                registry.broadcast_room(&room_id, &ServerMessage::RoomState(snapshot));
            }
            Err(e) => {
                tracing::debug!(%player, room = %room_id, error = %e, "join failed");
                self.ack(false, "join_room");
                self.reply(ServerMessage::Error { msg: e.to_string() });
            }
        }
    }

    async fn on_leave_room(&self, player: PlayerId) {
        let left = {
            let mut rooms = self.state.rooms.lock().await;
            rooms.leave(player).map(|(room_id, removed)| {
                let snapshot = rooms.room(&room_id).map(Room::snapshot);
                (room_id, removed.name, snapshot)
            })
        };

        match left {
            Ok((room_id, name, snapshot)) => {
                let mut registry = self.state.registry.lock().await;
                if let Some(session) = registry.get_mut(self.conn_id) {
                    session.room = None;
                }
                self.ack(true, "leave_room");
                registry.broadcast_room(
                    &room_id,
                    &ServerMessage::PlayerLeft {
                        player_id: player,
                        player_name: name,
                    },
                );
                if let Some(snapshot) = snapshot {
                    registry
                        .broadcast_room(&room_id, &ServerMessage::RoomState(snapshot));
                }
            }
            Err(e) => {
                self.ack(false, "leave_room");
                self.reply(ServerMessage::Error { msg: e.to_string() });
            }
        }
    }

    /// `start_game` and `next_round` share everything but the room call.
    async fn on_round_transition(&self, player: PlayerId, event: &str) {
        let result = {
            let mut rooms = self.state.rooms.lock().await;
            let Some(room) = rooms.room_of_mut(player) else {
                self.not_in_room(event);
                return;
            };
            let outcome = if event == "start_game" {
                room.start_game()
            } else {
                room.next_round()
            };
            outcome.map(|()| (room.id().clone(), round_openings(room), room.snapshot()))
        };

        match result {
            Ok((room_id, openings, snapshot)) => {
                self.ack(true, event);
                let registry = self.state.registry.lock().await;
                registry.broadcast_room(
                    &room_id,
                    &ServerMessage::Event {
                        event: event.to_string(),
                        ok: true,
                    },
                );
                for (recipient, msg) in openings {
                    if let Err(e) = registry.send_to_player(recipient, msg) {
                        tracing::debug!(player_id = %recipient, error = %e, "round opening not delivered");
                    }
                }
                registry.broadcast_room(&room_id, &ServerMessage::RoomState(snapshot));
            }
            Err(e) => {
                self.ack(false, event);
                self.reply(ServerMessage::Error { msg: e.to_string() });
            }
        }
    }

    async fn on_end_game(&self, player: PlayerId) {
        let ended = {
            let mut rooms = self.state.rooms.lock().await;
            let Some(room) = rooms.room_of_mut(player) else {
                self.not_in_room("end_game");
                return;
            };
            room.end_game();
            (room.id().clone(), room.snapshot())
        };

        let (room_id, snapshot) = ended;
        self.ack(true, "end_game");
        let registry = self.state.registry.lock().await;
        registry.broadcast_room(
            &room_id,
            &ServerMessage::Event {
                event: "end_game".to_string(),
                ok: true,
            },
        );
        registry.broadcast_room(&room_id, &ServerMessage::RoomState(snapshot));
    }

    async fn on_guess(&self, player: PlayerId, text: String) {
        let result = {
            let mut rooms = self.state.rooms.lock().await;
            let Some(room) = rooms.room_of_mut(player) else {
                self.not_in_room("guess");
                return;
            };
            let outcome = room.submit_guess(player, &text);
            let (score, name) = room
                .player(player)
                .map(|p| (p.score, p.name.clone()))
                .unwrap_or_default();
            (outcome, score, name, room.id().clone(), room.snapshot())
        };
        let (outcome, score, name, room_id, snapshot) = result;

        let registry = self.state.registry.lock().await;
        match outcome {
            GuessOutcome::Correct { .. } => {
                self.reply(ServerMessage::GuessResult { ok: true, score });
                registry.broadcast_room(
                    &room_id,
                    &ServerMessage::PlayerGuessed {
                        player_id: player,
                        player_name: name,
                    },
                );
                registry.broadcast_room(&room_id, &ServerMessage::RoomState(snapshot));
            }
            GuessOutcome::Incorrect => {
                self.reply(ServerMessage::GuessResult { ok: false, score });
                // Wrong guesses double as table talk.
                registry.broadcast_room(
                    &room_id,
                    &ServerMessage::Chat {
                        by: player,
                        by_name: name,
                        text,
                    },
                );
                registry.broadcast_room(&room_id, &ServerMessage::RoomState(snapshot));
            }
            GuessOutcome::Rejected => {
                self.reply(ServerMessage::GuessResult { ok: false, score });
            }
        }
    }

    fn not_in_room(&self, event: &str) {
        self.ack(false, event);
        self.reply(ServerMessage::Error {
            msg: "not in a room".to_string(),
        });
    }
}

/// Builds the per-player round announcements: the drawer's copy carries
/// the word, everyone else's carries the drawer's name.
fn round_openings(room: &Room) -> Vec<(PlayerId, ServerMessage)> {
    let Some(round) = room.round() else {
        return Vec::new();
    };
    let drawer = round.drawer;
    let drawer_name = drawer.and_then(|d| room.player(d)).map(|p| p.name.clone());

    room.player_infos()
        .into_iter()
        .map(|p| {
            let is_drawer = Some(p.id) == drawer;
            let msg = ServerMessage::GameStarted {
                round: round.index,
                is_drawer,
                word: if is_drawer {
                    Some(round.word().to_string())
                } else {
                    None
                },
                drawer_name: if is_drawer { None } else { drawer_name.clone() },
            };
            (p.id, msg)
        })
        .collect()
}
