//! Core protocol types for Scrawl's wire format.
//!
//! Every message on the wire is one UTF-8 JSON object of the shape
//! `{"type": <string>, "data": <object>}` followed by a single `\n`.
//! [`Envelope`] is that raw shape; [`ClientMessage`] and
//! [`ServerMessage`] are the typed vocabularies layered on top of it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Player ids are assigned by the server when a `connect` message is
/// accepted; they are stable for the lifetime of that connection and are
/// never reused across the process. `#[serde(transparent)]` keeps the
/// wire form a plain number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room.
///
/// Rooms are named by clients (`join_room {"room": "lobby"}`), so the id
/// is a string rather than a counter. Transparent on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the room name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Envelope — the raw wire shape
// ---------------------------------------------------------------------------

/// The raw `{type, data}` wire object, before the `type` tag is matched
/// against the protocol vocabulary.
///
/// Decoding an envelope only requires a JSON object with a string `type`
/// key; `data` defaults to an empty map when absent. The codec goes
/// through this shape so that a well-formed frame with an unknown tag can
/// be reported as [`ProtocolError::UnknownType`](crate::ProtocolError)
/// instead of a generic parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// The message type tag.
    #[serde(rename = "type")]
    pub kind: String,

    /// The message payload. Empty map when the frame carried no `data`.
    #[serde(default)]
    pub data: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Payload fragments
// ---------------------------------------------------------------------------

/// One drawing stroke segment, relayed verbatim between clients.
///
/// The server never interprets strokes; it only tags them with the
/// sender's id and fans them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawStroke {
    pub x: f32,
    pub y: f32,
    pub prev_x: f32,
    pub prev_y: f32,
    /// RGB color.
    pub color: [u8; 3],
    /// Brush size in pixels.
    pub size: f32,
}

/// Public information about one player, used in join/connect payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
}

/// One player's entry in a room snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub name: String,
    pub score: u32,
}

/// The public, word-redacted serialization of a room's current state.
///
/// Broadcast to every session in the room after any state-affecting
/// event. The secret word must never appear here — it travels only in
/// the `game_started` message addressed to the drawer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room: RoomId,
    pub started: bool,
    /// Index of the current (or most recent) round; 0 before the first.
    pub round: u32,
    pub drawer: Option<PlayerId>,
    pub seconds_remaining: u64,
    pub solved: bool,
    pub players: BTreeMap<PlayerId, PlayerEntry>,
}

// ---------------------------------------------------------------------------
// Client → server messages
// ---------------------------------------------------------------------------

/// Messages a client may send.
///
/// `#[serde(tag = "type", content = "data")]` with snake_case renames
/// produces exactly the `{"type": "join_room", "data": {...}}` wire
/// shape. Variants with no payload are empty struct variants so that an
/// explicit empty `data` map round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Introduce yourself. The server assigns the player id; a
    /// client-supplied `player_id` is accepted for compatibility with
    /// older clients but ignored.
    Connect {
        name: String,
        #[serde(default)]
        player_id: Option<u64>,
    },

    /// Join (or create) the named room. `name` updates the display name
    /// recorded at connect time when present.
    JoinRoom {
        #[serde(alias = "room_id")]
        room: RoomId,
        #[serde(default)]
        name: Option<String>,
    },

    /// Leave the current room.
    LeaveRoom {},

    /// Start the game in the current room.
    StartGame {},

    /// End the current round and start the next one.
    NextRound {},

    /// Force the game back to the lobby.
    EndGame {},

    /// Guess the secret word.
    Guess { text: String },

    /// One drawing stroke, relayed to the rest of the room.
    Draw(DrawStroke),

    /// A chat line, relayed to the whole room.
    Chat {
        #[serde(alias = "message")]
        text: String,
    },

    /// Orderly goodbye; same cleanup as a socket close.
    Disconnect {},
}

impl ClientMessage {
    /// Every `type` tag in the client vocabulary.
    pub const TYPES: &'static [&'static str] = &[
        "connect",
        "join_room",
        "leave_room",
        "start_game",
        "next_round",
        "end_game",
        "guess",
        "draw",
        "chat",
        "disconnect",
    ];

    /// Returns `true` if `kind` is a known client message tag.
    pub fn is_known_type(kind: &str) -> bool {
        Self::TYPES.contains(&kind)
    }
}

// ---------------------------------------------------------------------------
// Server → client messages
// ---------------------------------------------------------------------------

/// Messages the server sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Reply to `connect`: the assigned id. `players` lists the members
    /// of the client's room, which is empty until it joins one.
    Connected {
        player_id: PlayerId,
        players: Vec<PlayerInfo>,
    },

    /// Private acknowledgement of a request, named after the request.
    Ack { ok: bool, event: String },

    /// Full room snapshot (word redacted).
    RoomState(RoomSnapshot),

    /// Broadcast outcome of an administrative transition
    /// (`start_game`, `next_round`, `end_game`).
    Event { event: String, ok: bool },

    /// Private result of a guess. `score` is the guesser's new total.
    GuessResult { ok: bool, score: u32 },

    /// A relayed drawing stroke, tagged with the sender.
    DrawSync { by: PlayerId, stroke: DrawStroke },

    /// A relayed chat line.
    Chat {
        by: PlayerId,
        by_name: String,
        text: String,
    },

    /// A player entered the room.
    PlayerJoined { player: PlayerInfo },

    /// A player left the room (or disconnected).
    PlayerLeft {
        player_id: PlayerId,
        player_name: String,
    },

    /// A round began. Only the drawer's copy carries `word`; everyone
    /// else gets `drawer_name`.
    GameStarted {
        round: u32,
        is_drawer: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        word: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        drawer_name: Option<String>,
    },

    /// Someone guessed the word; the round is over.
    PlayerGuessed {
        player_id: PlayerId,
        player_name: String,
    },

    /// Protocol-level complaint. The connection stays open.
    Error { msg: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire format is consumed by non-Rust clients, so these tests
    //! pin the exact JSON shapes rather than just round-tripping.

    use super::*;
    use serde_json::json;

    // ---------------------------------------------------------------
    // Identity types
    // ---------------------------------------------------------------

    #[test]
    fn test_player_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&PlayerId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_player_id_deserializes_from_plain_number() {
        let pid: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(pid, PlayerId(42));
    }

    #[test]
    fn test_player_id_display() {
        assert_eq!(PlayerId(7).to_string(), "P-7");
    }

    #[test]
    fn test_room_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&RoomId::from("lobby")).unwrap();
        assert_eq!(json, "\"lobby\"");
    }

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId::from("attic").to_string(), "R-attic");
    }

    // ---------------------------------------------------------------
    // Envelope
    // ---------------------------------------------------------------

    #[test]
    fn test_envelope_data_defaults_to_empty_map() {
        let env: Envelope = serde_json::from_str(r#"{"type": "leave_room"}"#).unwrap();
        assert_eq!(env.kind, "leave_room");
        assert!(env.data.is_empty());
    }

    #[test]
    fn test_envelope_rejects_missing_type() {
        let result: Result<Envelope, _> = serde_json::from_str(r#"{"data": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_envelope_rejects_non_string_type() {
        let result: Result<Envelope, _> = serde_json::from_str(r#"{"type": 7}"#);
        assert!(result.is_err());
    }

    // ---------------------------------------------------------------
    // ClientMessage wire shapes
    // ---------------------------------------------------------------

    #[test]
    fn test_connect_json_format() {
        let msg = ClientMessage::Connect {
            name: "ada".into(),
            player_id: None,
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "connect");
        assert_eq!(v["data"]["name"], "ada");
    }

    #[test]
    fn test_connect_tolerates_client_supplied_player_id() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "connect",
            "data": {"name": "ada", "player_id": 99}
        }))
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Connect {
                name: "ada".into(),
                player_id: Some(99),
            }
        );
    }

    #[test]
    fn test_join_room_accepts_room_id_alias() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "join_room",
            "data": {"room_id": "lobby"}
        }))
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinRoom {
                room: RoomId::from("lobby"),
                name: None,
            }
        );
    }

    #[test]
    fn test_chat_accepts_message_alias() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "chat",
            "data": {"message": "hi"}
        }))
        .unwrap();
        assert_eq!(msg, ClientMessage::Chat { text: "hi".into() });
    }

    #[test]
    fn test_join_room_json_format() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "join_room",
            "data": {"room": "lobby"}
        }))
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinRoom {
                room: RoomId::from("lobby"),
                name: None,
            }
        );
    }

    #[test]
    fn test_empty_payload_variants_accept_empty_data() {
        for (kind, expected) in [
            ("leave_room", ClientMessage::LeaveRoom {}),
            ("start_game", ClientMessage::StartGame {}),
            ("next_round", ClientMessage::NextRound {}),
            ("end_game", ClientMessage::EndGame {}),
            ("disconnect", ClientMessage::Disconnect {}),
        ] {
            let msg: ClientMessage =
                serde_json::from_value(json!({"type": kind, "data": {}}))
                    .unwrap_or_else(|e| panic!("{kind}: {e}"));
            assert_eq!(msg, expected);
        }
    }

    #[test]
    fn test_draw_payload_is_the_stroke_object() {
        let msg = ClientMessage::Draw(DrawStroke {
            x: 10.0,
            y: 20.0,
            prev_x: 9.0,
            prev_y: 19.0,
            color: [255, 0, 0],
            size: 4.0,
        });
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "draw");
        assert_eq!(v["data"]["x"], 10.0);
        assert_eq!(v["data"]["color"], json!([255, 0, 0]));
    }

    #[test]
    fn test_guess_round_trip() {
        let msg = ClientMessage::Guess {
            text: "apple".into(),
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: ClientMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_known_type_table_matches_serde_tags() {
        // Every tag in TYPES must deserialize to *some* variant when given
        // a plausible payload, and the serialized tag must appear in TYPES.
        let msg = ClientMessage::Chat { text: "hi".into() };
        let v = serde_json::to_value(&msg).unwrap();
        let tag = v["type"].as_str().unwrap();
        assert!(ClientMessage::is_known_type(tag));
        assert!(!ClientMessage::is_known_type("fly_to_moon"));
    }

    // ---------------------------------------------------------------
    // ServerMessage wire shapes
    // ---------------------------------------------------------------

    #[test]
    fn test_connected_json_format() {
        let msg = ServerMessage::Connected {
            player_id: PlayerId(3),
            players: vec![],
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "connected");
        assert_eq!(v["data"]["player_id"], 3);
        assert_eq!(v["data"]["players"], json!([]));
    }

    #[test]
    fn test_game_started_drawer_copy_carries_word() {
        let msg = ServerMessage::GameStarted {
            round: 1,
            is_drawer: true,
            word: Some("apple".into()),
            drawer_name: None,
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["data"]["word"], "apple");
        // Absent fields are omitted entirely, not serialized as null.
        assert!(v["data"].get("drawer_name").is_none());
    }

    #[test]
    fn test_game_started_guesser_copy_withholds_word() {
        let msg = ServerMessage::GameStarted {
            round: 2,
            is_drawer: false,
            word: None,
            drawer_name: Some("ada".into()),
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert!(v["data"].get("word").is_none());
        assert_eq!(v["data"]["drawer_name"], "ada");
    }

    #[test]
    fn test_room_snapshot_players_keyed_by_id() {
        let mut players = BTreeMap::new();
        players.insert(
            PlayerId(1),
            PlayerEntry {
                name: "ada".into(),
                score: 10,
            },
        );
        let msg = ServerMessage::RoomState(RoomSnapshot {
            room: RoomId::from("lobby"),
            started: true,
            round: 1,
            drawer: Some(PlayerId(1)),
            seconds_remaining: 42,
            solved: false,
            players,
        });
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "room_state");
        assert_eq!(v["data"]["room"], "lobby");
        assert_eq!(v["data"]["players"]["1"]["name"], "ada");
        assert_eq!(v["data"]["players"]["1"]["score"], 10);
        // The snapshot type has no field that could leak the word.
        assert!(v["data"].get("word").is_none());
    }

    #[test]
    fn test_error_round_trip() {
        let msg = ServerMessage::Error {
            msg: "unknown message type: warp".into(),
        };
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: ServerMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_guess_result_json_format() {
        let msg = ServerMessage::GuessResult { ok: true, score: 17 };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "guess_result");
        assert_eq!(v["data"]["ok"], true);
        assert_eq!(v["data"]["score"], 17);
    }

    #[test]
    fn test_draw_sync_json_format() {
        let msg = ServerMessage::DrawSync {
            by: PlayerId(4),
            stroke: DrawStroke {
                x: 1.0,
                y: 2.0,
                prev_x: 0.0,
                prev_y: 0.0,
                color: [0, 0, 0],
                size: 2.0,
            },
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "draw_sync");
        assert_eq!(v["data"]["by"], 4);
        assert_eq!(v["data"]["stroke"]["y"], 2.0);
    }
}
