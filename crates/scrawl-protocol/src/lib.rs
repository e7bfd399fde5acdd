//! Wire protocol for Scrawl.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Types** ([`Envelope`], [`ClientMessage`], [`ServerMessage`],
//!   [`RoomSnapshot`], etc.) — the structures that travel on the wire.
//! - **Codec** ([`LineCodec`]) — how a message maps to and from one
//!   newline-terminated UTF-8 JSON line.
//! - **Errors** ([`ProtocolError`]) — what can go wrong in between.
//!
//! The protocol layer sits between transport (raw framed bytes) and the
//! session layer (player identity). It knows nothing about connections
//! or rooms.
//!
//! ```text
//! Transport (lines) → Protocol (messages) → Session (player context)
//! ```

mod codec;
mod error;
mod types;

pub use codec::LineCodec;
pub use error::ProtocolError;
pub use types::{
    ClientMessage, DrawStroke, Envelope, PlayerEntry, PlayerId, PlayerInfo, RoomId,
    RoomSnapshot, ServerMessage,
};
