//! Room and game logic: membership, drawer rotation, rounds, guess
//! matching, and scoring.
//!
//! This crate is deliberately I/O-free. It owns the rules of the game
//! and exposes them as plain synchronous state machines; the server
//! layer wraps a [`RoomDirectory`] in a mutex and translates its
//! results into wire messages.

mod config;
mod directory;
mod error;
mod room;
mod words;

pub use config::RoomConfig;
pub use directory::RoomDirectory;
pub use error::RoomError;
pub use room::{Guess, GuessOutcome, Player, Room, Round, score_for_remaining};
pub use words::WordList;
