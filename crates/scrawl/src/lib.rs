//! # Scrawl
//!
//! Server for a LAN drawing-and-guessing party game.
//!
//! One player draws a secret word, everyone else guesses it over chat,
//! and fast guesses pay better. Clients talk newline-delimited JSON
//! over plain TCP, so anything from a desktop client to `nc` can play.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scrawl::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ScrawlError> {
//!     let server = ScrawlServer::builder()
//!         .bind("0.0.0.0:5555")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::ScrawlError;
pub use server::{ScrawlServer, ScrawlServerBuilder};

/// The usual imports for running a server.
pub mod prelude {
    pub use crate::{ScrawlError, ScrawlServer, ScrawlServerBuilder};
    pub use scrawl_protocol::{
        ClientMessage, DrawStroke, PlayerId, RoomId, ServerMessage,
    };
    pub use scrawl_room::RoomConfig;
}
