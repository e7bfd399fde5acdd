//! Player session tracking for Scrawl.
//!
//! A session is the server's record of one live TCP connection: the
//! player's server-assigned identity, the room they are in, and the
//! outbound channel their writer task drains. The [`SessionRegistry`]
//! is the server-wide map the router uses for broadcast.
//!
//! ```text
//! Room layer (above)    ← which players share a room
//!     ↕
//! Session layer (this)  ← identity + outbound delivery per connection
//!     ↕
//! Transport layer       ← framed bytes on one socket
//! ```

mod error;
mod registry;
mod session;

pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::{Outbound, Session};
