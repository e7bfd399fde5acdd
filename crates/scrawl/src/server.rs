//! `ScrawlServer` builder and accept loop.
//!
//! This is the entry point for running a Scrawl game server. It ties
//! together all the layers: transport → protocol → session → room.

use std::path::PathBuf;
use std::sync::Arc;

use scrawl_room::{RoomConfig, RoomDirectory, WordList};
use scrawl_session::SessionRegistry;
use scrawl_transport::{TcpTransport, Transport};
use tokio::sync::Mutex;

use crate::ScrawlError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks. The two
/// mutexes are never held at the same time: handlers mutate rooms and
/// capture the resulting snapshots under `rooms`, then deliver them
/// under `registry`. Delivery is a channel push, so neither lock is
/// ever held across socket I/O.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<SessionRegistry>,
    pub(crate) rooms: Mutex<RoomDirectory>,
}

/// Builder for configuring and starting a Scrawl server.
///
/// # Example
///
/// ```rust,ignore
/// use scrawl::prelude::*;
///
/// let server = ScrawlServer::builder()
///     .bind("0.0.0.0:5555")
///     .word_file("words.txt")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct ScrawlServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    word_file: Option<PathBuf>,
}

impl ScrawlServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:5555".to_string(),
            room_config: RoomConfig::default(),
            word_file: None,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the per-room configuration (capacity, round length).
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Sets the word list file. Without one (or if the file is
    /// unreadable) the built-in list is used.
    pub fn word_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.word_file = Some(path.into());
        self
    }

    /// Builds the server: loads the word list and binds the listener.
    ///
    /// A bind failure is fatal; a word-file problem is not.
    pub async fn build(self) -> Result<ScrawlServer, ScrawlError> {
        let words = match &self.word_file {
            Some(path) => WordList::load(path),
            None => WordList::builtin(),
        };
        tracing::info!(words = words.len(), "word list loaded");

        let transport = TcpTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(SessionRegistry::new()),
            rooms: Mutex::new(RoomDirectory::new(self.room_config, Arc::new(words))),
        });

        Ok(ScrawlServer { transport, state })
    }
}

impl Default for ScrawlServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Scrawl game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ScrawlServer {
    transport: TcpTransport,
    state: Arc<ServerState>,
}

impl ScrawlServer {
    /// Creates a new builder.
    pub fn builder() -> ScrawlServerBuilder {
        ScrawlServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// A failed accept is logged and the loop continues; the server runs
    /// until the process is terminated.
    pub async fn run(mut self) -> Result<(), ScrawlError> {
        if let Ok(addr) = self.local_addr() {
            tracing::info!(%addr, "scrawl server running");
        }

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
