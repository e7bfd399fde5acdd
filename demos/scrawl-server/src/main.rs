//! Runnable Scrawl server, configured from the environment:
//!
//! - `SCRAWL_ADDR`        listen address (default `0.0.0.0:5555`)
//! - `SCRAWL_WORDS`       path to a word list, one word per line
//! - `SCRAWL_ROUND_SECS`  round length in seconds
//! - `SCRAWL_MIN_PLAYERS` players needed to start a game
//! - `SCRAWL_MAX_PLAYERS` room capacity
//!
//! Log filtering via `RUST_LOG` as usual.

use scrawl::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<(), ScrawlError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scrawl=info,scrawl_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("SCRAWL_ADDR").unwrap_or_else(|_| "0.0.0.0:5555".into());
    let defaults = RoomConfig::default();
    let config = RoomConfig {
        min_players: env_or("SCRAWL_MIN_PLAYERS", defaults.min_players),
        max_players: env_or("SCRAWL_MAX_PLAYERS", defaults.max_players),
        round_secs: env_or("SCRAWL_ROUND_SECS", defaults.round_secs),
    };

    let mut builder = ScrawlServer::builder().bind(&addr).room_config(config);
    if let Ok(words) = std::env::var("SCRAWL_WORDS") {
        builder = builder.word_file(words);
    }

    let server = builder.build().await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "scrawl listening");
    }
    server.run().await
}
