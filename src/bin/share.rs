//! Mood Gardens Share Server
//!
//! Run with: cargo run --bin moodgarden-share
//!
//! Serves `/share/:share_id` pages with Open Graph tags so shared gardens
//! get a rich preview on social sites.
//!
//! # Configuration
//!
//! Config file `[api]` and `[share]` sections, plus environment variables:
//! - `MOODGARDEN_API_BASE`: API the share metadata is fetched from
//! - `MOODGARDEN_SHARE_HOST`: Host to bind to (default: 0.0.0.0)
//! - `MOODGARDEN_SHARE_PORT`: Port to listen on (default: 8083)
//! - `MOODGARDEN_LOG_FORMAT`: `pretty` or `json`
//! - `RUST_LOG`: Log filter (default: moodgarden=info,tower_http=debug)

use moodgarden::config::Config;
use moodgarden::share::{serve, ShareState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load_with_env(std::path::Path::new(&path))?,
        None => Config::load_default(),
    };

    moodgarden::logging::init(&config.logging)?;

    tracing::info!("Starting Mood Gardens share server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Share metadata from {}", config.api.normalized_base());

    let state = ShareState::new(config.api.clone())?;
    serve(state, &config.share).await?;

    tracing::info!("Share server stopped");
    Ok(())
}
