//! Sharing gardens
//!
//! - **Links**: X/Facebook intents and Cloudinary delivery URLs
//! - **Page**: Open Graph HTML for a shared garden
//! - **Server**: small Axum server that renders share pages
//!
//! # Example
//!
//! ```rust,ignore
//! use moodgarden::config::Config;
//! use moodgarden::share::{serve, ShareState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let state = ShareState::new(config.api.clone())?;
//!     serve(state, &config.share).await?;
//!     Ok(())
//! }
//! ```

mod links;
mod page;
mod server;

pub use links::{
    facebook_share_url, x_intent_url, Cloudinary, ShareTarget, DEFAULT_DOWNLOAD_NAME,
};
pub use page::{escape_html, render_share_page, ShareMeta};
pub use server::{build_router, serve, ShareState, SHARE_CACHE_CONTROL};

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

/// Share server errors
#[derive(Error, Debug)]
pub enum ShareError {
    /// Share id missing or blank
    #[error("Missing share id")]
    MissingId,

    /// The API has no share with this id
    #[error("Share not found: {0}")]
    NotFound(String),

    /// The API answered with something unusable
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The API could not be reached
    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ShareError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ShareError::MissingId => (StatusCode::BAD_REQUEST, "Bad request"),
            ShareError::NotFound(_) => (StatusCode::NOT_FOUND, "<h1>Not found</h1>"),
            ShareError::Upstream(_) | ShareError::Request(_) => {
                (StatusCode::BAD_GATEWAY, "<h1>Upstream error</h1>")
            }
            ShareError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "<h1>Internal error</h1>"),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Share page failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Share page rejected");
        }

        (status, Html(body)).into_response()
    }
}
