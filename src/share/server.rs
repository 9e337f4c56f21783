//! Share page server
//!
//! # Endpoints
//!
//! - `GET /share/:share_id` - Open Graph page for a shared garden
//! - `GET /health/live` - Liveness probe

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use super::page::{render_share_page, ShareMeta};
use super::ShareError;
use crate::config::{ApiConfig, ShareConfig};

/// Cache policy for rendered share pages
pub const SHARE_CACHE_CONTROL: &str = "public, s-maxage=600, stale-while-revalidate=86400";

/// Shared state for share handlers
#[derive(Clone)]
pub struct ShareState {
    http: reqwest::Client,
    /// API base the metadata is fetched from
    pub api: Arc<ApiConfig>,
}

impl ShareState {
    pub fn new(api: ApiConfig) -> Result<Self, ShareError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(api.request_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            api: Arc::new(api),
        })
    }

    /// Fetch share metadata from the API
    pub async fn fetch_meta(&self, share_id: &str) -> Result<ShareMeta, ShareError> {
        let url = self
            .api
            .api_url(&format!("/share-meta/{}", urlencoding::encode(share_id)));

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(share_id = %share_id, status = %status, "Share metadata not found");
            return Err(ShareError::NotFound(share_id.to_string()));
        }

        response
            .json::<ShareMeta>()
            .await
            .map_err(|e| ShareError::Upstream(format!("Invalid share metadata: {}", e)))
    }
}

/// Build the share router
pub fn build_router(state: ShareState) -> Router {
    let health_routes = Router::new().route("/live", get(liveness));

    Router::new()
        .route("/share/", get(missing_share_id))
        .route("/share/:share_id", get(share_page))
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the share server
pub async fn serve(state: ShareState, config: &ShareConfig) -> Result<(), ShareError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Share server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Share server shut down gracefully");
    Ok(())
}

/// GET /health/live
async fn liveness() -> StatusCode {
    StatusCode::OK
}

async fn missing_share_id() -> ShareError {
    ShareError::MissingId
}

/// GET /share/:share_id
async fn share_page(
    State(state): State<Arc<ShareState>>,
    Path(share_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ShareError> {
    let share_id = share_id.trim();
    if share_id.is_empty() {
        return Err(ShareError::MissingId);
    }

    let meta = state.fetch_meta(share_id).await?;
    let canonical = canonical_url(&headers, share_id);
    let html = render_share_page(&meta, &canonical);

    let mut response = Html(html).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(SHARE_CACHE_CONTROL),
    );
    Ok(response)
}

/// Public URL of the share page as the client reached it
fn canonical_url(headers: &HeaderMap, share_id: &str) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    // Proxies may send a list; the first entry is the client-facing one
    let proto = header("x-forwarded-proto")
        .and_then(|p| p.split(',').next())
        .map(str::trim)
        .unwrap_or("https");
    let host = header("host").unwrap_or("localhost");

    format!(
        "{}://{}/share/{}",
        proto,
        host,
        urlencoding::encode(share_id)
    )
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
