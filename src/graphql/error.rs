//! GraphQL transport errors

use thiserror::Error;

/// Errors that can occur when talking to the Mood Gardens API
#[derive(Error, Debug)]
pub enum GraphQlError {
    #[error("API unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timeout")]
    Timeout,

    #[error("Rate limited")]
    RateLimited,

    /// HTTP 401 or a GraphQL error with code UNAUTHENTICATED
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    #[error("GraphQL error: {message}")]
    GraphQl {
        message: String,
        code: Option<String>,
    },

    #[error("Response had no data for {0}")]
    MissingData(&'static str),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl GraphQlError {
    /// Classify a reqwest failure
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GraphQlError::Timeout
        } else if e.is_connect() {
            GraphQlError::Unavailable
        } else {
            GraphQlError::Request(e)
        }
    }

    /// Whether sending the same query again may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GraphQlError::Unavailable | GraphQlError::Timeout | GraphQlError::RateLimited
        ) || matches!(self, GraphQlError::Http { status, .. } if *status >= 500)
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, GraphQlError::Unauthenticated)
    }
}

/// Result type for GraphQL operations
pub type GraphQlResult<T> = Result<T, GraphQlError>;
