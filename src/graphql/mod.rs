//! GraphQL API access
//!
//! The Mood Gardens backend is only reachable through its GraphQL endpoint.
//!
//! - **Client**: HTTP transport with session cookies and query retries
//! - **Documents**: the operations this crate issues
//! - **Types**: objects returned by those operations

mod client;
pub mod documents;
mod error;
mod types;

pub use client::GraphQlClient;
pub use error::{GraphQlError, GraphQlResult};
pub use types::{DiaryEntry, Garden, GardenStatus, User, UserSettings};
