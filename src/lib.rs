//! # Mood Gardens
//!
//! Client for the Mood Gardens journaling service. Users write a short diary
//! entry each day and the service turns it into a generated garden image.
//!
//! ## Features
//!
//! - **Garden tracking**: polls a generation job until READY or FAILED and
//!   shows a smoothed progress estimate meanwhile
//! - **Diary**: validated entry submission and a paginated history feed
//! - **Calendar**: month grid with each day's garden
//! - **Sharing**: social links, Cloudinary URLs and an Open Graph share page
//!
//! ## Modules
//!
//! - [`garden`]: job watcher and progress estimator
//! - [`graphql`]: GraphQL transport and API types
//! - [`auth`]: session state shared with session-dependent components
//! - [`entries`]: diary entries and the history feed
//! - [`share`]: share links and the share page server
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use moodgarden::auth::AuthSession;
//! use moodgarden::config::ApiConfig;
//! use moodgarden::garden::{GardenWatcher, WatchConfig, WatchEvent};
//! use moodgarden::graphql::GraphQlClient;
//! use moodgarden::period::Period;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(GraphQlClient::new(ApiConfig::default())?);
//!
//!     let session = AuthSession::new(client.clone());
//!     session.login("ada@example.com", "secret").await?;
//!
//!     let watcher = GardenWatcher::new(client, session.handle(), WatchConfig::default());
//!     let mut watch = watcher.watch(Period::Day, Period::Day.current_key());
//!
//!     while let Some(snapshot) = watch.changed().await {
//!         println!("{}% {}", snapshot.percent(), snapshot.stage_label());
//!         if snapshot.is_stopped() {
//!             break;
//!         }
//!     }
//!
//!     if let Some(WatchEvent::Ready(garden)) = watch.try_next_event() {
//!         println!("Garden ready: {:?}", garden.image_url);
//!     }
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod entries;
pub mod garden;
pub mod graphql;
pub mod logging;
pub mod period;
pub mod session_store;
pub mod share;

// Re-export top-level types for convenience
pub use garden::{
    GardenSource, GardenStage, GardenWatcher, ProgressEstimator, StopReason, WatchConfig,
    WatchEvent, WatchHandle, WatchPhase, WatchSlot, WatchSnapshot,
};

pub use graphql::{DiaryEntry, Garden, GardenStatus, GraphQlClient, GraphQlError, User};

pub use auth::{AccountApi, AuthError, AuthHandle, AuthSession, AuthState, AuthStatus};

pub use entries::{EntryError, EntryFeed, EntryForm, JournalApi, SubmitOutcome};

pub use period::{Period, PeriodError};

pub use config::{Config, ConfigError};
