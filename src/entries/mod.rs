//! Diary entries
//!
//! Writing today's entry, kicking off its garden and paging through the
//! history feed:
//! - Validation of the entry form
//! - Submit flow (save entry, then request the day's garden)
//! - Paginated feed with id deduplication

mod feed;
mod submit;
mod validation;

pub use feed::{EntryFeed, FEED_PAGE_SIZE};
pub use submit::{submit_today, today_entry, SubmitOutcome};
pub use validation::{EntryForm, ValidEntry, MIN_TEXT_CHARS};

use async_trait::async_trait;

use crate::graphql::{DiaryEntry, Garden, GraphQlError, GraphQlResult};
use crate::period::Period;

/// Diary and garden operations offered by the API
#[async_trait]
pub trait JournalApi: Send + Sync {
    /// Save today's entry; the server picks the day key
    async fn create_diary_entry(&self, text: &str) -> GraphQlResult<DiaryEntry>;

    async fn diary_entry(&self, day_key: &str) -> GraphQlResult<Option<DiaryEntry>>;

    /// Newest first
    async fn paginated_diary_entries(&self, limit: u32, offset: u32)
        -> GraphQlResult<Vec<DiaryEntry>>;

    /// Day key of "today" under the user's timezone and rollover hour
    async fn current_diary_day_key(&self) -> GraphQlResult<String>;

    async fn request_generate_garden(
        &self,
        period: Period,
        period_key: Option<&str>,
    ) -> GraphQlResult<Option<Garden>>;

    async fn gardens_by_month(&self, month_key: &str) -> GraphQlResult<Vec<Garden>>;
}

/// Errors that can occur while writing or loading entries
#[derive(Debug, thiserror::Error)]
pub enum EntryError {
    #[error("Tell me a little more about your day.")]
    TextTooShort,

    #[error("Song link is not a valid URL: {0}")]
    InvalidSongUrl(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("API error: {0}")]
    Api(#[from] GraphQlError),
}

impl EntryError {
    /// Message shown to the user after a failed submit
    pub fn status_text(&self) -> &'static str {
        match self {
            EntryError::TextTooShort => "Tell me a little more about your day.",
            EntryError::InvalidSongUrl(_) => "That song link doesn't look like a URL.",
            EntryError::NotAuthenticated | EntryError::Api(_) => {
                "Something went wrong while saving or starting the garden."
            }
        }
    }
}
