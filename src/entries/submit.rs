//! Today's entry submit flow

use super::{EntryError, EntryForm, JournalApi};
use crate::graphql::DiaryEntry;
use crate::period::Period;

/// Result of a submit that reached the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The entry was saved and a garden job is running
    Started { garden_id: String, period_key: String },
    /// The entry was saved but no garden job came back
    NotStarted,
}

impl SubmitOutcome {
    pub fn status_text(&self) -> &'static str {
        match self {
            SubmitOutcome::Started { .. } => "Generating your mood garden…",
            SubmitOutcome::NotStarted => "Could not start garden job (no id returned).",
        }
    }
}

/// Save today's entry and request the day's garden
///
/// The entry is saved first. The garden request uses the server's current
/// day key, which follows the user's timezone and rollover hour.
pub async fn submit_today(
    api: &dyn JournalApi,
    form: &EntryForm,
) -> Result<SubmitOutcome, EntryError> {
    let entry = form.validate()?;

    let saved = api.create_diary_entry(&entry.text).await?;
    tracing::debug!(entry_id = %saved.id, "Diary entry saved");

    let day_key = api.current_diary_day_key().await?;

    let garden = api
        .request_generate_garden(Period::Day, Some(&day_key))
        .await?;

    match garden {
        Some(garden) if !garden.id.is_empty() => {
            tracing::info!(garden_id = %garden.id, period_key = %garden.period_key, "Garden generation requested");
            let period_key = if garden.period_key.is_empty() {
                day_key
            } else {
                garden.period_key
            };
            Ok(SubmitOutcome::Started {
                garden_id: garden.id,
                period_key,
            })
        }
        _ => {
            tracing::warn!(day_key = %day_key, "Garden request returned no job");
            Ok(SubmitOutcome::NotStarted)
        }
    }
}

/// Today's entry, if one was already written
pub async fn today_entry(
    api: &dyn JournalApi,
    day_key: &str,
) -> Result<Option<DiaryEntry>, EntryError> {
    Ok(api.diary_entry(day_key).await?)
}
