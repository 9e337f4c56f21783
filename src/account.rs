//! Account settings
//!
//! Timezone and day rollover hour decide which day an entry belongs to on
//! the server. The catalogue here is what the client offers for selection.

use thiserror::Error;

use crate::auth::{AccountApi, AuthHandle};
use crate::graphql::{GraphQlError, UserSettings};

/// Named zones offered first
pub const COMMON_TIMEZONES: [&str; 12] = [
    "UTC",
    "Europe/Berlin",
    "Europe/London",
    "Europe/Paris",
    "America/New_York",
    "America/Chicago",
    "America/Denver",
    "America/Los_Angeles",
    "Asia/Tokyo",
    "Asia/Hong_Kong",
    "Asia/Singapore",
    "Australia/Sydney",
];

/// Standard offsets shown next to named zones
const LABEL_OFFSETS: [(&str, &str); 11] = [
    ("Europe/Berlin", "UTC+01:00"),
    ("Europe/London", "UTC+00:00"),
    ("Europe/Paris", "UTC+01:00"),
    ("America/New_York", "UTC-05:00"),
    ("America/Chicago", "UTC-06:00"),
    ("America/Denver", "UTC-07:00"),
    ("America/Los_Angeles", "UTC-08:00"),
    ("Asia/Tokyo", "UTC+09:00"),
    ("Asia/Hong_Kong", "UTC+08:00"),
    ("Asia/Singapore", "UTC+08:00"),
    ("Australia/Sydney", "UTC+10:00"),
];

/// Every selectable timezone: named zones, then `UTC-12:00` to `UTC+14:00`
pub fn all_timezones() -> Vec<String> {
    let offsets = (-12i32..=14).map(|offset| {
        let sign = if offset >= 0 { '+' } else { '-' };
        format!("UTC{}{:02}:00", sign, offset.abs())
    });

    COMMON_TIMEZONES
        .iter()
        .map(|tz| tz.to_string())
        .chain(offsets)
        .collect()
}

/// Whether `tz` is in the catalogue
pub fn is_known_timezone(tz: &str) -> bool {
    all_timezones().iter().any(|t| t == tz)
}

/// Display label, e.g. "Asia/Tokyo (UTC+09:00)"
pub fn timezone_label(tz: &str) -> String {
    match LABEL_OFFSETS.iter().find(|(name, _)| *name == tz) {
        Some((name, offset)) => format!("{} ({})", name, offset),
        None => tz.to_string(),
    }
}

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Timezone cannot be empty")]
    EmptyTimezone,

    #[error("Day rollover hour must be between 0 and 23, got {0}")]
    InvalidHour(i64),

    #[error("API error: {0}")]
    Api(#[from] GraphQlError),
}

/// Settings as entered by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    pub timezone: String,
    pub day_rollover_hour: i64,
}

impl Default for SettingsForm {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            day_rollover_hour: 0,
        }
    }
}

impl SettingsForm {
    /// Start from saved settings
    pub fn from_settings(settings: &UserSettings) -> Self {
        Self {
            timezone: settings.timezone.clone(),
            day_rollover_hour: i64::from(settings.day_rollover_hour),
        }
    }

    /// Trimmed timezone and hour as sent to the API
    pub fn validate(&self) -> Result<(String, u8), SettingsError> {
        let timezone = self.timezone.trim();
        if timezone.is_empty() {
            return Err(SettingsError::EmptyTimezone);
        }

        let hour = u8::try_from(self.day_rollover_hour)
            .ok()
            .filter(|h| *h <= 23)
            .ok_or(SettingsError::InvalidHour(self.day_rollover_hour))?;

        Ok((timezone.to_string(), hour))
    }
}

/// Save timezone and rollover hour
pub async fn update_settings(
    api: &dyn AccountApi,
    auth: &AuthHandle,
    form: &SettingsForm,
) -> Result<UserSettings, SettingsError> {
    let (timezone, hour) = form.validate()?;

    if !is_known_timezone(&timezone) {
        tracing::debug!(timezone = %timezone, "Saving timezone outside the catalogue");
    }

    match api.update_user_settings(&timezone, hour).await {
        Ok(settings) => {
            tracing::info!(timezone = %settings.timezone, day_rollover_hour = settings.day_rollover_hour, "Settings updated");
            Ok(settings)
        }
        Err(e) => {
            if e.is_unauthenticated() {
                auth.invalidate();
            }
            Err(e.into())
        }
    }
}
