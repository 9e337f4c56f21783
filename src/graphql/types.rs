//! GraphQL object types returned by the Mood Gardens API

use crate::period::Period;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server-side state of a garden generation job
///
/// Transitions are monotonic: once READY or FAILED a job never returns
/// to PENDING.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GardenStatus {
    Pending,
    Ready,
    Failed,
}

impl GardenStatus {
    /// READY and FAILED end a job's lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, GardenStatus::Ready | GardenStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GardenStatus::Pending => "PENDING",
            GardenStatus::Ready => "READY",
            GardenStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for GardenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A generated (or generating) garden image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Garden {
    pub id: String,
    pub status: GardenStatus,
    #[serde(default)]
    pub period: Option<Period>,
    pub period_key: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Cloudinary public id of the image
    #[serde(default)]
    pub public_id: Option<String>,
    #[serde(default)]
    pub share_url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Server-reported completion in [0, 100]
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Signed-in account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Per-user day boundary settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub id: String,
    pub timezone: String,
    pub day_rollover_hour: u8,
}

/// A diary entry, optionally with the garden generated for its day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub id: String,
    #[serde(default)]
    pub day_key: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub garden: Option<Garden>,
}
