//! Garden generation jobs
//!
//! A garden is generated asynchronously after the user asks for it. This
//! module follows one job from PENDING to READY or FAILED.
//!
//! - **Progress**: estimate curve and stage labels
//! - **Tracker**: per-job observation state, ready latch
//! - **Watcher**: poll/animation task with cancellation and key switching

pub mod progress;
pub mod tracker;
pub mod watcher;

pub use progress::{estimate_at, stage_label, GardenStage, ProgressEstimator};
pub use tracker::{JobTracker, Observation};
pub use watcher::{
    GardenWatcher, StopReason, WatchConfig, WatchEvent, WatchHandle, WatchPhase, WatchSlot,
    WatchSnapshot,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::graphql::{Garden, GardenStatus, GraphQlResult};
use crate::period::Period;

/// Where garden status comes from
#[async_trait]
pub trait GardenSource: Send + Sync {
    /// Current garden for the period key; `None` if no job exists yet
    async fn garden(&self, period: Period, period_key: &str) -> GraphQlResult<Option<Garden>>;
}

/// Minimal view of a job, as printed by the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GardenJob {
    pub id: String,
    pub status: GardenStatus,
    pub progress: Option<f64>,
    pub period_key: String,
}

impl From<&Garden> for GardenJob {
    fn from(garden: &Garden) -> Self {
        Self {
            id: garden.id.clone(),
            status: garden.status,
            progress: garden.progress,
            period_key: garden.period_key.clone(),
        }
    }
}
