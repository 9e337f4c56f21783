//! Garden generation progress
//!
//! The API only sometimes reports progress for a pending garden. When it
//! does not, the client shows an estimate instead:
//!
//! - 0–8 s: cubic ease-out from 0% to 70%
//! - 8–30 s: linear drift from 70% to 90%
//! - after 30 s: hold at 90% until the job finishes
//!
//! The displayed value never moves backwards while a job is pending.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

const EASE_OUT_SECS: f64 = 8.0;
const DRIFT_END_SECS: f64 = 30.0;
const EASE_OUT_PERCENT: f64 = 70.0;
const HOLD_PERCENT: f64 = 90.0;

/// Highest percentage shown before the job is READY
pub const MAX_PENDING_PERCENT: f64 = 99.0;

/// Estimated completion after `elapsed` time pending, in percent
pub fn estimate_at(elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();

    if secs <= EASE_OUT_SECS {
        let t = secs / EASE_OUT_SECS;
        EASE_OUT_PERCENT * (1.0 - (1.0 - t).powi(3))
    } else if secs <= DRIFT_END_SECS {
        let t = (secs - EASE_OUT_SECS) / (DRIFT_END_SECS - EASE_OUT_SECS);
        EASE_OUT_PERCENT + (HOLD_PERCENT - EASE_OUT_PERCENT) * t
    } else {
        HOLD_PERCENT
    }
}

/// Growth stage shown next to the progress bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GardenStage {
    SeedsPlanted,
    Sprouting,
    GrowingStrong,
    AlmostBlooming,
    FullyBloomed,
}

impl GardenStage {
    /// Stage for a displayed percentage
    pub fn from_percent(percent: f64) -> Self {
        if percent < 20.0 {
            GardenStage::SeedsPlanted
        } else if percent < 50.0 {
            GardenStage::Sprouting
        } else if percent < 80.0 {
            GardenStage::GrowingStrong
        } else if percent < 100.0 {
            GardenStage::AlmostBlooming
        } else {
            GardenStage::FullyBloomed
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GardenStage::SeedsPlanted => "Seeds planted",
            GardenStage::Sprouting => "Sprouting",
            GardenStage::GrowingStrong => "Growing strong",
            GardenStage::AlmostBlooming => "Almost blooming",
            GardenStage::FullyBloomed => "Fully bloomed",
        }
    }
}

impl fmt::Display for GardenStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Label for a displayed percentage
pub fn stage_label(percent: f64) -> &'static str {
    GardenStage::from_percent(percent).label()
}

/// Client-side progress for one watched job
///
/// `origin` is when PENDING was first seen without server progress. It is
/// `None` whenever the local estimate is not running.
#[derive(Debug, Clone, Default)]
pub struct ProgressEstimator {
    origin: Option<Instant>,
    displayed: f64,
}

impl ProgressEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently displayed progress in [0, 100]
    pub fn displayed(&self) -> f64 {
        self.displayed
    }

    /// Displayed progress rounded to a whole percent
    pub fn percent(&self) -> u8 {
        self.displayed.round().clamp(0.0, 100.0) as u8
    }

    /// Whether the local estimate is running
    pub fn is_estimating(&self) -> bool {
        self.origin.is_some()
    }

    pub fn origin(&self) -> Option<Instant> {
        self.origin
    }

    /// Start estimating from `now` unless already running
    pub fn start(&mut self, now: Instant) {
        if self.origin.is_none() {
            self.origin = Some(now);
        }
    }

    /// Recompute the estimate; never decreases the displayed value
    pub fn tick(&mut self, now: Instant) -> f64 {
        if let Some(origin) = self.origin {
            let estimate = estimate_at(now.saturating_duration_since(origin));
            self.displayed = self.displayed.max(estimate).min(MAX_PENDING_PERCENT);
        }
        self.displayed
    }

    /// Server-reported progress wins over the estimate and stops it
    pub fn set_server_progress(&mut self, progress: f64) {
        self.origin = None;
        self.displayed = if progress.is_finite() {
            progress.clamp(0.0, MAX_PENDING_PERCENT)
        } else {
            0.0
        };
    }

    /// Pin to 100% and stop estimating
    pub fn complete(&mut self) {
        self.origin = None;
        self.displayed = 100.0;
    }

    /// Pin to 0% and stop estimating
    pub fn fail(&mut self) {
        self.origin = None;
        self.displayed = 0.0;
    }

    /// Stop estimating without touching the displayed value
    pub fn halt(&mut self) {
        self.origin = None;
    }
}
