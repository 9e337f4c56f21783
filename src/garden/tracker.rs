//! Per-job observation state
//!
//! `JobTracker` holds everything one watch knows about its job. It never
//! touches a timer itself; the watcher feeds it poll results and display
//! ticks, which keeps the state transitions testable without a runtime.

use tokio::time::Instant;

use super::progress::{GardenStage, ProgressEstimator};
use crate::graphql::{Garden, GardenStatus};
use crate::period::Period;

/// What changed after a poll result was applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Observation {
    /// First transition into READY for this job
    pub became_ready: bool,
    /// First transition into FAILED for this job
    pub became_failed: bool,
    /// The job is READY or FAILED
    pub terminal: bool,
}

/// State for one watched job
#[derive(Debug, Clone)]
pub struct JobTracker {
    period: Period,
    period_key: String,
    garden: Option<Garden>,
    status: Option<GardenStatus>,
    estimator: ProgressEstimator,
    ready_notified: bool,
    error: Option<String>,
    consecutive_errors: u32,
}

impl JobTracker {
    pub fn new(period: Period, period_key: impl Into<String>) -> Self {
        Self {
            period,
            period_key: period_key.into(),
            garden: None,
            status: None,
            estimator: ProgressEstimator::new(),
            ready_notified: false,
            error: None,
            consecutive_errors: 0,
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn period_key(&self) -> &str {
        &self.period_key
    }

    pub fn garden(&self) -> Option<&Garden> {
        self.garden.as_ref()
    }

    pub fn status(&self) -> Option<GardenStatus> {
        self.status
    }

    pub fn display_progress(&self) -> f64 {
        self.estimator.displayed()
    }

    pub fn percent(&self) -> u8 {
        self.estimator.percent()
    }

    pub fn stage(&self) -> GardenStage {
        GardenStage::from_percent(f64::from(self.percent()))
    }

    /// Message of the last failed poll, cleared by the next successful one
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    /// Whether display ticks should recompute the estimate
    pub fn needs_animation(&self) -> bool {
        self.status == Some(GardenStatus::Pending) && self.estimator.is_estimating()
    }

    /// Apply a poll result
    pub fn observe(&mut self, garden: Option<Garden>, now: Instant) -> Observation {
        self.error = None;
        self.consecutive_errors = 0;

        let previous = self.status;
        let status = garden.as_ref().map(|g| g.status);

        match (status, garden.as_ref().and_then(|g| g.progress)) {
            (Some(GardenStatus::Ready), _) => self.estimator.complete(),
            (Some(GardenStatus::Failed), _) => self.estimator.fail(),
            (Some(GardenStatus::Pending), Some(progress)) => {
                self.estimator.set_server_progress(progress)
            }
            (Some(GardenStatus::Pending), None) => {
                self.estimator.start(now);
                self.estimator.tick(now);
            }
            (None, _) => self.estimator.halt(),
        }

        let became_ready = status == Some(GardenStatus::Ready)
            && previous != Some(GardenStatus::Ready)
            && !self.ready_notified;
        if became_ready {
            self.ready_notified = true;
        }

        let became_failed =
            status == Some(GardenStatus::Failed) && previous != Some(GardenStatus::Failed);

        self.status = status;
        self.garden = garden;

        Observation {
            became_ready,
            became_failed,
            terminal: status.map(|s| s.is_terminal()).unwrap_or(false),
        }
    }

    /// Record a failed poll, returning the consecutive failure count
    pub fn record_error(&mut self, message: impl Into<String>) -> u32 {
        self.error = Some(message.into());
        self.consecutive_errors += 1;
        self.consecutive_errors
    }

    /// Display tick
    pub fn tick(&mut self, now: Instant) -> f64 {
        if self.needs_animation() {
            self.estimator.tick(now)
        } else {
            self.estimator.displayed()
        }
    }

    /// Stop the local estimate (watch ended without a terminal status)
    pub fn halt(&mut self) {
        self.estimator.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn garden(status: GardenStatus, progress: Option<f64>) -> Option<Garden> {
        Some(Garden {
            id: "g1".to_string(),
            status,
            period: Some(Period::Day),
            period_key: "2024-03-01".to_string(),
            image_url: None,
            public_id: None,
            share_url: None,
            summary: None,
            progress,
            updated_at: None,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_fires_once() {
        let mut tracker = JobTracker::new(Period::Day, "2024-03-01");
        let now = Instant::now();

        let sequence = [
            GardenStatus::Pending,
            GardenStatus::Pending,
            GardenStatus::Ready,
            GardenStatus::Ready,
            GardenStatus::Ready,
        ];

        let fired: Vec<bool> = sequence
            .iter()
            .map(|s| tracker.observe(garden(*s, None), now).became_ready)
            .collect();

        assert_eq!(fired, vec![false, false, true, false, false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_latch_survives_missing_job() {
        let mut tracker = JobTracker::new(Period::Day, "2024-03-01");
        let now = Instant::now();

        assert!(tracker.observe(garden(GardenStatus::Ready, None), now).became_ready);
        tracker.observe(None, now);
        assert!(!tracker.observe(garden(GardenStatus::Ready, None), now).became_ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_progress_precedence() {
        let mut tracker = JobTracker::new(Period::Day, "2024-03-01");
        let start = Instant::now();

        tracker.observe(garden(GardenStatus::Pending, None), start);
        assert!(tracker.needs_animation());

        let later = start + Duration::from_secs(20);
        tracker.observe(garden(GardenStatus::Pending, Some(40.0)), later);
        assert_eq!(tracker.display_progress(), 40.0);
        assert!(!tracker.needs_animation());

        // Ticks do not override server progress
        tracker.tick(later + Duration::from_secs(60));
        assert_eq!(tracker.display_progress(), 40.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_pinning() {
        let mut tracker = JobTracker::new(Period::Day, "2024-03-01");
        let now = Instant::now();

        tracker.observe(garden(GardenStatus::Pending, Some(60.0)), now);
        let obs = tracker.observe(garden(GardenStatus::Ready, None), now);
        assert!(obs.terminal);
        assert_eq!(tracker.percent(), 100);
        assert_eq!(tracker.stage(), GardenStage::FullyBloomed);
        tracker.tick(now + Duration::from_secs(5));
        assert_eq!(tracker.percent(), 100);

        let mut failed = JobTracker::new(Period::Day, "2024-03-02");
        failed.observe(garden(GardenStatus::Pending, None), now);
        failed.tick(now + Duration::from_secs(10));
        let obs = failed.observe(garden(GardenStatus::Failed, None), now + Duration::from_secs(11));
        assert!(obs.terminal && obs.became_failed);
        assert_eq!(failed.percent(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_reset_on_success() {
        let mut tracker = JobTracker::new(Period::Day, "2024-03-01");
        assert_eq!(tracker.record_error("timeout"), 1);
        assert_eq!(tracker.record_error("timeout"), 2);
        assert_eq!(tracker.error(), Some("timeout"));

        tracker.observe(garden(GardenStatus::Pending, None), Instant::now());
        assert_eq!(tracker.consecutive_errors(), 0);
        assert!(tracker.error().is_none());
    }
}
