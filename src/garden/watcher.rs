//! Garden Job Watcher
//!
//! Polls a garden generation job until it reaches a terminal state and
//! keeps a smoothed progress value for display.
//!
//! Each watch is one tokio task that owns two timers: the poll interval and
//! the display tick that drives the progress estimate. Both live inside a
//! single `select!` loop guarded by a `CancellationToken`, so every exit
//! (READY/FAILED, auth loss, cancellation, handle dropped) ends both at once.
//! The status query runs as its own task and is awaited as one more branch
//! of that loop, so frames and auth changes are still served while a request
//! is outstanding. The next query is only issued after the current one ends.
//!
//! ## States
//!
//! - `Idle`: waiting for the session to become authenticated
//! - `Watching`: polling, and estimating while PENDING without server progress
//! - `Stopped(reason)`: nothing scheduled any more

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

use super::progress::GardenStage;
use super::tracker::JobTracker;
use super::GardenSource;
use crate::auth::AuthHandle;
use crate::config::WatcherConfig;
use crate::graphql::{Garden, GardenStatus, GraphQlResult};
use crate::period::Period;

/// Timing for a watch
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Delay between status queries
    pub poll_interval: Duration,
    /// Delay between progress estimate recomputations
    pub frame_interval: Duration,
    /// Stop after this many failed queries in a row; `None` never stops
    pub max_consecutive_errors: Option<u32>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::from(&WatcherConfig::default())
    }
}

impl From<&WatcherConfig> for WatchConfig {
    fn from(config: &WatcherConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            frame_interval: Duration::from_millis(config.frame_interval_ms.max(1)),
            max_consecutive_errors: match config.max_consecutive_errors {
                0 => None,
                n => Some(n),
            },
        }
    }
}

/// Why a watch stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Ready,
    Failed,
    AuthLost,
    TooManyErrors,
    Cancelled,
}

/// Lifecycle of a watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchPhase {
    Idle,
    Watching,
    Stopped(StopReason),
}

/// Read-only view of a watch, republished after every change
#[derive(Debug, Clone)]
pub struct WatchSnapshot {
    pub period: Period,
    pub period_key: String,
    pub phase: WatchPhase,
    pub status: Option<GardenStatus>,
    pub garden: Option<Garden>,
    pub display_progress: f64,
    /// Last query error, cleared by the next successful poll
    pub error: Option<String>,
}

impl WatchSnapshot {
    fn from_tracker(tracker: &JobTracker, phase: WatchPhase) -> Self {
        Self {
            period: tracker.period(),
            period_key: tracker.period_key().to_string(),
            phase,
            status: tracker.status(),
            garden: tracker.garden().cloned(),
            display_progress: tracker.display_progress(),
            error: tracker.error().map(str::to_string),
        }
    }

    /// Displayed progress rounded to a whole percent
    pub fn percent(&self) -> u8 {
        self.display_progress.round().clamp(0.0, 100.0) as u8
    }

    pub fn stage(&self) -> GardenStage {
        GardenStage::from_percent(f64::from(self.percent()))
    }

    pub fn stage_label(&self) -> &'static str {
        self.stage().label()
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.phase, WatchPhase::Stopped(_))
    }
}

/// Notifications emitted by a watch
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// The job became READY; sent at most once per watch
    Ready(Garden),
    /// The job became FAILED
    Failed(Garden),
}

/// Spawns watches against one garden source and session
#[derive(Clone)]
pub struct GardenWatcher {
    source: Arc<dyn GardenSource>,
    auth: AuthHandle,
    config: WatchConfig,
}

impl GardenWatcher {
    pub fn new(source: Arc<dyn GardenSource>, auth: AuthHandle, config: WatchConfig) -> Self {
        Self {
            source,
            auth,
            config,
        }
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Start watching the job for `period_key`
    ///
    /// The watch runs until it stops on its own or the returned handle is
    /// cancelled or dropped.
    pub fn watch(&self, period: Period, period_key: impl Into<String>) -> WatchHandle {
        let period_key = period_key.into();
        let tracker = JobTracker::new(period, period_key.clone());

        let (snapshot_tx, snapshot_rx) =
            watch::channel(WatchSnapshot::from_tracker(&tracker, WatchPhase::Idle));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = WatchTask {
            source: Arc::clone(&self.source),
            auth: self.auth.clone(),
            config: self.config.clone(),
            tracker,
            cancel: cancel.clone(),
            snapshots: snapshot_tx,
            events: event_tx,
        };

        tracing::debug!(period = %period, period_key = %period_key, "Starting garden watch");
        let join = tokio::spawn(task.run());

        WatchHandle {
            period,
            period_key,
            snapshots: snapshot_rx,
            events: event_rx,
            cancel: cancel.clone(),
            join: Some(join),
            _guard: cancel.drop_guard(),
        }
    }
}

/// Owner of one running watch
///
/// Dropping the handle cancels the watch.
pub struct WatchHandle {
    period: Period,
    period_key: String,
    snapshots: watch::Receiver<WatchSnapshot>,
    events: mpsc::UnboundedReceiver<WatchEvent>,
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
    _guard: DropGuard,
}

impl WatchHandle {
    pub fn period(&self) -> Period {
        self.period
    }

    pub fn period_key(&self) -> &str {
        &self.period_key
    }

    /// Latest published state
    pub fn snapshot(&self) -> WatchSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Wait for the next published state
    ///
    /// Returns `None` once the watch task has exited and nothing new is left.
    pub async fn changed(&mut self) -> Option<WatchSnapshot> {
        self.snapshots.changed().await.ok()?;
        Some(self.snapshots.borrow_and_update().clone())
    }

    /// Next ready/failed notification
    pub async fn next_event(&mut self) -> Option<WatchEvent> {
        self.events.recv().await
    }

    /// Pending notification without waiting
    pub fn try_next_event(&mut self) -> Option<WatchEvent> {
        self.events.try_recv().ok()
    }

    /// Wait until the watch stops and return its final state
    pub async fn wait_stopped(&mut self) -> WatchSnapshot {
        loop {
            let snapshot = self.snapshots.borrow_and_update().clone();
            if snapshot.is_stopped() {
                return snapshot;
            }
            if self.snapshots.changed().await.is_err() {
                return self.snapshots.borrow().clone();
            }
        }
    }

    /// Request cancellation; takes effect before the task schedules more work
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait for the task to exit
    pub async fn stop(mut self) -> WatchSnapshot {
        self.cancel.cancel();
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                tracing::warn!(
                    period_key = %self.period_key,
                    error = %e,
                    "Garden watch task ended abnormally"
                );
            }
        }
        self.snapshots.borrow().clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map(|j| j.is_finished()).unwrap_or(true)
    }
}

/// Keeps at most one watch alive and swaps it when the key changes
///
/// The previous watch is fully stopped before the next one starts, so two
/// jobs never share timers, estimate origin or displayed progress.
pub struct WatchSlot {
    watcher: GardenWatcher,
    current: Option<WatchHandle>,
}

impl WatchSlot {
    pub fn new(watcher: GardenWatcher) -> Self {
        Self {
            watcher,
            current: None,
        }
    }

    /// Watch `period_key`, replacing any watch on a different key
    pub async fn set_key(&mut self, period: Period, period_key: &str) -> &mut WatchHandle {
        let same = self
            .current
            .as_ref()
            .map(|h| h.period == period && h.period_key == period_key)
            .unwrap_or(false);

        if !same {
            if let Some(previous) = self.current.take() {
                tracing::debug!(
                    from = %previous.period_key,
                    to = %period_key,
                    "Switching garden watch"
                );
                previous.stop().await;
            }
        }

        let watcher = &self.watcher;
        self.current
            .get_or_insert_with(|| watcher.watch(period, period_key))
    }

    /// Stop the current watch, if any
    pub async fn clear(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.stop().await;
        }
    }

    pub fn current(&self) -> Option<&WatchHandle> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut WatchHandle> {
        self.current.as_mut()
    }
}

/// State owned by a running watch task
struct WatchTask {
    source: Arc<dyn GardenSource>,
    auth: AuthHandle,
    config: WatchConfig,
    tracker: JobTracker,
    cancel: CancellationToken,
    snapshots: watch::Sender<WatchSnapshot>,
    events: mpsc::UnboundedSender<WatchEvent>,
}

impl WatchTask {
    async fn run(mut self) {
        let reason = match self.wait_for_auth().await {
            Some(reason) => reason,
            None => self.poll_loop().await,
        };

        self.tracker.halt();
        self.publish(WatchPhase::Stopped(reason));

        tracing::debug!(
            period_key = %self.tracker.period_key(),
            reason = ?reason,
            "Garden watch stopped"
        );
    }

    /// Idle until authenticated; `Some` if the watch ended while waiting
    async fn wait_for_auth(&mut self) -> Option<StopReason> {
        while !self.auth.is_authenticated() {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Some(StopReason::Cancelled),
                alive = self.auth.changed() => {
                    if !alive {
                        return Some(StopReason::AuthLost);
                    }
                }
            }
        }
        None
    }

    async fn poll_loop(&mut self) -> StopReason {
        self.publish(WatchPhase::Watching);

        let mut poll = tokio::time::interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut frame = tokio::time::interval(self.config.frame_interval);
        frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // At most one status query at a time; frames keep ticking meanwhile
        let mut in_flight: Option<JoinHandle<GraphQlResult<Option<Garden>>>> = None;

        let reason = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break StopReason::Cancelled,
                alive = self.auth.changed() => {
                    if !alive || !self.auth.is_authenticated() {
                        break StopReason::AuthLost;
                    }
                }
                joined = settle(&mut in_flight), if in_flight.is_some() => {
                    if let Some(reason) = self.on_result(joined) {
                        break reason;
                    }
                }
                _ = poll.tick(), if in_flight.is_none() => {
                    in_flight = Some(self.start_query());
                }
                _ = frame.tick(), if self.tracker.needs_animation() => {
                    self.tracker.tick(Instant::now());
                    self.publish(WatchPhase::Watching);
                }
            }
        };

        if let Some(query) = in_flight.take() {
            query.abort();
        }
        reason
    }

    fn start_query(&self) -> JoinHandle<GraphQlResult<Option<Garden>>> {
        let source = self.source.clone();
        let period = self.tracker.period();
        let key = self.tracker.period_key().to_string();
        tokio::spawn(async move { source.garden(period, &key).await })
    }

    /// Apply a finished status query; `Some` if the watch must stop
    fn on_result(
        &mut self,
        joined: Result<GraphQlResult<Option<Garden>>, JoinError>,
    ) -> Option<StopReason> {
        let key = self.tracker.period_key().to_string();

        // A result that arrives after sign-out is discarded
        if !self.auth.is_authenticated() {
            return Some(StopReason::AuthLost);
        }

        let result = match joined {
            Ok(result) => result,
            Err(e) => {
                let failures = self.tracker.record_error(e.to_string());
                tracing::error!(
                    period_key = %key,
                    failures,
                    error = %e,
                    "Garden status query task failed"
                );
                self.publish(WatchPhase::Watching);
                return self.error_cap_reached(failures);
            }
        };

        match result {
            Ok(garden) => {
                let observation = self.tracker.observe(garden, Instant::now());

                if let Some(garden) = self.tracker.garden() {
                    if observation.became_ready {
                        tracing::info!(period_key = %key, garden_id = %garden.id, "Garden ready");
                        let _ = self.events.send(WatchEvent::Ready(garden.clone()));
                    }
                    if observation.became_failed {
                        tracing::warn!(
                            period_key = %key,
                            garden_id = %garden.id,
                            "Garden generation failed"
                        );
                        let _ = self.events.send(WatchEvent::Failed(garden.clone()));
                    }
                }

                self.publish(WatchPhase::Watching);

                match self.tracker.status() {
                    Some(GardenStatus::Ready) => Some(StopReason::Ready),
                    Some(GardenStatus::Failed) => Some(StopReason::Failed),
                    _ => None,
                }
            }
            Err(e) if e.is_unauthenticated() => {
                self.auth.invalidate();
                Some(StopReason::AuthLost)
            }
            Err(e) => {
                let failures = self.tracker.record_error(e.to_string());
                tracing::warn!(
                    period_key = %key,
                    failures,
                    error = %e,
                    "Garden status query failed"
                );
                self.publish(WatchPhase::Watching);
                self.error_cap_reached(failures)
            }
        }
    }

    fn error_cap_reached(&self, failures: u32) -> Option<StopReason> {
        match self.config.max_consecutive_errors {
            Some(max) if failures >= max => Some(StopReason::TooManyErrors),
            _ => None,
        }
    }

    fn publish(&self, phase: WatchPhase) {
        self.snapshots
            .send_replace(WatchSnapshot::from_tracker(&self.tracker, phase));
    }
}

/// Wait for the in-flight query, clearing the slot once it finishes
async fn settle<T>(in_flight: &mut Option<JoinHandle<T>>) -> Result<T, JoinError> {
    match in_flight.as_mut() {
        Some(query) => {
            let joined = query.await;
            *in_flight = None;
            joined
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthState;
    use crate::garden::estimate_at;
    use crate::graphql::{GraphQlError, GraphQlResult, User};
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays scripted answers per key; the last answer repeats
    #[derive(Default)]
    struct ScriptedSource {
        scripts: Mutex<HashMap<String, VecDeque<Answer>>>,
        calls: AtomicUsize,
        calls_by_key: Mutex<HashMap<String, usize>>,
        delay: Duration,
    }

    #[derive(Clone)]
    enum Answer {
        Job(GardenStatus, Option<f64>),
        Missing,
        Error,
        Unauthenticated,
    }

    impl ScriptedSource {
        fn with(key: &str, answers: Vec<Answer>) -> Arc<Self> {
            let source = Self::default();
            source.script(key, answers);
            Arc::new(source)
        }

        /// Like `with`, but every answer takes `delay` to arrive
        fn slow(key: &str, answers: Vec<Answer>, delay: Duration) -> Arc<Self> {
            let source = Self {
                delay,
                ..Self::default()
            };
            source.script(key, answers);
            Arc::new(source)
        }

        fn script(&self, key: &str, answers: Vec<Answer>) {
            self.scripts
                .lock()
                .unwrap()
                .insert(key.to_string(), answers.into());
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn calls_for(&self, key: &str) -> usize {
            self.calls_by_key.lock().unwrap().get(key).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl GardenSource for ScriptedSource {
        async fn garden(&self, period: Period, period_key: &str) -> GraphQlResult<Option<Garden>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self
                .calls_by_key
                .lock()
                .unwrap()
                .entry(period_key.to_string())
                .or_default() += 1;

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let answer = {
                let mut scripts = self.scripts.lock().unwrap();
                let queue = scripts.entry(period_key.to_string()).or_default();
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            };

            match answer.unwrap_or(Answer::Missing) {
                Answer::Job(status, progress) => Ok(Some(Garden {
                    id: format!("garden-{period_key}"),
                    status,
                    period: Some(period),
                    period_key: period_key.to_string(),
                    image_url: None,
                    public_id: None,
                    share_url: None,
                    summary: None,
                    progress,
                    updated_at: None,
                })),
                Answer::Missing => Ok(None),
                Answer::Error => Err(GraphQlError::Timeout),
                Answer::Unauthenticated => Err(GraphQlError::Unauthenticated),
            }
        }
    }

    fn signed_in() -> AuthHandle {
        AuthHandle::new(AuthState::signed_in(User {
            id: "u1".to_string(),
            email: None,
            created_at: None,
            display_name: None,
        }))
    }

    fn config() -> WatchConfig {
        WatchConfig {
            poll_interval: Duration::from_millis(1500),
            frame_interval: Duration::from_millis(16),
            max_consecutive_errors: None,
        }
    }

    fn watcher(source: Arc<ScriptedSource>, auth: AuthHandle) -> GardenWatcher {
        GardenWatcher::new(source, auth, config())
    }

    use Answer::*;
    use GardenStatus::*;

    #[tokio::test(start_paused = true)]
    async fn test_stops_polling_after_ready() {
        let source = ScriptedSource::with(
            "2024-03-01",
            vec![Job(Pending, None), Job(Pending, None), Job(Ready, None)],
        );
        let mut handle = watcher(source.clone(), signed_in()).watch(Period::Day, "2024-03-01");

        let last = handle.wait_stopped().await;
        assert_eq!(last.phase, WatchPhase::Stopped(StopReason::Ready));
        assert_eq!(last.percent(), 100);
        assert_eq!(last.stage_label(), "Fully bloomed");
        assert_eq!(source.calls(), 3);

        // Ten more poll intervals: nothing new is issued
        tokio::time::sleep(Duration::from_millis(1500 * 10)).await;
        assert_eq!(source.calls(), 3);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_event_fires_once() {
        let source = ScriptedSource::with(
            "2024-03-01",
            vec![
                Job(Pending, None),
                Job(Pending, None),
                Job(Ready, None),
                Job(Ready, None),
                Job(Ready, None),
            ],
        );
        let mut handle = watcher(source, signed_in()).watch(Period::Day, "2024-03-01");
        handle.wait_stopped().await;

        let mut ready = 0;
        while let Some(event) = handle.try_next_event() {
            if let WatchEvent::Ready(garden) = event {
                assert_eq!(garden.period_key, "2024-03-01");
                ready += 1;
            }
        }
        assert_eq!(ready, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_pins_zero_and_stops() {
        let source =
            ScriptedSource::with("2024-03-01", vec![Job(Pending, None), Job(Failed, None)]);
        let mut handle = watcher(source.clone(), signed_in()).watch(Period::Day, "2024-03-01");

        let last = handle.wait_stopped().await;
        assert_eq!(last.phase, WatchPhase::Stopped(StopReason::Failed));
        assert_eq!(last.percent(), 0);
        assert!(matches!(handle.try_next_event(), Some(WatchEvent::Failed(_))));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_estimate_is_monotonic_while_pending() {
        let source = ScriptedSource::with("2024-03-01", vec![Job(Pending, None)]);
        let mut handle = watcher(source, signed_in()).watch(Period::Day, "2024-03-01");

        let start = Instant::now();
        let mut last = 0.0;
        while start.elapsed() < Duration::from_secs(35) {
            let snapshot = handle.changed().await.unwrap();
            assert!(snapshot.display_progress >= last);
            assert!(snapshot.display_progress <= 90.0 + 1e-9);
            last = snapshot.display_progress;
        }
        assert!((last - 90.0).abs() < 1e-6);
        assert!(!handle.snapshot().is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_estimate_reaches_seventy_after_eight_seconds() {
        let source = ScriptedSource::with("2024-03-01", vec![Job(Pending, None)]);
        let handle = watcher(source, signed_in()).watch(Period::Day, "2024-03-01");

        tokio::time::sleep(Duration::from_millis(8_100)).await;
        let snapshot = handle.snapshot();
        assert!(snapshot.display_progress >= 69.9, "got {}", snapshot.display_progress);
        assert!(snapshot.display_progress < 71.0);
        assert_eq!(snapshot.stage_label(), "Growing strong");
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_progress_wins() {
        let source = ScriptedSource::with("2024-03-01", vec![Job(Pending, Some(40.0))]);
        let handle = watcher(source, signed_in()).watch(Period::Day, "2024-03-01");

        tokio::time::sleep(Duration::from_secs(20)).await;
        let snapshot = handle.snapshot();
        assert_eq!(snapshot.display_progress, 40.0);
        assert_eq!(snapshot.stage_label(), "Sprouting");
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_loss_stops_silently() {
        let auth = signed_in();
        let source = ScriptedSource::with("2024-03-01", vec![Job(Pending, None)]);
        let mut handle = watcher(source.clone(), auth.clone()).watch(Period::Day, "2024-03-01");

        tokio::time::sleep(Duration::from_millis(3_100)).await;
        let before = source.calls();
        assert!(before >= 2);

        auth.invalidate();
        let last = handle.wait_stopped().await;
        assert_eq!(last.phase, WatchPhase::Stopped(StopReason::AuthLost));
        assert!(last.error.is_none());

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(source.calls(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_estimate_advances_during_slow_query() {
        // Each answer takes 1s: PENDING lands at 1.0s, the next query runs 1.5s..2.5s
        let source = ScriptedSource::slow(
            "2024-03-01",
            vec![Job(Pending, None)],
            Duration::from_secs(1),
        );
        let handle = watcher(source.clone(), signed_in()).watch(Period::Day, "2024-03-01");

        tokio::time::sleep(Duration::from_millis(2_400)).await;
        assert_eq!(source.calls(), 2);

        let shown = handle.snapshot().display_progress;
        let expected = estimate_at(Duration::from_millis(1_400));
        assert!(
            (shown - expected).abs() < 1.0,
            "shown {shown}, expected about {expected}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_loss_during_slow_query_stops_at_once() {
        let auth = signed_in();
        let source = ScriptedSource::slow(
            "2024-03-01",
            vec![Job(Pending, None)],
            Duration::from_secs(5),
        );
        let mut handle = watcher(source.clone(), auth.clone()).watch(Period::Day, "2024-03-01");

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.calls(), 1);

        let invalidated_at = Instant::now();
        auth.invalidate();
        let last = handle.wait_stopped().await;
        assert_eq!(last.phase, WatchPhase::Stopped(StopReason::AuthLost));
        assert!(last.status.is_none());
        assert!(invalidated_at.elapsed() < Duration::from_millis(100));

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_slow_query_stops_at_once() {
        let source = ScriptedSource::slow(
            "2024-03-01",
            vec![Job(Pending, None)],
            Duration::from_secs(5),
        );
        let handle = watcher(source.clone(), signed_in()).watch(Period::Day, "2024-03-01");

        tokio::time::sleep(Duration::from_millis(100)).await;
        let cancelled_at = Instant::now();
        let last = handle.stop().await;
        assert_eq!(last.phase, WatchPhase::Stopped(StopReason::Cancelled));
        assert!(cancelled_at.elapsed() < Duration::from_millis(100));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_until_authenticated() {
        let auth = AuthHandle::new(AuthState::signed_out());
        let source = ScriptedSource::with("2024-03-01", vec![Job(Pending, None)]);
        let handle = watcher(source.clone(), auth.clone()).watch(Period::Day, "2024-03-01");

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls(), 0);
        assert_eq!(handle.snapshot().phase, WatchPhase::Idle);

        auth.replace(signed_in().state());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(handle.snapshot().phase, WatchPhase::Watching);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthenticated_response_invalidates_session() {
        let auth = signed_in();
        let source = ScriptedSource::with("2024-03-01", vec![Job(Pending, None), Unauthenticated]);
        let mut handle = watcher(source, auth.clone()).watch(Period::Day, "2024-03-01");

        let last = handle.wait_stopped().await;
        assert_eq!(last.phase, WatchPhase::Stopped(StopReason::AuthLost));
        assert!(!auth.is_authenticated());
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_surface_but_polling_continues() {
        let source = ScriptedSource::with(
            "2024-03-01",
            vec![Error, Error, Job(Pending, None), Job(Ready, None)],
        );
        let mut handle = watcher(source.clone(), signed_in()).watch(Period::Day, "2024-03-01");

        let first = loop {
            let snapshot = handle.changed().await.unwrap();
            if snapshot.error.is_some() {
                break snapshot;
            }
        };
        assert_eq!(first.phase, WatchPhase::Watching);

        let last = handle.wait_stopped().await;
        assert_eq!(last.phase, WatchPhase::Stopped(StopReason::Ready));
        assert!(last.error.is_none());
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_cap() {
        let source = ScriptedSource::with("2024-03-01", vec![Error]);
        let config = WatchConfig {
            max_consecutive_errors: Some(3),
            ..config()
        };
        let mut handle = GardenWatcher::new(source.clone(), signed_in(), config)
            .watch(Period::Day, "2024-03-01");

        let last = handle.wait_stopped().await;
        assert_eq!(last.phase, WatchPhase::Stopped(StopReason::TooManyErrors));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_job_keeps_polling() {
        let source = ScriptedSource::with("2024-03-01", vec![Missing]);
        let handle = watcher(source.clone(), signed_in()).watch(Period::Day, "2024-03-01");

        tokio::time::sleep(Duration::from_millis(1500 * 3 + 100)).await;
        let snapshot = handle.snapshot();
        assert!(snapshot.garden.is_none());
        assert_eq!(snapshot.percent(), 0);
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let source = ScriptedSource::with("2024-03-01", vec![Job(Pending, None)]);
        let handle = watcher(source.clone(), signed_in()).watch(Period::Day, "2024-03-01");

        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let after_drop = source.calls();

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(source.calls(), after_drop);
    }

    #[tokio::test(start_paused = true)]
    async fn test_key_change_resets_progress() {
        let source = Arc::new(ScriptedSource::default());
        source.script("2024-03-01", vec![Job(Pending, None)]);
        source.script("2024-03-02", vec![Job(Pending, None)]);

        let mut slot = WatchSlot::new(watcher(source.clone(), signed_in()));
        slot.set_key(Period::Day, "2024-03-01").await;

        tokio::time::sleep(Duration::from_secs(4)).await;
        let first = slot.current().unwrap().snapshot();
        assert!(first.display_progress >= 50.0, "got {}", first.display_progress);

        let handle = slot.set_key(Period::Day, "2024-03-02").await;
        let fresh = handle.snapshot();
        assert_eq!(fresh.period_key, "2024-03-02");
        assert_eq!(fresh.display_progress, 0.0);

        let next = handle.changed().await.unwrap();
        assert!(next.display_progress < 5.0, "got {}", next.display_progress);

        // The first job is no longer polled
        let calls_a = source.calls_for("2024-03-01");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls_for("2024-03-01"), calls_a);
        assert!(source.calls_for("2024-03-02") > 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_key_keeps_watch() {
        let source = ScriptedSource::with("2024-03-01", vec![Job(Pending, None)]);
        let mut slot = WatchSlot::new(watcher(source.clone(), signed_in()));

        slot.set_key(Period::Day, "2024-03-01").await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        let progress = slot.current().unwrap().snapshot().display_progress;

        let handle = slot.set_key(Period::Day, "2024-03-01").await;
        assert!(handle.snapshot().display_progress >= progress);
        assert!(!handle.is_finished());
    }

    #[test]
    fn test_config_conversion() {
        let config = WatchConfig::from(&WatcherConfig {
            poll_interval_ms: 3000,
            frame_interval_ms: 16,
            max_consecutive_errors: 0,
        });
        assert_eq!(config.poll_interval, Duration::from_millis(3000));
        assert!(config.max_consecutive_errors.is_none());
    }
}
