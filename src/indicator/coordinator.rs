//! Visibility coordinator for the busy indicator.
//!
//! Counts overlapping operations and folds that count into one visible/hidden
//! signal. Two timers shape the signal: `show_delay` keeps the indicator down for
//! bursts that finish quickly, `min_duration` keeps it up for a minimum time once
//! it has appeared.
//!
//! ```text
//!            begin (delay > 0)                 delay elapses
//!   Idle ─────────────────────▶ AwaitingShow ──────────────▶ Visible
//!    ▲  ╲                            │ end, count 0              │ ▲
//!    │   ╲ begin (delay == 0)        ▼                           │ │ begin
//!    │    ╲──────────────────────▶ Idle        end, count 0,     │ │
//!    │                                          window open      ▼ │
//!    └─────────── hide timer elapses ──────────────────── AwaitingHide
//! ```

use super::config::IndicatorConfig;
use super::error::IndicatorError;
use super::guard::PendingGuard;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Observable state of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorPhase {
    /// Nothing pending, indicator hidden
    Idle,
    /// Operations pending, waiting out `show_delay`
    AwaitingShow,
    /// Indicator shown while operations are pending
    Visible,
    /// Nothing pending, indicator held up until `min_duration` has passed
    AwaitingHide,
}

/// Lifetime counters, mostly useful for reports and diagnosing unbalanced callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorMetrics {
    pub begins: u64,
    pub ends: u64,
    /// `end()` calls that arrived with nothing pending
    pub unmatched_ends: u64,
    pub shows: u64,
    pub hides: u64,
    /// Bursts that drained before `show_delay` elapsed
    pub suppressed_flickers: u64,
    #[serde(with = "humantime_serde")]
    pub visible_total: Duration,
}

/// Stand-in deadline for delays past what `Instant` can represent.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

fn deadline_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Show,
    Hide,
}

struct Timer {
    id: u64,
    task: JoinHandle<()>,
}

impl Timer {
    /// Aborting a task that already completed is a no-op.
    fn cancel(self) {
        self.task.abort();
    }
}

#[derive(Default)]
struct CoordinatorState {
    pending: usize,
    visible: bool,
    shown_at: Option<Instant>,
    show_timer: Option<Timer>,
    hide_timer: Option<Timer>,
    next_timer_id: u64,
    metrics: CoordinatorMetrics,
}

impl CoordinatorState {
    fn phase(&self) -> IndicatorPhase {
        match (self.visible, self.show_timer.is_some(), self.hide_timer.is_some()) {
            (false, true, _) => IndicatorPhase::AwaitingShow,
            (false, false, _) => IndicatorPhase::Idle,
            (true, _, true) => IndicatorPhase::AwaitingHide,
            (true, _, false) => IndicatorPhase::Visible,
        }
    }
}

struct Shared {
    config: IndicatorConfig,
    state: Mutex<CoordinatorState>,
    visible_tx: watch::Sender<bool>,
    runtime: Handle,
}

/// Process-wide busy-indicator coordinator.
///
/// Cloning is cheap and every clone drives the same state. `begin()` and `end()`
/// never block on I/O and never fail, so they are safe to call from any task or
/// from `Drop` impls.
#[derive(Clone)]
pub struct VisibilityCoordinator {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for VisibilityCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("VisibilityCoordinator")
            .field("config", &self.shared.config)
            .field("pending", &state.pending)
            .field("phase", &state.phase())
            .finish()
    }
}

impl VisibilityCoordinator {
    /// Create a coordinator whose timers run on the current tokio runtime.
    pub fn new(config: IndicatorConfig) -> Result<Self, IndicatorError> {
        let runtime = Handle::try_current()?;
        Ok(Self::with_runtime(config, runtime))
    }

    /// Create a coordinator whose timers run on `runtime`.
    ///
    /// `runtime` must outlive the coordinator for the delays to be honored. Once it
    /// has shut down, timers can no longer be armed and every deferred show or
    /// hide is applied immediately, with a `warn!` each time.
    pub fn with_runtime(config: IndicatorConfig, runtime: Handle) -> Self {
        debug!(?config, "VisibilityCoordinator::new");
        let (visible_tx, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                config,
                state: Mutex::new(CoordinatorState::default()),
                visible_tx,
                runtime,
            }),
        }
    }

    /// Signal the start of one operation.
    pub fn begin(&self) {
        let mut state = self.lock();
        state.pending += 1;
        state.metrics.begins += 1;
        debug!(pending = state.pending, "begin");

        // A new operation inside the min-duration window keeps the indicator up
        // without going through the show delay again.
        if let Some(timer) = state.hide_timer.take() {
            timer.cancel();
            debug!("hide cancelled, indicator stays visible");
            return;
        }
        if state.visible || state.show_timer.is_some() {
            return;
        }

        let delay = self.shared.config.show_delay;
        if delay.is_zero() {
            self.show(&mut state);
        } else {
            match self.arm(&mut state, TimerKind::Show, delay) {
                Some(timer) => {
                    state.show_timer = Some(timer);
                    debug!(?delay, "show deferred");
                }
                None => self.show(&mut state),
            }
        }
    }

    /// Signal the completion of one previously begun operation.
    ///
    /// Calls without a matching `begin()` are clamped at zero: counted, logged and
    /// otherwise ignored.
    pub fn end(&self) {
        let mut state = self.lock();
        if state.pending == 0 {
            state.metrics.unmatched_ends += 1;
            warn!(
                unmatched_ends = state.metrics.unmatched_ends,
                "end() without a matching begin(), ignoring"
            );
            return;
        }
        state.pending -= 1;
        state.metrics.ends += 1;
        debug!(pending = state.pending, "end");
        if state.pending > 0 {
            return;
        }

        if let Some(timer) = state.show_timer.take() {
            timer.cancel();
            state.metrics.suppressed_flickers += 1;
            debug!("drained before show delay, indicator never shown");
            return;
        }
        let Some(shown_at) = state.shown_at else {
            return;
        };

        let min_duration = self.shared.config.min_duration;
        let elapsed = Instant::now().saturating_duration_since(shown_at);
        if elapsed >= min_duration {
            self.hide(&mut state);
        } else {
            let remaining = min_duration - elapsed;
            match self.arm(&mut state, TimerKind::Hide, remaining) {
                Some(timer) => {
                    if let Some(stale) = state.hide_timer.replace(timer) {
                        stale.cancel();
                    }
                    debug!(?remaining, "hide deferred until min duration");
                }
                None => self.hide(&mut state),
            }
        }
    }

    /// Current visibility of the indicator.
    pub fn is_visible(&self) -> bool {
        *self.shared.visible_tx.borrow()
    }

    /// Subscribe to visibility changes.
    ///
    /// The value is replaced inside the same critical section as the state change,
    /// so a receiver's `borrow()` is current as soon as `begin()`/`end()` returns.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shared.visible_tx.subscribe()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending
    }

    pub fn phase(&self) -> IndicatorPhase {
        self.lock().phase()
    }

    pub fn metrics(&self) -> CoordinatorMetrics {
        self.lock().metrics.clone()
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.shared.config
    }

    /// Begin an operation that ends when the returned guard is dropped.
    pub fn track(&self) -> PendingGuard {
        PendingGuard::new(self.clone())
    }

    /// Track `operation` for as long as it runs.
    ///
    /// `begin()` happens immediately, before the future is first polled. `end()`
    /// happens exactly once when the future completes, panics, or is dropped
    /// unfinished.
    pub fn wrap<F>(&self, operation: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        let guard = self.track();
        async move {
            let _guard = guard;
            operation.await
        }
    }

    /// Wait until the indicator is hidden.
    ///
    /// Meant for shutdown paths once no operations remain; with work still pending
    /// this only waits for the current visible stretch to end.
    pub async fn settled(&self) {
        let mut rx = self.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|visible| !*visible).await;
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn a timer task. `None` when the runtime can no longer run it; the caller
    /// applies the transition right away instead of leaving it pending forever.
    fn arm(&self, state: &mut CoordinatorState, kind: TimerKind, delay: Duration) -> Option<Timer> {
        state.next_timer_id += 1;
        let id = state.next_timer_id;
        let deadline = deadline_after(delay);
        let shared = Arc::downgrade(&self.shared);
        let task = self.shared.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(shared) = shared.upgrade() {
                VisibilityCoordinator { shared }.fire(kind, id);
            }
        });
        // `fire` needs the state lock we are holding, so a live timer cannot have
        // finished yet. A finished one was cancelled by a shut-down runtime.
        if task.is_finished() {
            warn!(?kind, "timer runtime is shut down, applying transition now");
            return None;
        }
        Some(Timer { id, task })
    }

    fn fire(&self, kind: TimerKind, id: u64) {
        let mut state = self.lock();
        let slot = match kind {
            TimerKind::Show => &mut state.show_timer,
            TimerKind::Hide => &mut state.hide_timer,
        };
        // Lost a race with cancellation (or was replaced); nothing to do.
        if slot.as_ref().map(|t| t.id) != Some(id) {
            debug!(?kind, id, "stale timer ignored");
            return;
        }
        slot.take();
        match kind {
            TimerKind::Show => self.show(&mut state),
            TimerKind::Hide => self.hide(&mut state),
        }
    }

    fn show(&self, state: &mut CoordinatorState) {
        state.visible = true;
        state.shown_at = Some(Instant::now());
        state.metrics.shows += 1;
        self.shared.visible_tx.send_replace(true);
        debug!(pending = state.pending, "indicator shown");
    }

    fn hide(&self, state: &mut CoordinatorState) {
        if let Some(shown_at) = state.shown_at.take() {
            state.metrics.visible_total += Instant::now().saturating_duration_since(shown_at);
        }
        state.visible = false;
        state.metrics.hides += 1;
        self.shared.visible_tx.send_replace(false);
        debug!("indicator hidden");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator(min_ms: u64, delay_ms: u64) -> VisibilityCoordinator {
        VisibilityCoordinator::new(IndicatorConfig::new(
            Duration::from_millis(min_ms),
            Duration::from_millis(delay_ms),
        ))
        .unwrap()
    }

    /// Move the paused clock forward and let timer tasks run.
    async fn advance(ms: u64) {
        tokio::time::advance(Duration::from_millis(ms)).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let err = VisibilityCoordinator::new(IndicatorConfig::default()).unwrap_err();
        assert!(matches!(err, IndicatorError::NoRuntime(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_begin_shows_immediately_without_delay() {
        let c = coordinator(300, 0);
        assert_eq!(c.phase(), IndicatorPhase::Idle);

        c.begin();
        assert!(c.is_visible());
        assert_eq!(c.phase(), IndicatorPhase::Visible);
        assert_eq!(c.pending_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_after_min_duration_hides_immediately() {
        let c = coordinator(300, 0);
        c.begin();
        advance(400).await;

        c.end();
        assert!(!c.is_visible());
        assert_eq!(c.phase(), IndicatorPhase::Idle);

        let metrics = c.metrics();
        assert_eq!(metrics.shows, 1);
        assert_eq!(metrics.hides, 1);
        assert_eq!(metrics.visible_total, Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_inside_window_holds_until_min_duration() {
        let c = coordinator(300, 0);
        c.begin();
        advance(100).await;

        c.end();
        assert!(c.is_visible());
        assert_eq!(c.phase(), IndicatorPhase::AwaitingHide);

        advance(199).await;
        assert!(c.is_visible());

        advance(2).await;
        assert!(!c.is_visible());
        assert_eq!(c.phase(), IndicatorPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_delay_suppresses_short_operations() {
        let c = coordinator(300, 100);
        let rx = c.subscribe();

        c.begin();
        assert!(!c.is_visible());
        assert_eq!(c.phase(), IndicatorPhase::AwaitingShow);

        advance(50).await;
        c.end();
        assert_eq!(c.phase(), IndicatorPhase::Idle);

        advance(500).await;
        assert!(!c.is_visible());
        assert!(!rx.has_changed().unwrap());

        let metrics = c.metrics();
        assert_eq!(metrics.shows, 0);
        assert_eq!(metrics.suppressed_flickers, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_delay_elapses_then_min_duration_applies() {
        let c = coordinator(300, 100);
        c.begin();

        advance(99).await;
        assert!(!c.is_visible());

        advance(2).await;
        assert!(c.is_visible());
        assert_eq!(c.phase(), IndicatorPhase::Visible);

        c.end();
        assert_eq!(c.phase(), IndicatorPhase::AwaitingHide);

        advance(299).await;
        assert!(c.is_visible());
        advance(2).await;
        assert!(!c.is_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_begin_while_awaiting_show_keeps_original_deadline() {
        let c = coordinator(300, 100);
        c.begin();
        advance(50).await;
        c.begin();
        assert_eq!(c.phase(), IndicatorPhase::AwaitingShow);

        advance(51).await;
        assert!(c.is_visible());
        assert_eq!(c.pending_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_operations_keep_indicator_up() {
        let c = coordinator(300, 0);
        c.begin();
        c.begin();
        c.end();
        assert!(c.is_visible());
        assert_eq!(c.pending_count(), 1);
        assert_eq!(c.phase(), IndicatorPhase::Visible);

        c.end();
        assert_eq!(c.pending_count(), 0);
        assert_eq!(c.phase(), IndicatorPhase::AwaitingHide);
    }

    #[tokio::test(start_paused = true)]
    async fn test_begin_during_hide_window_reopens_without_delay() {
        let c = coordinator(300, 200);
        c.begin();
        advance(201).await;
        assert!(c.is_visible());

        c.end();
        assert_eq!(c.phase(), IndicatorPhase::AwaitingHide);

        advance(10).await;
        c.begin();
        assert!(c.is_visible());
        assert_eq!(c.phase(), IndicatorPhase::Visible);

        // The cancelled hide timer must not fire later.
        advance(1000).await;
        assert!(c.is_visible());
        assert_eq!(c.metrics().shows, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmatched_end_is_clamped() {
        let c = coordinator(300, 0);
        c.end();
        c.end();
        assert_eq!(c.pending_count(), 0);
        assert_eq!(c.phase(), IndicatorPhase::Idle);
        assert_eq!(c.metrics().unmatched_ends, 2);

        c.begin();
        assert!(c.is_visible());
        assert_eq!(c.pending_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_change_synchronously() {
        let c = coordinator(0, 0);
        let mut rx = c.subscribe();

        c.begin();
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());

        c.end();
        assert!(rx.has_changed().unwrap());
        assert!(!*rx.borrow_and_update());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_waits_for_hide() {
        let c = coordinator(300, 0);
        c.begin();
        c.end();

        let start = Instant::now();
        c.settled().await;
        assert!(!c.is_visible());
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_state() {
        let c = coordinator(300, 0);
        let other = c.clone();
        c.begin();
        assert!(other.is_visible());
        other.end();
        assert_eq!(c.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_show_delay_never_panics() {
        let c = VisibilityCoordinator::new(IndicatorConfig::new(Duration::MAX, Duration::MAX)).unwrap();
        c.begin();
        assert_eq!(c.phase(), IndicatorPhase::AwaitingShow);
        assert_eq!(c.pending_count(), 1);

        c.end();
        assert_eq!(c.phase(), IndicatorPhase::Idle);
        assert_eq!(c.metrics().suppressed_flickers, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_min_duration_never_panics() {
        let c = VisibilityCoordinator::new(IndicatorConfig::new(Duration::MAX, Duration::ZERO)).unwrap();
        c.begin();
        advance(50).await;
        c.end();
        assert_eq!(c.phase(), IndicatorPhase::AwaitingHide);

        c.begin();
        assert_eq!(c.phase(), IndicatorPhase::Visible);
        c.end();
        assert_eq!(c.phase(), IndicatorPhase::AwaitingHide);
        assert_eq!(c.pending_count(), 0);
    }

    #[test]
    fn test_deadline_after_saturates() {
        let rt = tokio::runtime::Builder::new_current_thread().enable_time().start_paused(true).build().unwrap();
        rt.block_on(async {
            let now = Instant::now();
            assert!(deadline_after(Duration::MAX) >= now + FAR_FUTURE);
            assert_eq!(deadline_after(Duration::ZERO).saturating_duration_since(now), Duration::ZERO);
        });
    }

    #[test]
    fn test_shut_down_runtime_applies_transitions_immediately() {
        let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
        let handle = rt.handle().clone();
        drop(rt);

        let c = VisibilityCoordinator::with_runtime(
            IndicatorConfig::new(Duration::from_millis(300), Duration::from_millis(100)),
            handle,
        );
        c.begin();
        assert!(c.is_visible());
        assert_eq!(c.phase(), IndicatorPhase::Visible);

        c.end();
        assert!(!c.is_visible());
        assert_eq!(c.phase(), IndicatorPhase::Idle);
        let metrics = c.metrics();
        assert_eq!((metrics.shows, metrics.hides), (1, 1));
    }
}
