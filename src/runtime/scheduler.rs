//! Adaptive polling scheduler
//!
//! Three independent periodic activities run as tokio tasks while the
//! session is up:
//!
//! - *dispatch* drains the event log and activity rates and ships the
//!   batch; its period adapts between an active and an idle cadence,
//! - *ping* asks the overseer for decided actions on a fixed period,
//! - *cleanup* evicts stale activity samples on a fixed period.
//!
//! Quiet stretches (consecutive batches with nothing significant) drop
//! dispatch to the idle cadence; a significant event snaps it back and
//! restarts the timer. Stopping the session cancels all three tasks; no
//! new firing happens afterwards, and results of an in-flight poll are
//! discarded.

use crate::actions::DispatchQueue;
use crate::core::config::WardenConfig;
use crate::core::error::{Result, WardenError};
use crate::core::types::now_millis;
use crate::events::{EventLog, GameEvent};
use crate::overseer::OverseerBridge;
use crate::runtime::PositionSource;
use crate::stats::{ActivityMetric, ActivityStats};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Created but not started; producers and drains fail fast
    Idle,
    /// All three activities live
    Running,
    /// Terminal; a stopped scheduler cannot be restarted
    Stopped,
}

impl SessionPhase {
    /// Short name for state errors and logs
    pub fn describe(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Running => "running",
            SessionPhase::Stopped => "stopped",
        }
    }
}

/// Dispatch cadence while running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Players are doing things worth reporting promptly
    Active,
    /// Nothing significant lately; report rarely
    Idle,
}

#[derive(Debug)]
struct SchedulerCore {
    phase: SessionPhase,
    mode: DispatchMode,
    empty_batches: u32,
    last_dispatch: Option<Instant>,
}

/// Owns the three periodic activities and the adaptive-cadence state
pub struct PollingScheduler {
    cfg: WardenConfig,
    events: Arc<EventLog>,
    stats: Arc<ActivityStats>,
    queue: Arc<DispatchQueue>,
    bridge: Arc<OverseerBridge>,
    positions: Arc<dyn PositionSource>,
    core: Mutex<SchedulerCore>,
    /// Current dispatch period; the dispatch task restarts its timer on
    /// every change
    interval_tx: watch::Sender<Duration>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl PollingScheduler {
    pub fn new(
        cfg: WardenConfig,
        events: Arc<EventLog>,
        stats: Arc<ActivityStats>,
        queue: Arc<DispatchQueue>,
        bridge: Arc<OverseerBridge>,
        positions: Arc<dyn PositionSource>,
    ) -> Self {
        let (interval_tx, _) = watch::channel(cfg.active_dispatch_interval);
        Self {
            cfg,
            events,
            stats,
            queue,
            bridge,
            positions,
            core: Mutex::new(SchedulerCore {
                phase: SessionPhase::Idle,
                mode: DispatchMode::Active,
                empty_batches: 0,
                last_dispatch: None,
            }),
            interval_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    fn core(&self) -> MutexGuard<'_, SchedulerCore> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> SessionPhase {
        self.core().phase
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.core().mode
    }

    /// The dispatch period currently in effect
    pub fn current_interval(&self) -> Duration {
        *self.interval_tx.borrow()
    }

    /// Consecutive batches with nothing significant in them
    pub fn empty_batches(&self) -> u32 {
        self.core().empty_batches
    }

    /// When the last non-empty batch went out, if one has
    pub fn last_dispatch(&self) -> Option<Instant> {
        self.core().last_dispatch
    }

    /// Begin the three periodic activities; must run inside a tokio runtime
    pub fn start(self: &Arc<Self>) -> Result<()> {
        {
            let mut core = self.core();
            match core.phase {
                SessionPhase::Idle => {}
                SessionPhase::Running => return Err(WardenError::AlreadyStarted),
                phase => return Err(WardenError::NotRunning(phase.describe())),
            }
            core.phase = SessionPhase::Running;
            core.mode = DispatchMode::Active;
            core.empty_batches = 0;
        }
        self.interval_tx
            .send_replace(self.cfg.active_dispatch_interval);

        info!(
            dispatch_secs = self.cfg.active_dispatch_interval.as_secs(),
            ping_secs = self.cfg.ping_interval.as_secs(),
            cleanup_secs = self.cfg.cleanup_interval.as_secs(),
            "polling scheduler started"
        );

        let mut tasks = self.tasks();
        tasks.push(tokio::spawn(Arc::clone(self).dispatch_loop()));
        tasks.push(tokio::spawn(Arc::clone(self).ping_loop()));
        tasks.push(tokio::spawn(Arc::clone(self).cleanup_loop()));
        Ok(())
    }

    /// Cancel all three activities; terminal
    ///
    /// Cancellation is synchronous with respect to new timer firings: once
    /// this returns, no further callback starts.
    pub fn stop(&self) -> Result<()> {
        {
            let mut core = self.core();
            match core.phase {
                SessionPhase::Running => {}
                phase => return Err(WardenError::NotRunning(phase.describe())),
            }
            core.phase = SessionPhase::Stopped;
        }

        for task in self.tasks().drain(..) {
            task.abort();
        }
        info!("polling scheduler stopped");
        Ok(())
    }

    /// Snap back to the active cadence and clear the quiet-streak counter
    ///
    /// Called when a significant event is recorded, so a chat message in a
    /// sleepy session is reported within the active interval instead of
    /// the idle one.
    pub fn force_active(&self) {
        let mut core = self.core();
        if core.phase != SessionPhase::Running {
            return;
        }
        core.empty_batches = 0;
        if core.mode != DispatchMode::Active {
            core.mode = DispatchMode::Active;
            info!("significant event, switching to active polling");
            self.interval_tx
                .send_replace(self.cfg.active_dispatch_interval);
        }
    }

    async fn dispatch_loop(self: Arc<Self>) {
        let mut interval_rx = self.interval_tx.subscribe();
        loop {
            let period = *interval_rx.borrow_and_update();
            tokio::select! {
                _ = tokio::time::sleep(period) => {
                    if self.phase() != SessionPhase::Running {
                        break;
                    }
                    self.dispatch_tick().await;
                }
                changed = interval_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    // Period changed mid-wait: restart the timer with the
                    // new period.
                    continue;
                }
            }
        }
    }

    async fn ping_loop(self: Arc<Self>) {
        let mut ticker = interval_at(
            Instant::now() + self.cfg.ping_interval,
            self.cfg.ping_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.phase() != SessionPhase::Running {
                break;
            }

            let actions = self.bridge.poll().await;

            // A stop can land while the poll is in flight; its result must
            // not reach the queue.
            if self.phase() != SessionPhase::Running {
                break;
            }
            if !actions.is_empty() {
                self.queue.enqueue_all(actions);
                debug!(depth = self.queue.len(), "actions queued for replay");
            }
        }
    }

    async fn cleanup_loop(self: Arc<Self>) {
        let mut ticker = interval_at(
            Instant::now() + self.cfg.cleanup_interval,
            self.cfg.cleanup_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if self.phase() != SessionPhase::Running {
                break;
            }
            self.stats.evict_stale(now_millis());
        }
    }

    async fn dispatch_tick(&self) {
        let events = self.events.drain();
        let now = now_millis();
        let rates: Vec<_> = ActivityMetric::ALL
            .iter()
            .map(|&metric| (metric, self.stats.all_rates(metric, now)))
            .collect();

        self.adjust_cadence(&events);

        if events.is_empty() && rates.iter().all(|(_, r)| r.is_empty()) {
            debug!("nothing to report this cycle");
            return;
        }

        let positions = self.positions.player_positions();
        self.bridge.notify(&events, &rates, &positions).await;
        self.core().last_dispatch = Some(Instant::now());
    }

    /// The adaptive part: quiet streaks slow dispatch down, bursts and
    /// significant events speed it back up
    fn adjust_cadence(&self, events: &[GameEvent]) {
        let significant = events.iter().any(|e| e.kind.is_significant());

        let mut core = self.core();
        if core.phase != SessionPhase::Running {
            return;
        }

        if events.is_empty() || !significant {
            core.empty_batches += 1;
        } else {
            core.empty_batches = 0;
        }

        let target = if core.empty_batches >= self.cfg.empty_batch_threshold {
            DispatchMode::Idle
        } else if significant || events.len() > self.cfg.busy_batch_len {
            DispatchMode::Active
        } else {
            core.mode
        };

        if target != core.mode {
            core.mode = target;
            let period = match target {
                DispatchMode::Active => self.cfg.active_dispatch_interval,
                DispatchMode::Idle => self.cfg.idle_dispatch_interval,
            };
            info!(
                interval_secs = period.as_secs(),
                mode = ?target,
                "adjusting dispatch polling interval"
            );
            self.interval_tx.send_replace(period);
        }
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        // Tasks hold an Arc to the scheduler, so by the time drop runs the
        // task vector is either empty or the runtime is tearing down; abort
        // anyway to be deterministic in tests.
        for task in self.tasks().drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BlockPos, PlayerId};
    use crate::events::EventKind;
    use crate::overseer::{ContextBudget, MockChatClient, OverseerBridge};
    use ahash::AHashMap;

    struct NoPositions;

    impl PositionSource for NoPositions {
        fn player_positions(&self) -> AHashMap<PlayerId, BlockPos> {
            AHashMap::new()
        }
    }

    fn scheduler(cfg: WardenConfig) -> Arc<PollingScheduler> {
        let client = Arc::new(MockChatClient::new());
        let bridge = Arc::new(OverseerBridge::new(
            client,
            ContextBudget::new(cfg.chars_per_token, cfg.token_refresh_threshold),
        ));
        Arc::new(PollingScheduler::new(
            cfg,
            Arc::new(EventLog::new()),
            Arc::new(ActivityStats::new(60_000, 200)),
            Arc::new(DispatchQueue::new()),
            bridge,
            Arc::new(NoPositions),
        ))
    }

    fn chat_event() -> GameEvent {
        GameEvent::new(
            PlayerId::new(),
            BlockPos::new(0, 0, 0),
            EventKind::ChatPosted {
                message: "hi".into(),
            },
        )
    }

    fn block_event() -> GameEvent {
        GameEvent::new(PlayerId::new(), BlockPos::new(0, 0, 0), EventKind::BlockPlaced)
    }

    #[test]
    fn test_initial_state() {
        let scheduler = scheduler(WardenConfig::default());
        assert_eq!(scheduler.phase(), SessionPhase::Idle);
        assert_eq!(scheduler.dispatch_mode(), DispatchMode::Active);
        assert_eq!(scheduler.current_interval(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let scheduler = scheduler(WardenConfig::default());
        scheduler.start().unwrap();
        assert!(matches!(
            scheduler.start(),
            Err(WardenError::AlreadyStarted)
        ));
        scheduler.stop().unwrap();
    }

    #[tokio::test]
    async fn test_stopped_is_terminal() {
        let scheduler = scheduler(WardenConfig::default());
        scheduler.start().unwrap();
        scheduler.stop().unwrap();
        assert!(scheduler.start().is_err());
        assert!(scheduler.stop().is_err());
        assert_eq!(scheduler.phase(), SessionPhase::Stopped);
    }

    #[tokio::test]
    async fn test_empty_batches_slow_dispatch_down() {
        let scheduler = scheduler(WardenConfig::default());
        scheduler.core().phase = SessionPhase::Running;

        for _ in 0..3 {
            scheduler.adjust_cadence(&[]);
        }

        assert_eq!(scheduler.dispatch_mode(), DispatchMode::Idle);
        assert_eq!(scheduler.current_interval(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_insignificant_batches_count_as_empty() {
        let scheduler = scheduler(WardenConfig::default());
        scheduler.core().phase = SessionPhase::Running;

        for _ in 0..3 {
            scheduler.adjust_cadence(&[block_event()]);
        }

        assert_eq!(scheduler.dispatch_mode(), DispatchMode::Idle);
    }

    #[tokio::test]
    async fn test_significant_batch_resets_streak() {
        let scheduler = scheduler(WardenConfig::default());
        scheduler.core().phase = SessionPhase::Running;

        scheduler.adjust_cadence(&[]);
        scheduler.adjust_cadence(&[]);
        scheduler.adjust_cadence(&[chat_event()]);

        assert_eq!(scheduler.empty_batches(), 0);
        assert_eq!(scheduler.dispatch_mode(), DispatchMode::Active);
    }

    #[tokio::test]
    async fn test_busy_batches_hold_active_until_threshold() {
        let scheduler = scheduler(WardenConfig::default());
        scheduler.core().phase = SessionPhase::Running;

        // Block traffic is insignificant, so it still counts toward the
        // quiet streak, but a busy batch keeps the cadence active until
        // the streak reaches the threshold.
        let batch: Vec<_> = (0..4).map(|_| block_event()).collect();
        scheduler.adjust_cadence(&batch);
        scheduler.adjust_cadence(&batch);
        assert_eq!(scheduler.dispatch_mode(), DispatchMode::Active);

        scheduler.adjust_cadence(&batch);
        assert_eq!(scheduler.dispatch_mode(), DispatchMode::Idle);
        assert_eq!(scheduler.current_interval(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_force_active_from_idle() {
        let scheduler = scheduler(WardenConfig::default());
        scheduler.core().phase = SessionPhase::Running;

        for _ in 0..3 {
            scheduler.adjust_cadence(&[]);
        }
        assert_eq!(scheduler.current_interval(), Duration::from_secs(60));

        scheduler.force_active();

        assert_eq!(scheduler.dispatch_mode(), DispatchMode::Active);
        assert_eq!(scheduler.current_interval(), Duration::from_secs(15));
        assert_eq!(scheduler.empty_batches(), 0);
    }

    #[tokio::test]
    async fn test_force_active_before_start_is_inert() {
        let scheduler = scheduler(WardenConfig::default());
        scheduler.force_active();
        assert_eq!(scheduler.phase(), SessionPhase::Idle);
    }

    #[tokio::test]
    async fn test_dispatch_tick_stamps_last_dispatch() {
        let scheduler = scheduler(WardenConfig::default());
        scheduler.core().phase = SessionPhase::Running;
        assert!(scheduler.last_dispatch().is_none());

        // Empty cycle: nothing sent, nothing stamped.
        scheduler.dispatch_tick().await;
        assert!(scheduler.last_dispatch().is_none());

        scheduler.events.record(chat_event());
        scheduler.dispatch_tick().await;
        assert!(scheduler.last_dispatch().is_some());
    }
}
