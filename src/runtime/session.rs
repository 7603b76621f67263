//! Session lifecycle and the simulation-facing surface
//!
//! One `Session` per running world. It owns every queue and tracker as an
//! explicit instance, nothing global, so two sessions (or two tests)
//! can never bleed state into each other.

use crate::actions::{ActionExecutor, DispatchQueue, PendingAction};
use crate::core::config::WardenConfig;
use crate::core::error::{Result, WardenError};
use crate::core::types::{PlayerId, TimestampMs};
use crate::events::{EventLog, GameEvent};
use crate::overseer::{ContextBudget, OverseerBridge, OverseerChat};
use crate::runtime::scheduler::{DispatchMode, PollingScheduler, SessionPhase};
use crate::runtime::PositionSource;
use crate::stats::{ActivityMetric, ActivityStats};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The overseer pipeline for one simulation session
pub struct Session {
    cfg: WardenConfig,
    events: Arc<EventLog>,
    stats: Arc<ActivityStats>,
    queue: Arc<DispatchQueue>,
    bridge: Arc<OverseerBridge>,
    scheduler: Arc<PollingScheduler>,
}

impl Session {
    /// Wire up a session against an overseer client and a position source
    ///
    /// Nothing runs until [`start`](Session::start).
    pub fn new(
        cfg: WardenConfig,
        client: Arc<dyn OverseerChat>,
        positions: Arc<dyn PositionSource>,
    ) -> Result<Self> {
        cfg.validate()?;

        let events = Arc::new(EventLog::new());
        let stats = Arc::new(ActivityStats::new(cfg.rate_window_ms, cfg.sample_cap));
        let queue = Arc::new(DispatchQueue::new());
        let bridge = Arc::new(OverseerBridge::new(
            client,
            ContextBudget::new(cfg.chars_per_token, cfg.token_refresh_threshold),
        ));
        let scheduler = Arc::new(PollingScheduler::new(
            cfg.clone(),
            Arc::clone(&events),
            Arc::clone(&stats),
            Arc::clone(&queue),
            Arc::clone(&bridge),
            positions,
        ));

        Ok(Self {
            cfg,
            events,
            stats,
            queue,
            bridge,
            scheduler,
        })
    }

    /// Send the instruction preamble and begin the periodic activities
    ///
    /// An unreachable overseer does not prevent startup; the preamble
    /// resend machinery recovers once it comes back.
    pub async fn start(&self) -> Result<()> {
        if let Err(err) = self.bridge.send_instructions().await {
            warn!(%err, "could not send instructions at startup");
        }
        self.scheduler.start()?;
        info!("session started");
        Ok(())
    }

    /// Stop all periodic activities; terminal
    pub fn stop(&self) -> Result<()> {
        self.scheduler.stop()?;
        info!(
            dropped_events = self.events.len(),
            dropped_actions = self.queue.len(),
            "session stopped"
        );
        Ok(())
    }

    /// Record one observed world event; safe from any thread
    ///
    /// Significant events snap the dispatch cadence back to active so the
    /// overseer hears about them within the active interval.
    pub fn record(&self, event: GameEvent) -> Result<()> {
        self.ensure_running()?;
        let significant = event.kind.is_significant();
        debug!(event = event.name(), pid = %event.pid, "event recorded");
        self.events.record(event);
        if significant {
            self.scheduler.force_active();
        }
        Ok(())
    }

    /// Record one activity occurrence (a block mined or placed)
    pub fn observe(
        &self,
        pid: PlayerId,
        metric: ActivityMetric,
        ts: TimestampMs,
    ) -> Result<()> {
        self.ensure_running()?;
        self.stats.observe(pid, metric, ts);
        Ok(())
    }

    /// Take up to `limit` decided actions off the replay queue
    ///
    /// Call once per tick from the simulation's authoritative thread.
    pub fn drain_actions(&self, limit: usize) -> Result<Vec<PendingAction>> {
        self.ensure_running()?;
        Ok(self.queue.drain_up_to(limit))
    }

    /// Drain up to the configured per-tick cap and execute each action
    ///
    /// A failing action is logged with its type and skipped; the rest of
    /// the batch still runs. Returns how many actions executed cleanly.
    pub fn replay_into(&self, executor: &mut dyn ActionExecutor) -> Result<usize> {
        let batch = self.drain_actions(self.cfg.max_actions_per_tick)?;
        if batch.is_empty() {
            return Ok(0);
        }

        let mut executed = 0;
        for action in batch {
            let kind = action.kind();
            debug!(action = kind, "executing action");
            match executor.execute(action) {
                Ok(()) => executed += 1,
                Err(err) => warn!(action = kind, %err, "action execution failed"),
            }
        }

        let remaining = self.queue.len();
        if remaining > 0 {
            debug!(remaining, "actions still queued after tick");
        }
        Ok(executed)
    }

    /// Backlog depth of the replay queue; the signal to watch if the
    /// overseer produces actions faster than ticks consume them
    pub fn pending_actions(&self) -> usize {
        self.queue.len()
    }

    pub fn phase(&self) -> SessionPhase {
        self.scheduler.phase()
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.scheduler.dispatch_mode()
    }

    pub fn current_dispatch_interval(&self) -> Duration {
        self.scheduler.current_interval()
    }

    fn ensure_running(&self) -> Result<()> {
        match self.scheduler.phase() {
            SessionPhase::Running => Ok(()),
            phase => Err(WardenError::NotRunning(phase.describe())),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.scheduler.phase() == SessionPhase::Running {
            let _ = self.scheduler.stop();
        }
    }
}
