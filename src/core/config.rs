//! Warden configuration with documented constants
//!
//! All tuning knobs are collected here with explanations of their purpose
//! and how they interact with each other.

use crate::core::error::{Result, WardenError};
use std::time::Duration;

/// Configuration for the overseer pipeline
///
/// These values mirror what worked in production against a rate-limited
/// chat endpoint. Changing them shifts the balance between responsiveness
/// and how hard the overseer is hammered during quiet periods.
#[derive(Debug, Clone)]
pub struct WardenConfig {
    // === POLLING ===
    /// Dispatch interval while players are active
    ///
    /// Every period, queued events and activity rates are drained and sent
    /// to the overseer as one batch.
    pub active_dispatch_interval: Duration,

    /// Dispatch interval after a quiet stretch
    ///
    /// Switched to once `empty_batch_threshold` consecutive batches carry
    /// nothing worth reacting to. Keeps idle servers from burning overseer
    /// quota on empty reports.
    pub idle_dispatch_interval: Duration,

    /// Fixed interval for asking the overseer whether it has decided actions
    ///
    /// Independent of the dispatch cadence: the overseer may decide actions
    /// long after the batch that prompted them.
    pub ping_interval: Duration,

    /// Fixed interval for evicting stale activity samples
    pub cleanup_interval: Duration,

    /// Consecutive insignificant batches before dropping to the idle cadence
    pub empty_batch_threshold: u32,

    /// Batch size above which dispatch snaps back to the active cadence
    /// even without a significant event
    pub busy_batch_len: usize,

    // === ACTIVITY STATS ===
    /// Most recent samples kept per (player, metric) pair
    ///
    /// Bounds memory per player; at typical mining speed 200 samples cover
    /// well over the rate window anyway.
    pub sample_cap: usize,

    /// Sliding window for per-minute activity rates, in milliseconds
    pub rate_window_ms: u64,

    // === ACTION REPLAY ===
    /// Maximum actions replayed into the simulation per tick
    ///
    /// The dispatch queue is unbounded; this cap is what keeps a large
    /// backlog from stalling a single simulation tick.
    pub max_actions_per_tick: usize,

    // === CONTEXT BUDGET ===
    /// Estimated token count at which the instruction preamble is re-sent
    pub token_refresh_threshold: u64,

    /// Average characters per token (a rough approximation)
    pub chars_per_token: f32,

    // === TRANSPORT ===
    /// Per-request timeout for overseer calls
    ///
    /// A timed-out call is a soft failure; the next scheduled tick retries
    /// naturally. Values below ~10s cut off slow but successful replies.
    pub request_timeout: Duration,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            // Polling cadences (active < cleanup < idle)
            active_dispatch_interval: Duration::from_secs(15),
            idle_dispatch_interval: Duration::from_secs(60),
            ping_interval: Duration::from_secs(5),
            cleanup_interval: Duration::from_secs(30),
            empty_batch_threshold: 3,
            busy_batch_len: 3,

            // Stats
            sample_cap: 200,
            rate_window_ms: 60_000,

            // Replay
            max_actions_per_tick: 10,

            // Budget
            token_refresh_threshold: 80_000,
            chars_per_token: 4.0,

            // Transport
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl WardenConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.idle_dispatch_interval < self.active_dispatch_interval {
            return Err(WardenError::InvalidConfig(format!(
                "idle_dispatch_interval ({:?}) must be >= active_dispatch_interval ({:?})",
                self.idle_dispatch_interval, self.active_dispatch_interval
            )));
        }

        if self.active_dispatch_interval.is_zero()
            || self.ping_interval.is_zero()
            || self.cleanup_interval.is_zero()
        {
            return Err(WardenError::InvalidConfig(
                "polling intervals must be non-zero".into(),
            ));
        }

        if self.empty_batch_threshold == 0 {
            return Err(WardenError::InvalidConfig(
                "empty_batch_threshold must be at least 1".into(),
            ));
        }

        if self.sample_cap == 0 || self.rate_window_ms == 0 {
            return Err(WardenError::InvalidConfig(
                "sample_cap and rate_window_ms must be non-zero".into(),
            ));
        }

        if self.max_actions_per_tick == 0 {
            return Err(WardenError::InvalidConfig(
                "max_actions_per_tick must be at least 1".into(),
            ));
        }

        if self.chars_per_token <= 0.0 {
            return Err(WardenError::InvalidConfig(format!(
                "chars_per_token ({}) must be positive",
                self.chars_per_token
            )));
        }

        Ok(())
    }
}
