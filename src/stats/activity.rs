//! Per-player sliding-window activity counters
//!
//! Each qualifying occurrence (a block mined, a block placed) appends a
//! timestamp sample for its (player, metric) pair. Rates are recomputed on
//! demand as "samples in the last minute" and never stored; the periodic
//! cleanup activity evicts samples the window has passed so query cost
//! stays bounded over long sessions.

use crate::core::types::{PlayerId, TimestampMs};
use ahash::AHashMap;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The tracked activity dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityMetric {
    Mining,
    Building,
}

impl ActivityMetric {
    pub const ALL: [ActivityMetric; 2] = [ActivityMetric::Mining, ActivityMetric::Building];

    /// Key used for this metric in the stats payload
    pub fn wire_name(&self) -> &'static str {
        match self {
            ActivityMetric::Mining => "mining",
            ActivityMetric::Building => "building",
        }
    }
}

/// Point-in-time rate for one player, derived from sample history
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ActivityRate {
    pub pid: PlayerId,
    pub per_minute: u32,
    /// When this rate was computed
    pub at: TimestampMs,
}

/// Sliding-window sample store for all players and metrics
#[derive(Debug)]
pub struct ActivityStats {
    window_ms: u64,
    sample_cap: usize,
    samples: Mutex<AHashMap<(PlayerId, ActivityMetric), VecDeque<TimestampMs>>>,
}

impl ActivityStats {
    pub fn new(window_ms: u64, sample_cap: usize) -> Self {
        Self {
            window_ms,
            sample_cap,
            samples: Mutex::new(AHashMap::new()),
        }
    }

    fn samples(&self) -> MutexGuard<'_, AHashMap<(PlayerId, ActivityMetric), VecDeque<TimestampMs>>> {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one qualifying occurrence
    ///
    /// The per-pair history is capped; once full, the oldest sample is
    /// dropped to admit the new one.
    pub fn observe(&self, pid: PlayerId, metric: ActivityMetric, ts: TimestampMs) {
        let mut samples = self.samples();
        let history = samples.entry((pid, metric)).or_default();
        history.push_back(ts);
        while history.len() > self.sample_cap {
            history.pop_front();
        }
    }

    /// Occurrences per window for one player; 0 for unknown players
    pub fn rate(&self, pid: PlayerId, metric: ActivityMetric, now: TimestampMs) -> u32 {
        self.samples()
            .get(&(pid, metric))
            .map(|history| Self::count_in_window(history, now, self.window_ms))
            .unwrap_or(0)
    }

    /// Rates for every player with activity in the window; zero rates are
    /// omitted so quiet players never pad the overseer payload
    pub fn all_rates(&self, metric: ActivityMetric, now: TimestampMs) -> Vec<ActivityRate> {
        self.samples()
            .iter()
            .filter(|((_, m), _)| *m == metric)
            .filter_map(|((pid, _), history)| {
                let per_minute = Self::count_in_window(history, now, self.window_ms);
                (per_minute > 0).then_some(ActivityRate {
                    pid: *pid,
                    per_minute,
                    at: now,
                })
            })
            .collect()
    }

    /// Drop samples the window has passed; run periodically so `rate`
    /// scans stay short regardless of session length
    pub fn evict_stale(&self, now: TimestampMs) {
        let cutoff = now.saturating_sub(self.window_ms);
        let mut samples = self.samples();
        samples.retain(|_, history| {
            while history.front().is_some_and(|&ts| ts < cutoff) {
                history.pop_front();
            }
            !history.is_empty()
        });
    }

    fn count_in_window(history: &VecDeque<TimestampMs>, now: TimestampMs, window_ms: u64) -> u32 {
        history
            .iter()
            .filter(|&&ts| now.saturating_sub(ts) <= window_ms)
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: u64 = 60_000;

    fn stats() -> ActivityStats {
        ActivityStats::new(WINDOW, 200)
    }

    #[test]
    fn test_rate_counts_samples_in_window() {
        let stats = stats();
        let pid = PlayerId::new();

        stats.observe(pid, ActivityMetric::Mining, 1_000);
        stats.observe(pid, ActivityMetric::Mining, 2_000);
        stats.observe(pid, ActivityMetric::Mining, 50_000);

        assert_eq!(stats.rate(pid, ActivityMetric::Mining, 55_000), 3);
    }

    #[test]
    fn test_rate_excludes_expired_samples() {
        let stats = stats();
        let pid = PlayerId::new();

        stats.observe(pid, ActivityMetric::Mining, 1_000);
        // One millisecond past the window: the sample no longer counts.
        assert_eq!(stats.rate(pid, ActivityMetric::Mining, 1_000 + WINDOW + 1), 0);
        assert_eq!(stats.rate(pid, ActivityMetric::Mining, 1_000 + WINDOW), 1);
    }

    #[test]
    fn test_unknown_player_has_zero_rate() {
        assert_eq!(stats().rate(PlayerId::new(), ActivityMetric::Building, 5_000), 0);
    }

    #[test]
    fn test_metrics_are_independent() {
        let stats = stats();
        let pid = PlayerId::new();

        stats.observe(pid, ActivityMetric::Mining, 1_000);
        assert_eq!(stats.rate(pid, ActivityMetric::Mining, 2_000), 1);
        assert_eq!(stats.rate(pid, ActivityMetric::Building, 2_000), 0);
    }

    #[test]
    fn test_sample_cap_drops_oldest() {
        let stats = ActivityStats::new(WINDOW, 5);
        let pid = PlayerId::new();

        for ts in 0..10u64 {
            stats.observe(pid, ActivityMetric::Building, ts);
        }

        // Only the 5 newest samples (5..10) survive.
        assert_eq!(stats.rate(pid, ActivityMetric::Building, 10), 5);
    }

    #[test]
    fn test_all_rates_skips_idle_players() {
        let stats = stats();
        let active = PlayerId::new();
        let idle = PlayerId::new();

        stats.observe(active, ActivityMetric::Mining, 10_000);
        stats.observe(idle, ActivityMetric::Mining, 1_000);

        let rates = stats.all_rates(ActivityMetric::Mining, 1_000 + WINDOW + 1);
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].pid, active);
        assert_eq!(rates[0].per_minute, 1);
        assert_eq!(rates[0].at, 1_000 + WINDOW + 1);
    }

    #[test]
    fn test_evict_stale_then_rate_unchanged() {
        let stats = stats();
        let pid = PlayerId::new();

        stats.observe(pid, ActivityMetric::Mining, 1_000);
        stats.observe(pid, ActivityMetric::Mining, 30_000);
        stats.observe(pid, ActivityMetric::Mining, 65_000);

        let now = 70_000;
        let before = stats.rate(pid, ActivityMetric::Mining, now);
        stats.evict_stale(now);
        assert_eq!(stats.rate(pid, ActivityMetric::Mining, now), before);
    }

    #[test]
    fn test_evict_stale_removes_empty_histories() {
        let stats = stats();
        let pid = PlayerId::new();

        stats.observe(pid, ActivityMetric::Mining, 1_000);
        stats.evict_stale(1_000 + WINDOW + 1);

        assert!(stats.all_rates(ActivityMetric::Mining, 1_000 + WINDOW + 1).is_empty());
    }
}
