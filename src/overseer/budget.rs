//! Approximate token accounting for the overseer conversation
//!
//! Both the dispatch and ping activities funnel their message sizes through
//! one counter; when the estimated token total reaches the refresh
//! threshold the instruction preamble must be re-sent before the
//! conversation drifts past the model's usable context.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Cumulative character counter with a one-shot threshold signal
#[derive(Debug)]
pub struct ContextBudget {
    chars_per_token: f32,
    refresh_threshold: u64,
    characters: Mutex<u64>,
}

impl ContextBudget {
    pub fn new(chars_per_token: f32, refresh_threshold: u64) -> Self {
        Self {
            chars_per_token,
            refresh_threshold,
            characters: Mutex::new(0),
        }
    }

    fn characters(&self) -> MutexGuard<'_, u64> {
        self.characters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `n` characters to the running total
    ///
    /// Returns true exactly once per accumulation cycle: at the instant the
    /// estimated token count reaches the threshold. The counter resets to
    /// zero at that same instant, so the next call starts a fresh cycle.
    pub fn add_chars(&self, n: usize) -> bool {
        let mut characters = self.characters();
        *characters += n as u64;

        if self.estimate(*characters) >= self.refresh_threshold {
            *characters = 0;
            return true;
        }

        false
    }

    /// Explicit zero, used after a fresh instruction payload went out
    pub fn reset(&self) {
        *self.characters() = 0;
    }

    pub fn estimated_tokens(&self) -> u64 {
        self.estimate(*self.characters())
    }

    fn estimate(&self, characters: u64) -> u64 {
        (characters as f64 / self.chars_per_token as f64).round() as u64
    }
}
