//! Bounded-throughput replay queue
//!
//! Ping tasks push decoded actions in; the simulation's tick thread pulls
//! at most `limit` per invocation so a backlog can never stall a tick.
//! The queue itself is unbounded; its depth is the backpressure signal to
//! watch.

use super::PendingAction;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// FIFO queue between the polling tasks and the simulation thread
#[derive(Debug, Default)]
pub struct DispatchQueue {
    pending: Mutex<VecDeque<PendingAction>>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn pending(&self) -> MutexGuard<'_, VecDeque<PendingAction>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a batch of decoded actions; O(k)
    pub fn enqueue_all(&self, actions: Vec<PendingAction>) {
        self.pending().extend(actions);
    }

    /// Remove and return at most `limit` actions in FIFO order
    ///
    /// The remainder stays queued for the next tick.
    pub fn drain_up_to(&self, limit: usize) -> Vec<PendingAction> {
        let mut pending = self.pending();
        let take = limit.min(pending.len());
        pending.drain(..take).collect()
    }

    /// Current backlog depth; grows without bound if action production
    /// outpaces `limit * tick rate`
    pub fn len(&self) -> usize {
        self.pending().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending().is_empty()
    }
}
