//! Session runtime
//!
//! Ties the queues, stats, budget, and bridge together: the scheduler runs
//! the three periodic activities on background tasks, and the session is
//! the surface the simulation holds (lifecycle, event/stat producers, and
//! the per-tick action drain).

pub mod scheduler;
pub mod session;

pub use scheduler::{DispatchMode, PollingScheduler, SessionPhase};
pub use session::Session;

use crate::core::types::{BlockPos, PlayerId};
use ahash::AHashMap;

/// Simulation-supplied snapshot of where everyone is
///
/// Called from polling tasks, so implementations must be safe to query off
/// the simulation thread.
pub trait PositionSource: Send + Sync {
    fn player_positions(&self) -> AHashMap<PlayerId, BlockPos>;
}
