//! Simulation-side action hand-off

use super::PendingAction;
use crate::core::error::Result;

/// Applies decoded actions to the simulation
///
/// Implemented by the embedding simulation and driven once per tick from
/// its authoritative thread. A failure is reported back through `Err`,
/// logged by the caller with the action's type, and must not prevent the
/// rest of the batch from executing; the failed action is not requeued.
pub trait ActionExecutor {
    fn execute(&mut self, action: PendingAction) -> Result<()>;
}
