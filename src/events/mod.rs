//! Observed world events
//!
//! Every occurrence the simulation reports is captured as a `GameEvent` at
//! the moment it happens and queued in the session's `EventLog` until the
//! next dispatch batch drains it. Events are sent to the overseer once and
//! then dropped; nothing here is replayed or persisted.

pub mod log;

pub use log::EventLog;

use crate::core::types::{now_millis, BlockPos, PlayerId, TimestampMs};
use serde::Serialize;

/// One observed world occurrence
///
/// The envelope fields are shared by every kind; the kind itself is
/// flattened into the wire object under the `event` discriminant, so a
/// chat message serializes as
/// `{"pid": "...", "pos": {...}, "ts": ..., "event": "ChatPosted", "message": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct GameEvent {
    pub pid: PlayerId,
    pub pos: BlockPos,
    pub ts: TimestampMs,
    #[serde(flatten)]
    pub kind: EventKind,
}

/// What happened, tagged by the variant name on the wire
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum EventKind {
    ChatPosted {
        message: String,
    },
    BlockPlaced,
    BlockBroken,
    PlayerDamaged {
        #[serde(rename = "dmg")]
        amount: f32,
        #[serde(rename = "src")]
        source: String,
    },
    PlayerDied {
        cause: String,
    },
    PlayerKilledEntity {
        target: String,
        #[serde(rename = "targetId")]
        target_id: String,
        weapon: String,
    },
}

impl GameEvent {
    /// Capture an event now; `ts` is the creation instant, not dispatch time
    pub fn new(pid: PlayerId, pos: BlockPos, kind: EventKind) -> Self {
        Self {
            pid,
            pos,
            ts: now_millis(),
            kind,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ChatPosted { .. } => "ChatPosted",
            EventKind::BlockPlaced => "BlockPlaced",
            EventKind::BlockBroken => "BlockBroken",
            EventKind::PlayerDamaged { .. } => "PlayerDamaged",
            EventKind::PlayerDied { .. } => "PlayerDied",
            EventKind::PlayerKilledEntity { .. } => "PlayerKilledEntity",
        }
    }

    /// Socially significant kinds restore the active dispatch cadence
    /// immediately: chat, deaths, damage, and kills all warrant a prompt
    /// overseer reaction, while block traffic can wait for the next batch.
    pub fn is_significant(&self) -> bool {
        matches!(
            self,
            EventKind::ChatPosted { .. }
                | EventKind::PlayerDied { .. }
                | EventKind::PlayerDamaged { .. }
                | EventKind::PlayerKilledEntity { .. }
        )
    }
}
