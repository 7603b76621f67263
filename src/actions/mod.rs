//! Actions decided by the overseer
//!
//! Decoded from the `actions` array of a ping reply, queued in the
//! `DispatchQueue`, and replayed into the simulation at a bounded rate on
//! the simulation's own tick thread. The crate is agnostic to what
//! execution does; the `ActionExecutor` trait is the hand-off point.

pub mod executor;
pub mod parser;
pub mod queue;

pub use executor::ActionExecutor;
pub use queue::DispatchQueue;

use crate::core::types::{BlockPos, PlayerId};
use serde::{Deserialize, Serialize};

/// One action awaiting replay, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PendingAction {
    #[serde(rename_all = "camelCase")]
    SendMessage { message_body: String },

    #[serde(rename_all = "camelCase")]
    SpawnBlock { block_type: String, pos: BlockPos },

    #[serde(rename_all = "camelCase")]
    SpawnCreature { creature_type: String, pos: BlockPos },

    #[serde(rename_all = "camelCase")]
    SpawnItem {
        item_type: String,
        pos: BlockPos,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<u32>,
    },

    #[serde(rename_all = "camelCase")]
    KickPlayer {
        player_id: PlayerId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    #[serde(rename_all = "camelCase")]
    MutePlayer {
        player_id: PlayerId,
        mute: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl PendingAction {
    /// The wire discriminant, also used when logging execution failures
    pub fn kind(&self) -> &'static str {
        match self {
            PendingAction::SendMessage { .. } => "SendMessage",
            PendingAction::SpawnBlock { .. } => "SpawnBlock",
            PendingAction::SpawnCreature { .. } => "SpawnCreature",
            PendingAction::SpawnItem { .. } => "SpawnItem",
            PendingAction::KickPlayer { .. } => "KickPlayer",
            PendingAction::MutePlayer { .. } => "MutePlayer",
        }
    }
}
