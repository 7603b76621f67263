//! Batch serialization and the notify/poll split
//!
//! `notify` ships drained events and activity rates to the overseer and
//! deliberately ignores the reply beyond logging it: the overseer answers
//! with actions only when pinged. `poll` sends the minimal ping and
//! decodes whatever `actions` array comes back. Transport and shape
//! problems on either path are soft failures; the next scheduled tick
//! retries naturally.

use super::budget::ContextBudget;
use super::client::OverseerChat;
use super::prompts;
use crate::actions::{parser, PendingAction};
use crate::core::types::{BlockPos, PlayerId};
use crate::events::GameEvent;
use crate::stats::{ActivityMetric, ActivityRate};
use ahash::AHashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

const PING_MESSAGE: &str = r#"{"ping":true}"#;

/// Owns the request/response contract with the overseer
pub struct OverseerBridge {
    client: Arc<dyn OverseerChat>,
    budget: ContextBudget,
}

/// One outbound batch
#[derive(Serialize)]
struct BatchPayload<'a> {
    events: &'a [GameEvent],
    stats: AHashMap<&'static str, AHashMap<PlayerId, u32>>,
    #[serde(rename = "playerPositions")]
    player_positions: &'a AHashMap<PlayerId, BlockPos>,
}

impl OverseerBridge {
    pub fn new(client: Arc<dyn OverseerChat>, budget: ContextBudget) -> Self {
        Self { client, budget }
    }

    /// Send the instruction preamble and start a fresh budget cycle
    ///
    /// Called once at session start and again on every budget-triggered
    /// refresh.
    pub async fn send_instructions(&self) -> crate::core::error::Result<()> {
        self.client.send_instructions(&prompts::instructions()).await?;
        self.budget.reset();
        Ok(())
    }

    /// Ship one batch of events, rates, and positions; fire-and-forget
    ///
    /// The overseer's immediate reply is acknowledged and counted against
    /// the budget but never parsed for actions.
    pub async fn notify(
        &self,
        events: &[GameEvent],
        rates: &[(ActivityMetric, Vec<ActivityRate>)],
        positions: &AHashMap<PlayerId, BlockPos>,
    ) {
        let payload = BatchPayload {
            events,
            stats: rates
                .iter()
                .map(|(metric, rates)| {
                    (
                        metric.wire_name(),
                        rates.iter().map(|r| (r.pid, r.per_minute)).collect(),
                    )
                })
                .collect(),
            player_positions: positions,
        };

        let message = match serde_json::to_string(&payload) {
            Ok(message) => message,
            Err(err) => {
                warn!(%err, "failed to serialize batch, dropping it");
                return;
            }
        };
        debug!(batch = %message, "sending batch to overseer");

        self.refresh_if_needed(message.len()).await;

        match self.client.chat(&message).await {
            Ok(reply) => {
                debug!(reply_len = reply.message.len(), "overseer acknowledged batch");
                self.track_reply(reply.message.len()).await;
            }
            Err(err) => warn!(%err, "batch notify failed, retrying on next tick"),
        }
    }

    /// Ask the overseer for decided actions
    ///
    /// A missing or malformed `actions` field, like a transport failure,
    /// yields an empty batch rather than an error.
    pub async fn poll(&self) -> Vec<PendingAction> {
        self.refresh_if_needed(PING_MESSAGE.len()).await;

        let reply = match self.client.chat(PING_MESSAGE).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(%err, "ping failed, retrying on next tick");
                return Vec::new();
            }
        };
        self.track_reply(reply.message.len()).await;

        let parsed: serde_json::Value = match serde_json::from_str(&reply.message) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(%err, "ping reply was not JSON");
                return Vec::new();
            }
        };

        let Some(actions) = parsed.get("actions").and_then(|a| a.as_array()) else {
            warn!("no actions array in ping reply");
            return Vec::new();
        };

        let decoded = parser::decode_batch(actions);
        if !decoded.is_empty() {
            debug!(count = decoded.len(), "decoded actions from ping reply");
        }
        decoded
    }

    /// Re-send instructions first when the outgoing message would cross
    /// the budget threshold, preserving overseer context continuity
    async fn refresh_if_needed(&self, outgoing_chars: usize) {
        if self.budget.add_chars(outgoing_chars) {
            info!("context budget reached, resending instructions");
            if let Err(err) = self.send_instructions().await {
                warn!(%err, "instruction refresh failed, continuing with stale context");
            }
        }
    }

    /// Replies consume context too; a crossing here refreshes immediately
    /// so the next message already lands on a fresh preamble
    async fn track_reply(&self, reply_chars: usize) {
        if self.budget.add_chars(reply_chars) {
            info!("context budget reached by reply, resending instructions");
            if let Err(err) = self.send_instructions().await {
                warn!(%err, "instruction refresh failed, continuing with stale context");
            }
        }
    }
}
