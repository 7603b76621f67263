//! Overseer integration
//!
//! The overseer is the external AI endpoint that watches the world and
//! decides actions. This module owns the chat channel to it (`client`),
//! the conversation-size budget that triggers instruction refreshes
//! (`budget`), the instruction preamble (`prompts`), and the bridge that
//! turns drained batches into wire payloads and ping replies into decoded
//! actions (`bridge`).

pub mod bridge;
pub mod budget;
pub mod client;
pub mod mock;
pub mod prompts;

pub use bridge::OverseerBridge;
pub use budget::ContextBudget;
pub use client::{ChatReply, OpenAiChatClient, OverseerChat};
pub use mock::MockChatClient;
