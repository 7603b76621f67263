//! Chat channel to the overseer
//!
//! The production client targets the OpenAI Responses API and threads
//! `previous_response_id` through every call, so the overseer sees one
//! continuous conversation across batches, pings, and instruction
//! refreshes. Everything above this module talks to the `OverseerChat`
//! trait; tests and the offline demo plug in the scripted mock instead.

use crate::core::config::WardenConfig;
use crate::core::error::{Result, WardenError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// The overseer's reply to one chat message
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub message: String,
    pub response_id: Option<String>,
}

/// Stateful chat channel to the overseer
///
/// Implementations own whatever continuity state the backend needs;
/// callers never see it. Both methods block only the calling task.
#[async_trait]
pub trait OverseerChat: Send + Sync {
    /// Send one user message and return the reply
    async fn chat(&self, message: &str) -> Result<ChatReply>;

    /// (Re)send the instruction preamble that frames the conversation
    async fn send_instructions(&self, instructions: &str) -> Result<()>;
}

/// OpenAI Responses API client
pub struct OpenAiChatClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
    prev_response_id: Mutex<Option<String>>,
}

impl OpenAiChatClient {
    pub const DEFAULT_API_URL: &'static str = "https://api.openai.com/v1/responses";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o";

    /// Create a new client with explicit configuration
    pub fn new(api_key: String, api_url: String, model: String, cfg: &WardenConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| WardenError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            api_url,
            model,
            prev_response_id: Mutex::new(None),
        })
    }

    /// Create a client from environment variables
    ///
    /// Required: OPENAI_API_KEY
    /// Optional: WARDEN_API_URL (defaults to the OpenAI Responses endpoint)
    /// Optional: WARDEN_MODEL (defaults to gpt-4o)
    pub fn from_env(cfg: &WardenConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| WardenError::Transport("OPENAI_API_KEY not set".into()))?;
        let api_url =
            std::env::var("WARDEN_API_URL").unwrap_or_else(|_| Self::DEFAULT_API_URL.into());
        let model = std::env::var("WARDEN_MODEL").unwrap_or_else(|_| Self::DEFAULT_MODEL.into());

        Self::new(api_key, api_url, model, cfg)
    }

    async fn call(&self, role: &str, content: &str) -> Result<ChatReply> {
        let previous = self.prev_response_id.lock().await.clone();
        let request = ResponsesRequest {
            model: &self.model,
            input: [InputMessage { role, content }],
            previous_response_id: previous.as_deref(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| WardenError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WardenError::Transport(format!(
                "overseer returned {status}: {body}"
            )));
        }

        let reply: ResponsesReply = response
            .json()
            .await
            .map_err(|e| WardenError::Transport(e.to_string()))?;

        let message = reply
            .output
            .first()
            .and_then(|item| item.content.first())
            .map(|content| content.text.clone())
            .ok_or_else(|| WardenError::Transport("empty overseer reply".into()))?;

        *self.prev_response_id.lock().await = Some(reply.id.clone());

        Ok(ChatReply {
            message,
            response_id: Some(reply.id),
        })
    }
}

#[async_trait]
impl OverseerChat for OpenAiChatClient {
    async fn chat(&self, message: &str) -> Result<ChatReply> {
        self.call("user", message).await
    }

    async fn send_instructions(&self, instructions: &str) -> Result<()> {
        self.call("developer", instructions).await?;
        Ok(())
    }
}

// Responses API wire format
#[derive(Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: [InputMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_response_id: Option<&'a str>,
}

#[derive(Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ResponsesReply {
    id: String,
    output: Vec<OutputItem>,
}

#[derive(Deserialize)]
struct OutputItem {
    content: Vec<OutputContent>,
}

#[derive(Deserialize)]
struct OutputContent {
    text: String,
}
