//! Scripted overseer for tests and the offline demo
//!
//! Replies are served from a queue of canned messages; once the script is
//! exhausted every chat gets the default reply. Everything sent through
//! the client is recorded so tests can assert on wire payloads and
//! instruction refresh ordering.

use super::client::{ChatReply, OverseerChat};
use crate::core::error::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What the mock has been asked, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockExchange {
    Instructions(String),
    Chat(String),
}

/// In-memory overseer double
#[derive(Debug, Default)]
pub struct MockChatClient {
    replies: Mutex<VecDeque<String>>,
    exchanges: Mutex<Vec<MockExchange>>,
}

impl MockChatClient {
    /// Mock that answers every chat with an empty actions object
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that serves the given replies in order, then falls back to the
    /// default empty-actions reply
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mock = Self::new();
        *mock.lock_replies() = replies.into_iter().map(Into::into).collect();
        mock
    }

    /// Queue one more scripted reply
    pub fn script_reply(&self, reply: impl Into<String>) {
        self.lock_replies().push_back(reply.into());
    }

    /// Everything sent so far, chats and instruction sends interleaved
    pub fn exchanges(&self) -> Vec<MockExchange> {
        self.lock_exchanges().clone()
    }

    /// Chat payloads only, in send order
    pub fn chat_messages(&self) -> Vec<String> {
        self.lock_exchanges()
            .iter()
            .filter_map(|exchange| match exchange {
                MockExchange::Chat(message) => Some(message.clone()),
                MockExchange::Instructions(_) => None,
            })
            .collect()
    }

    pub fn instructions_sent(&self) -> usize {
        self.lock_exchanges()
            .iter()
            .filter(|exchange| matches!(exchange, MockExchange::Instructions(_)))
            .count()
    }

    fn lock_replies(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_exchanges(&self) -> MutexGuard<'_, Vec<MockExchange>> {
        self.exchanges.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl OverseerChat for MockChatClient {
    async fn chat(&self, message: &str) -> Result<ChatReply> {
        self.lock_exchanges()
            .push(MockExchange::Chat(message.to_string()));

        let message = self
            .lock_replies()
            .pop_front()
            .unwrap_or_else(|| r#"{"actions":[]}"#.to_string());

        Ok(ChatReply {
            message,
            response_id: None,
        })
    }

    async fn send_instructions(&self, instructions: &str) -> Result<()> {
        self.lock_exchanges()
            .push(MockExchange::Instructions(instructions.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let mock = MockChatClient::with_replies(["first", "second"]);
        mock.script_reply("third");

        assert_eq!(mock.chat("a").await.unwrap().message, "first");
        assert_eq!(mock.chat("b").await.unwrap().message, "second");
        assert_eq!(mock.chat("c").await.unwrap().message, "third");
        assert_eq!(mock.chat("d").await.unwrap().message, r#"{"actions":[]}"#);
    }

    #[tokio::test]
    async fn test_records_exchanges() {
        let mock = MockChatClient::new();
        mock.send_instructions("be fair").await.unwrap();
        mock.chat("hello").await.unwrap();

        assert_eq!(
            mock.exchanges(),
            vec![
                MockExchange::Instructions("be fair".into()),
                MockExchange::Chat("hello".into()),
            ]
        );
        assert_eq!(mock.instructions_sent(), 1);
        assert_eq!(mock.chat_messages(), vec!["hello".to_string()]);
    }
}
