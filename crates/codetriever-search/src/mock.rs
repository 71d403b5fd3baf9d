//! Deterministic [`ChatClient`] double for tests.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::chat::{ChatClient, ChatMessage, ChatResponse};
use crate::error::{SearchError, SearchResult};

/// Echoes a configured reply, or fails, regardless of the chat history sent.
pub struct MockChatClient {
    reply: String,
    fail: bool,
}

impl MockChatClient {
    #[must_use]
    pub fn echoing(reply: impl Into<String>) -> Self {
        Self { reply: reply.into(), fail: false }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self { reply: String::new(), fail: true }
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn complete(&self, _messages: &[ChatMessage], _cancel: &CancellationToken) -> SearchResult<ChatResponse> {
        if self.fail {
            return Err(SearchError::Chat("mock configured to fail".into()));
        }
        Ok(ChatResponse { content: self.reply.clone() })
    }
}
