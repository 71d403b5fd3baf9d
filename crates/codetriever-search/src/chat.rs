//! `ChatClient`: a narrow chat-completion capability backing [`crate::QueryEngine`] (C7).
//!
//! Not part of the corpus (`codetriever-search` stops at retrieval); added
//! per SPEC_FULL.md §4.7 using the same `reqwest` stack
//! `codetriever-embeddings::HttpEmbeddingClient` uses, since this workspace
//! treats both as external HTTP collaborators behind a narrow trait.

use async_trait::async_trait;
use codetriever_config::ChatConfig;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{SearchError, SearchResult};

/// A chat message's speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

/// One turn of a chat history.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// The assistant's reply to a chat history.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
}

/// Narrow capability interface over a chat-completion backend.
///
/// Cancellation is honored immediately; there is no retry loop (spec.md
/// §6 chat backend contract names no backoff schedule for this call).
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> SearchResult<ChatResponse>;
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

fn role_str(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
    }
}

/// `reqwest`-backed [`ChatClient`] speaking the OpenAI chat-completions shape.
pub struct HttpChatClient {
    http: reqwest::Client,
    config: ChatConfig,
}

impl HttpChatClient {
    #[must_use]
    pub fn new(config: ChatConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> SearchResult<ChatResponse> {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        let wire_messages =
            messages.iter().map(|m| WireMessage { role: role_str(m.role), content: &m.content }).collect();
        let body = ChatRequest { model: &self.config.model, messages: wire_messages };

        let mut request = self.http.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = tokio::select! {
            result = request.send() => result.map_err(|e| SearchError::Chat(e.to_string()))?,
            () = cancel.cancelled() => return Err(SearchError::Cancelled),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Chat(format!("status {status}")));
        }

        let parsed: ChatCompletionResponse =
            response.json().await.map_err(|e| SearchError::Chat(format!("malformed response: {e}")))?;

        Ok(ChatResponse { content: parsed.choices.into_iter().next().map_or_else(String::new, |c| c.message.content) })
    }
}
