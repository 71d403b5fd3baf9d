//! `EmbeddingClient` (C3): batched embedding generation with retry/backoff.
//!
//! Grounded on spec.md §4.3's own algorithm (this crate replaces a local
//! Candle model with an external HTTP collaborator — see DESIGN.md) using
//! the same `codetriever_common::retry` backoff loop `codetriever-vector-data`
//! uses for upserts, and `tokio_util::sync::CancellationToken` for
//! cooperative cancellation.

use std::time::Duration;

use async_trait::async_trait;
use codetriever_common::{Attempt, RetryPolicy, retry};
use codetriever_config::EmbeddingConfig;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{EmbeddingError, EmbeddingResult};

/// Narrow capability interface over an embedding backend.
///
/// `embed` preserves input order: `out.len() == texts.len()` and every
/// `out[i].len() == D` (P3). Callers are responsible for slicing into
/// batches of at most `BATCH_SIZE`; the client does not further slice.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, texts: &[String], cancel: &CancellationToken) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// The fixed vector dimension `D` this client produces.
    fn dimension(&self) -> usize;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponseItem {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedResponseItem>,
}

/// Which request/response shape an endpoint speaks. Both carry the same
/// logical request/response; only headers/auth placement differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EndpointShape {
    /// A managed offering fronted by a provider-specific host (e.g. `azure.com`).
    Managed,
    /// Direct access to the model provider's own API.
    Direct,
}

fn select_endpoint_shape(endpoint: &str) -> EndpointShape {
    if endpoint.contains("azure.com") { EndpointShape::Managed } else { EndpointShape::Direct }
}

/// `reqwest`-backed [`EmbeddingClient`] with managed/direct endpoint
/// auto-selection and the spec.md §4.3 retry/backoff loop.
pub struct HttpEmbeddingClient {
    http: reqwest::Client,
    config: EmbeddingConfig,
    shape: EndpointShape,
    retry_policy: RetryPolicy,
}

impl HttpEmbeddingClient {
    #[must_use]
    pub fn new(config: EmbeddingConfig) -> Self {
        let shape = select_endpoint_shape(&config.endpoint);
        let retry_policy = RetryPolicy::new(config.max_retries, Duration::from_millis(config.base_delay_ms));
        Self { http: reqwest::Client::new(), config, shape, retry_policy }
    }

    fn build_request(&self, texts: &[String]) -> reqwest::RequestBuilder {
        let body = EmbedRequest { input: texts, model: &self.config.model };
        let mut req = self.http.post(&self.config.endpoint).json(&body);
        req = match (self.shape, &self.config.api_key) {
            (EndpointShape::Managed, Some(key)) => req.header("api-key", key),
            (EndpointShape::Direct, Some(key)) => req.bearer_auth(key),
            (_, None) => req,
        };
        req
    }
}

fn is_retryable_status(status: reqwest::StatusCode) -> bool {
    status.as_u16() == 429
        || status == reqwest::StatusCode::BAD_GATEWAY
        || status == reqwest::StatusCode::SERVICE_UNAVAILABLE
        || status == reqwest::StatusCode::GATEWAY_TIMEOUT
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, texts: &[String], cancel: &CancellationToken) -> EmbeddingResult<Vec<Vec<f32>>> {
        retry(
            self.retry_policy,
            cancel,
            || EmbeddingError::Cancelled,
            || async {
                let response = match self.build_request(texts).send().await {
                    Ok(r) => r,
                    Err(e) if e.is_timeout() || e.is_connect() => {
                        return Attempt::Transient(EmbeddingError::Transient(e.to_string()));
                    }
                    Err(e) => return Attempt::Fatal(EmbeddingError::InvalidRequest(e.to_string())),
                };

                let status = response.status();
                if !status.is_success() {
                    let err = EmbeddingError::Transient(format!("status {status}"));
                    return if is_retryable_status(status) {
                        Attempt::Transient(err)
                    } else {
                        Attempt::Fatal(EmbeddingError::InvalidRequest(format!("status {status}")))
                    };
                }

                match response.json::<EmbedResponse>().await {
                    Ok(parsed) => Attempt::Success(parsed.data.into_iter().map(|d| d.embedding).collect()),
                    Err(e) => Attempt::Fatal(EmbeddingError::InvalidRequest(format!("malformed response: {e}"))),
                }
            },
        )
        .await
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managed_endpoint_detected_by_host() {
        assert_eq!(select_endpoint_shape("https://my-resource.azure.com/embeddings"), EndpointShape::Managed);
        assert_eq!(select_endpoint_shape("https://api.openai.com/v1/embeddings"), EndpointShape::Direct);
    }
}
