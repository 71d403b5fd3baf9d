//! Deterministic [`EmbeddingClient`] double for tests.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{EmbeddingClient, EmbeddingError, EmbeddingResult};

/// Produces a deterministic vector per input text (hash of the text spread
/// across `dimension` floats) so identical texts embed identically and
/// distinct texts are very unlikely to collide.
pub struct MockEmbeddingClient {
    dimension: usize,
    fail_with: Option<EmbeddingErrorKind>,
}

#[derive(Debug, Clone, Copy)]
pub enum EmbeddingErrorKind {
    Invalid,
    Transient,
}

impl MockEmbeddingClient {
    #[must_use]
    pub const fn new(dimension: usize) -> Self {
        Self { dimension, fail_with: None }
    }

    #[must_use]
    pub const fn failing(dimension: usize, kind: EmbeddingErrorKind) -> Self {
        Self { dimension, fail_with: Some(kind) }
    }
}

fn deterministic_vector(text: &str, dimension: usize) -> Vec<f32> {
    let mut state: u64 = 1469598103934665603;
    for byte in text.bytes() {
        state ^= u64::from(byte);
        state = state.wrapping_mul(1099511628211);
    }
    (0..dimension)
        .map(|i| {
            let shifted = state.wrapping_add(i as u64).wrapping_mul(2654435761);
            (shifted % 2000) as f32 / 1000.0 - 1.0
        })
        .collect()
}

#[async_trait]
impl EmbeddingClient for MockEmbeddingClient {
    async fn embed(&self, texts: &[String], _cancel: &CancellationToken) -> EmbeddingResult<Vec<Vec<f32>>> {
        match self.fail_with {
            Some(EmbeddingErrorKind::Invalid) => {
                return Err(EmbeddingError::InvalidRequest("mock configured to fail".into()));
            }
            Some(EmbeddingErrorKind::Transient) => {
                return Err(EmbeddingError::RetriesExhausted("mock configured to fail".into()));
            }
            None => {}
        }
        Ok(texts.iter().map(|t| deterministic_vector(t, self.dimension)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_embeds_identically() {
        let client = MockEmbeddingClient::new(8);
        let cancel = CancellationToken::new();
        let a = client.embed(&["hello".to_string()], &cancel).await.unwrap();
        let b = client.embed(&["hello".to_string()], &cancel).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn preserves_order_and_dimension() {
        let client = MockEmbeddingClient::new(4);
        let cancel = CancellationToken::new();
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let out = client.embed(&texts, &cancel).await.unwrap();
        assert_eq!(out.len(), texts.len());
        assert!(out.iter().all(|v| v.len() == 4));
    }
}
