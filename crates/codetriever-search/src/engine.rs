//! `QueryEngine` (C7): embed question -> filtered vector search -> context
//! assembly -> chat completion, composed into a cited [`QueryResult`].
//!
//! Grounded on `codetriever-search/src/searching/service.rs`'s retrieval
//! trait shape, extended with the [`crate::ChatClient`] capability the
//! corpus's search crate never had — it stopped at retrieval, never
//! synthesizing an answer (SPEC_FULL.md §4.7).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use codetriever_embeddings::EmbeddingClient;
use codetriever_vector_data::{Hit, Payload, PayloadValue, VectorStore};
use tokio_util::sync::CancellationToken;

use crate::chat::{ChatClient, ChatMessage};
use crate::error::{SearchError, SearchResult};

const SYSTEM_PROMPT: &str = "You are an expert code assistant. Answer strictly from the provided \
context, cite the file and line range you drew from, and say so plainly if the context is \
insufficient to answer confidently.";

const NO_CONTEXT_ANSWER: &str =
    "I couldn't find any relevant context for that question in this repository.";
const DEGRADED_ANSWER: &str = "I couldn't generate an answer right now; please try again.";

/// A single cited source backing a [`QueryResult`]'s answer.
#[derive(Debug, Clone)]
pub struct Reference {
    pub file_path: String,
    pub start_line: usize,
    pub end_line: usize,
    /// Similarity score in `[0, 1]`.
    pub score: f32,
}

/// The result of [`QueryEngine::ask`]: a synthesized answer plus the
/// references it was grounded on, ordered by descending score.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub answer: String,
    pub references: Vec<Reference>,
    pub duration: Duration,
}

fn graceful_result(started: Instant, answer: &str) -> QueryResult {
    QueryResult { answer: answer.to_string(), references: Vec::new(), duration: started.elapsed() }
}

fn payload_str<'a>(payload: &'a Payload, key: &str) -> Option<&'a str> {
    match payload.get(key) {
        Some(PayloadValue::String(s)) => Some(s.as_str()),
        _ => None,
    }
}

fn payload_usize(payload: &Payload, key: &str) -> Option<usize> {
    match payload.get(key) {
        Some(PayloadValue::Int(i)) => usize::try_from(*i).ok(),
        _ => None,
    }
}

fn assemble_context(hits: &[Hit]) -> String {
    hits.iter()
        .filter_map(|hit| {
            let file_path = payload_str(&hit.payload, "file_path")?;
            let start_line = payload_usize(&hit.payload, "start_line")?;
            let end_line = payload_usize(&hit.payload, "end_line")?;
            let content = payload_str(&hit.payload, "content")?;
            Some(format!("File: {file_path} (lines {start_line}-{end_line})\n{content}\n"))
        })
        .collect::<Vec<_>>()
        .join("\n---\n\n")
}

fn extract_references(hits: &[Hit]) -> Vec<Reference> {
    let mut references: Vec<Reference> = hits
        .iter()
        .filter_map(|hit| {
            let file_path = payload_str(&hit.payload, "file_path")?.to_string();
            let start_line = payload_usize(&hit.payload, "start_line")?;
            let end_line = payload_usize(&hit.payload, "end_line")?;
            Some(Reference { file_path, start_line, end_line, score: hit.score })
        })
        .collect();
    references.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    references
}

/// Composes retrieval and chat completion into a cited answer (C7).
pub struct QueryEngine {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatClient>,
}

impl QueryEngine {
    #[must_use]
    pub fn new(embedder: Arc<dyn EmbeddingClient>, store: Arc<dyn VectorStore>, chat: Arc<dyn ChatClient>) -> Self {
        Self { embedder, store, chat }
    }

    /// Answer `question` about `repo_name` using up to `max_results` pieces
    /// of retrieved context.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidArgument`] for blank inputs or
    /// `max_results == 0`, propagates cancellation unmodified, and
    /// propagates vector-store search failures as fatal. Embedding and chat
    /// failures degrade gracefully to a best-effort answer instead of
    /// erroring (spec.md §7).
    pub async fn ask(
        &self,
        question: &str,
        repo_name: &str,
        max_results: usize,
        cancel: &CancellationToken,
    ) -> SearchResult<QueryResult> {
        if question.trim().is_empty() || repo_name.trim().is_empty() {
            return Err(SearchError::InvalidArgument("question and repo_name must not be blank".into()));
        }
        if max_results == 0 {
            return Err(SearchError::InvalidArgument("max_results must be > 0".into()));
        }

        let started = Instant::now();

        let embedding = match self.embedder.embed(&[question.to_string()], cancel).await {
            Ok(mut vectors) if !vectors.is_empty() => vectors.swap_remove(0),
            Ok(_) => return Ok(graceful_result(started, DEGRADED_ANSWER)),
            Err(codetriever_embeddings::EmbeddingError::Cancelled) => return Err(SearchError::Cancelled),
            Err(_) => return Ok(graceful_result(started, DEGRADED_ANSWER)),
        };

        let mut filter: BTreeMap<String, PayloadValue> = BTreeMap::new();
        filter.insert("repo_name".to_string(), PayloadValue::from(repo_name));

        let hits = match self.store.search(embedding, max_results, Some(filter), cancel).await {
            Ok(hits) => hits,
            Err(codetriever_vector_data::VectorDataError::Cancelled) => return Err(SearchError::Cancelled),
            Err(e) => return Err(SearchError::VectorStore(e)),
        };

        if hits.is_empty() {
            return Ok(graceful_result(started, NO_CONTEXT_ANSWER));
        }

        let context = assemble_context(&hits);
        let messages =
            vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(format!("{context}\n{question}"))];

        match self.chat.complete(&messages, cancel).await {
            Ok(response) => {
                let references = extract_references(&hits);
                Ok(QueryResult { answer: response.content, references, duration: started.elapsed() })
            }
            Err(SearchError::Cancelled) => Err(SearchError::Cancelled),
            Err(_) => Ok(graceful_result(started, DEGRADED_ANSWER)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChatClient;
    use codetriever_embeddings::MockEmbeddingClient;
    use codetriever_vector_data::MockVectorStore;

    fn payload(repo: &str, file: &str, start: usize, end: usize, content: &str) -> Payload {
        BTreeMap::from([
            ("repo_name".to_string(), PayloadValue::from(repo)),
            ("file_path".to_string(), PayloadValue::from(file)),
            ("start_line".to_string(), PayloadValue::from(start)),
            ("end_line".to_string(), PayloadValue::from(end)),
            ("content".to_string(), PayloadValue::from(content)),
        ])
    }

    #[tokio::test]
    async fn rejects_blank_question() {
        let engine = QueryEngine::new(
            Arc::new(MockEmbeddingClient::new(4)),
            Arc::new(MockVectorStore::new(4)),
            Arc::new(MockChatClient::echoing("ok")),
        );
        let cancel = CancellationToken::new();
        let err = engine.ask("  ", "repo", 5, &cancel).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn rejects_zero_max_results() {
        let engine = QueryEngine::new(
            Arc::new(MockEmbeddingClient::new(4)),
            Arc::new(MockVectorStore::new(4)),
            Arc::new(MockChatClient::echoing("ok")),
        );
        let cancel = CancellationToken::new();
        let err = engine.ask("what does this do", "repo", 0, &cancel).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn no_hits_yields_no_context_answer() {
        let engine = QueryEngine::new(
            Arc::new(MockEmbeddingClient::new(4)),
            Arc::new(MockVectorStore::new(4)),
            Arc::new(MockChatClient::echoing("ok")),
        );
        let cancel = CancellationToken::new();
        let result = engine.ask("what does this do", "empty-repo", 5, &cancel).await.unwrap();
        assert!(result.references.is_empty());
        assert_eq!(result.answer, NO_CONTEXT_ANSWER);
    }

    #[tokio::test]
    async fn hits_produce_ordered_references_and_echoed_answer() {
        let store = MockVectorStore::new(4);
        // MockVectorStore scores by cosine similarity to the query vector,
        // which MockEmbeddingClient derives deterministically from the text;
        // seed two points whose vectors bracket the question's embedding.
        let question_vector =
            codetriever_embeddings::MockEmbeddingClient::new(4).embed(&["q".to_string()], &CancellationToken::new()).await.unwrap()[0].clone();
        let cancel = CancellationToken::new();
        store.upsert("a", question_vector.clone(), payload("repo", "a.rs", 1, 10, "fn a() {}"), &cancel).await.unwrap();
        let mut other = question_vector.clone();
        other[0] = -other[0];
        store.upsert("b", other, payload("repo", "b.rs", 5, 20, "fn b() {}"), &cancel).await.unwrap();

        let engine =
            QueryEngine::new(Arc::new(MockEmbeddingClient::new(4)), Arc::new(store), Arc::new(MockChatClient::echoing("OK")));
        let cancel = CancellationToken::new();
        let result = engine.ask("q", "repo", 5, &cancel).await.unwrap();

        assert_eq!(result.answer, "OK");
        assert!(!result.references.is_empty());
        for window in result.references.windows(2) {
            assert!(window[0].score >= window[1].score);
        }
    }

    #[tokio::test]
    async fn chat_failure_degrades_gracefully() {
        let store = MockVectorStore::new(4);
        store
            .upsert("a", vec![1.0, 0.0, 0.0, 0.0], payload("repo", "a.rs", 1, 10, "fn a() {}"), &CancellationToken::new())
            .await
            .unwrap();

        let engine = QueryEngine::new(
            Arc::new(MockEmbeddingClient::new(4)),
            Arc::new(store),
            Arc::new(MockChatClient::failing()),
        );
        let cancel = CancellationToken::new();
        let result = engine.ask("what does a do", "repo", 5, &cancel).await.unwrap();
        assert!(result.references.is_empty());
        assert_eq!(result.answer, DEGRADED_ANSWER);
    }
}
