//! In-memory [`VectorStore`] double for tests that don't need a live Qdrant.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{Filter, Hit, IndexPoint, Payload, PayloadValue, VectorDataError, VectorDataResult, VectorStore};

struct Point {
    id: String,
    vector: Vec<f32>,
    payload: Payload,
}

/// Records every point ever upserted and answers `search` by brute-force
/// cosine similarity over whatever matches `filter`.
pub struct MockVectorStore {
    dimension: usize,
    points: Mutex<Vec<Point>>,
}

impl MockVectorStore {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self { dimension, points: Mutex::new(Vec::new()) }
    }

    fn check_dimension(&self, vector: &[f32]) -> VectorDataResult<()> {
        if vector.len() != self.dimension {
            return Err(VectorDataError::InvalidVector(format!(
                "expected dimension {}, got {}",
                self.dimension,
                vector.len()
            )));
        }
        Ok(())
    }
}

fn matches(payload: &Payload, filter: &Filter) -> bool {
    filter.iter().all(|(k, v)| payload.get(k) == Some(v))
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 { 0.0 } else { dot / (norm_a * norm_b) }
}

#[async_trait]
impl VectorStore for MockVectorStore {
    async fn init(&self) -> VectorDataResult<()> {
        Ok(())
    }

    async fn upsert(
        &self,
        id: &str,
        vector: Vec<f32>,
        payload: Payload,
        cancel: &CancellationToken,
    ) -> VectorDataResult<()> {
        self.upsert_bulk(vec![IndexPoint { id: id.to_string(), vector, payload }], cancel).await
    }

    async fn upsert_bulk(&self, points: Vec<IndexPoint>, cancel: &CancellationToken) -> VectorDataResult<()> {
        if cancel.is_cancelled() {
            return Err(VectorDataError::Cancelled);
        }
        for p in &points {
            self.check_dimension(&p.vector)?;
        }
        let mut store = self.points.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for p in points {
            store.retain(|existing| existing.id != p.id);
            store.push(Point { id: p.id, vector: p.vector, payload: p.payload });
        }
        Ok(())
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        filter: Option<Filter>,
        cancel: &CancellationToken,
    ) -> VectorDataResult<Vec<Hit>> {
        if cancel.is_cancelled() {
            return Err(VectorDataError::Cancelled);
        }
        if limit == 0 {
            return Err(VectorDataError::InvalidArgument("limit must be > 0".into()));
        }
        self.check_dimension(&vector)?;

        let store = self.points.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut hits: Vec<Hit> = store
            .iter()
            .filter(|p| filter.as_ref().is_none_or(|f| matches(&p.payload, f)))
            .map(|p| Hit { id: p.id.clone(), score: cosine(&vector, &p.vector), payload: p.payload.clone() })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn delete_matching(&self, filter: Filter, cancel: &CancellationToken) -> VectorDataResult<()> {
        if cancel.is_cancelled() {
            return Err(VectorDataError::Cancelled);
        }
        let mut store = self.points.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        store.retain(|p| !matches(&p.payload, &filter));
        Ok(())
    }

    async fn list_collections(&self) -> VectorDataResult<Vec<String>> {
        Ok(vec!["mock".to_string()])
    }

    async fn delete_collection(&self) -> VectorDataResult<()> {
        let mut store = self.points.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        store.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn payload(repo: &str) -> Payload {
        BTreeMap::from([("repo_name".to_string(), PayloadValue::from(repo))])
    }

    #[tokio::test]
    async fn upsert_then_search_round_trips() {
        let cancel = CancellationToken::new();
        let store = MockVectorStore::new(3);
        store.upsert("a", vec![1.0, 0.0, 0.0], payload("r1"), &cancel).await.unwrap();

        let hits = store.search(vec![1.0, 0.0, 0.0], 5, None, &cancel).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "a");
        assert!(hits[0].score > 0.99);
    }

    #[tokio::test]
    async fn search_filters_by_payload_equality() {
        let cancel = CancellationToken::new();
        let store = MockVectorStore::new(2);
        store.upsert("a", vec![1.0, 0.0], payload("r1"), &cancel).await.unwrap();
        store.upsert("b", vec![1.0, 0.0], payload("r2"), &cancel).await.unwrap();

        let filter = BTreeMap::from([("repo_name".to_string(), PayloadValue::from("r2"))]);
        let hits = store.search(vec![1.0, 0.0], 5, Some(filter), &cancel).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
    }

    #[tokio::test]
    async fn wrong_dimension_is_rejected() {
        let cancel = CancellationToken::new();
        let store = MockVectorStore::new(3);
        let err = store.upsert("a", vec![1.0, 0.0], payload("r1"), &cancel).await.unwrap_err();
        assert!(matches!(err, VectorDataError::InvalidVector(_)));
    }

    #[tokio::test]
    async fn zero_limit_is_invalid_argument() {
        let cancel = CancellationToken::new();
        let store = MockVectorStore::new(3);
        let err = store.search(vec![1.0, 0.0, 0.0], 0, None, &cancel).await.unwrap_err();
        assert!(matches!(err, VectorDataError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn upsert_replaces_existing_id() {
        let cancel = CancellationToken::new();
        let store = MockVectorStore::new(2);
        store.upsert("a", vec![1.0, 0.0], payload("r1"), &cancel).await.unwrap();
        store.upsert("a", vec![0.0, 1.0], payload("r1"), &cancel).await.unwrap();

        let hits = store.search(vec![0.0, 1.0], 5, None, &cancel).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score > 0.99);
    }

    #[tokio::test]
    async fn delete_matching_purges_by_filter() {
        let cancel = CancellationToken::new();
        let store = MockVectorStore::new(2);
        store.upsert("a", vec![1.0, 0.0], payload("r1"), &cancel).await.unwrap();
        store.upsert("b", vec![1.0, 0.0], payload("r2"), &cancel).await.unwrap();

        store.delete_matching(payload("r1"), &cancel).await.unwrap();

        let hits = store.search(vec![1.0, 0.0], 5, None, &cancel).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
    }
}
