//! `VectorStore` (C4): a typed facade over a vector index.
//!
//! Grounded on `codetriever-vector-data/src/storage/qdrant.rs`'s client
//! shape (from-url client construction, `ensure_collection` idempotency,
//! payload-by-key extraction) generalized from a fixed 768-dim Jina
//! collection with no filtering to a configurable dimension `D` and
//! equality-filtered search (spec.md §4.4/§6).

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use codetriever_common::{Attempt, RetryPolicy, retry};
use qdrant_client::qdrant::{
    CollectionExistsRequest, Condition, CreateCollection, DeleteCollection, DeletePoints,
    Distance, Filter as QdrantFilter, PointId, PointStruct, PointsSelector, SearchPoints,
    UpsertPointsBuilder, Value as QdrantValue, VectorParams, points_selector::PointsSelectorOneOf,
};
use qdrant_client::{Payload as QdrantPayload, Qdrant};
use tokio_util::sync::CancellationToken;

use crate::{VectorDataError, VectorDataResult};

/// A scalar payload value, per spec.md §6's conversion rule
/// (string→string, int→integer, float→double, bool→bool, else→text).
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for PayloadValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}
impl From<String> for PayloadValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}
impl From<i64> for PayloadValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}
impl From<usize> for PayloadValue {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}
impl From<f64> for PayloadValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}
impl From<bool> for PayloadValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// An untyped payload map at the wire edge. Typed `IndexPoint` callers
/// convert to/from this one boundary type (see spec.md §9 "dynamic
/// metadata payloads").
pub type Payload = BTreeMap<String, PayloadValue>;

/// An equality filter over payload keys. All keys must match their value.
pub type Filter = BTreeMap<String, PayloadValue>;

/// A point to be upserted: `(id, vector, payload)`.
#[derive(Debug, Clone)]
pub struct IndexPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

/// A search result: a stored point plus its similarity score.
#[derive(Debug, Clone)]
pub struct Hit {
    pub id: String,
    pub score: f32,
    pub payload: Payload,
}

/// Narrow capability interface over a vector index (C4).
///
/// Implementations must reject a vector whose length differs from the
/// collection's dimension `D` with [`VectorDataError::InvalidVector`]
/// without round-tripping to the backend.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection with vector dimension `D` and cosine distance
    /// if it doesn't already exist. Idempotent.
    async fn init(&self) -> VectorDataResult<()>;

    /// Insert or replace a single point.
    async fn upsert(
        &self,
        id: &str,
        vector: Vec<f32>,
        payload: Payload,
        cancel: &CancellationToken,
    ) -> VectorDataResult<()>;

    /// Insert or replace a batch of points in one round trip. Atomic from
    /// the client's viewpoint: all points land, or none do.
    async fn upsert_bulk(&self, points: Vec<IndexPoint>, cancel: &CancellationToken) -> VectorDataResult<()>;

    /// Return up to `limit` points matching `filter` (if any), ordered by
    /// descending cosine similarity.
    async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        filter: Option<Filter>,
        cancel: &CancellationToken,
    ) -> VectorDataResult<Vec<Hit>>;

    /// Delete every point whose payload matches `filter`. Used by
    /// `JobRegistry::delete` to purge a repository's points (spec.md §9
    /// open question, resolved in favor of purging).
    async fn delete_matching(&self, filter: Filter, cancel: &CancellationToken) -> VectorDataResult<()>;

    async fn list_collections(&self) -> VectorDataResult<Vec<String>>;
    async fn delete_collection(&self) -> VectorDataResult<()>;
}

fn to_qdrant_value(value: &PayloadValue) -> QdrantValue {
    match value {
        PayloadValue::String(s) => QdrantValue::from(s.clone()),
        PayloadValue::Int(i) => QdrantValue::from(*i),
        PayloadValue::Float(f) => QdrantValue::from(*f),
        PayloadValue::Bool(b) => QdrantValue::from(*b),
    }
}

fn from_qdrant_value(value: &QdrantValue) -> Option<PayloadValue> {
    if let Some(s) = value.as_str() {
        return Some(PayloadValue::String(s.to_string()));
    }
    if let Some(i) = value.as_integer() {
        return Some(PayloadValue::Int(i));
    }
    if let Some(f) = value.as_double() {
        return Some(PayloadValue::Float(f));
    }
    if let Some(b) = value.as_bool() {
        return Some(PayloadValue::Bool(b));
    }
    None
}

fn payload_to_qdrant(payload: &Payload) -> QdrantPayload {
    let map: std::collections::HashMap<String, QdrantValue> =
        payload.iter().map(|(k, v)| (k.clone(), to_qdrant_value(v))).collect();
    QdrantPayload::from(map)
}

fn qdrant_to_payload(payload: &std::collections::HashMap<String, QdrantValue>) -> Payload {
    payload
        .iter()
        .filter_map(|(k, v)| from_qdrant_value(v).map(|v| (k.clone(), v)))
        .collect()
}

fn build_filter(filter: &Filter) -> QdrantFilter {
    let must: Vec<Condition> = filter
        .iter()
        .map(|(key, value)| match value {
            PayloadValue::String(s) => Condition::matches(key, s.clone()),
            PayloadValue::Int(i) => Condition::matches(key, *i),
            PayloadValue::Bool(b) => Condition::matches(key, *b),
            PayloadValue::Float(f) => Condition::matches(key, f.to_string()),
        })
        .collect();
    QdrantFilter { must, ..Default::default() }
}

/// `VectorStore` backed by a Qdrant collection over gRPC.
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    dimension: u64,
    retry_policy: RetryPolicy,
}

impl QdrantStore {
    /// Connect to `url` (e.g. `http://localhost:6334`). Does not create the
    /// collection; call [`VectorStore::init`] to do that.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be constructed.
    pub fn connect(url: &str, collection: impl Into<String>, dimension: u64) -> VectorDataResult<Self> {
        let mut builder = Qdrant::from_url(url);
        if let Ok(api_key) = std::env::var("QDRANT_API_KEY") {
            builder = builder.api_key(api_key);
        }
        let client = builder
            .build()
            .map_err(|e| VectorDataError::Storage(format!("qdrant client: {e}")))?;
        Ok(Self {
            client,
            collection: collection.into(),
            dimension,
            retry_policy: RetryPolicy::new(3, Duration::from_millis(500)),
        })
    }

    fn check_dimension(&self, vector: &[f32]) -> VectorDataResult<()> {
        if vector.len() as u64 != self.dimension {
            return Err(VectorDataError::InvalidVector(format!(
                "expected dimension {}, got {}",
                self.dimension,
                vector.len()
            )));
        }
        Ok(())
    }

    fn point_struct(id: &str, vector: Vec<f32>, payload: &Payload) -> PointStruct {
        PointStruct::new(id.to_string(), vector, payload_to_qdrant(payload))
    }
}

fn is_transient(err: &qdrant_client::QdrantError) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("unavailable")
        || msg.contains("deadline")
        || msg.contains("timeout")
        || msg.contains("reset")
        || msg.contains("502")
        || msg.contains("503")
        || msg.contains("504")
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn init(&self) -> VectorDataResult<()> {
        let exists = self
            .client
            .collection_exists(CollectionExistsRequest { collection_name: self.collection.clone() })
            .await
            .map_err(|e| VectorDataError::Storage(format!("collection_exists: {e}")))?;
        if exists {
            return Ok(());
        }

        let request = CreateCollection {
            collection_name: self.collection.clone(),
            vectors_config: Some(
                VectorParams { size: self.dimension, distance: Distance::Cosine as i32, ..Default::default() }
                    .into(),
            ),
            ..Default::default()
        };

        match self.client.create_collection(request).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("already exists") => Ok(()),
            Err(e) => Err(VectorDataError::Storage(format!("create_collection: {e}"))),
        }
    }

    async fn upsert(
        &self,
        id: &str,
        vector: Vec<f32>,
        payload: Payload,
        cancel: &CancellationToken,
    ) -> VectorDataResult<()> {
        self.check_dimension(&vector)?;
        self.upsert_bulk(vec![IndexPoint { id: id.to_string(), vector, payload }], cancel).await
    }

    async fn upsert_bulk(&self, points: Vec<IndexPoint>, cancel: &CancellationToken) -> VectorDataResult<()> {
        for p in &points {
            self.check_dimension(&p.vector)?;
        }
        let qdrant_points: Vec<PointStruct> =
            points.iter().map(|p| Self::point_struct(&p.id, p.vector.clone(), &p.payload)).collect();

        retry(
            self.retry_policy,
            cancel,
            || VectorDataError::Cancelled,
            || {
                let request = UpsertPointsBuilder::new(self.collection.clone(), qdrant_points.clone()).build();
                async move {
                    match self.client.upsert_points(request).await {
                        Ok(_) => Attempt::Success(()),
                        Err(e) if is_transient(&e) => Attempt::Transient(VectorDataError::Storage(e.to_string())),
                        Err(e) => Attempt::Fatal(VectorDataError::Storage(e.to_string())),
                    }
                }
            },
        )
        .await
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        filter: Option<Filter>,
        cancel: &CancellationToken,
    ) -> VectorDataResult<Vec<Hit>> {
        if limit == 0 {
            return Err(VectorDataError::InvalidArgument("limit must be > 0".into()));
        }
        self.check_dimension(&vector)?;

        let request = SearchPoints {
            collection_name: self.collection.clone(),
            vector,
            limit: limit as u64,
            with_payload: Some(true.into()),
            filter: filter.as_ref().map(build_filter),
            ..Default::default()
        };

        let response = tokio::select! {
            result = self.client.search_points(request) => {
                result.map_err(|e| VectorDataError::Storage(format!("search: {e}")))?
            }
            () = cancel.cancelled() => return Err(VectorDataError::Cancelled),
        };

        Ok(response
            .result
            .into_iter()
            .map(|p| Hit {
                id: point_id_to_string(p.id),
                score: p.score,
                payload: qdrant_to_payload(&p.payload),
            })
            .collect())
    }

    async fn delete_matching(&self, filter: Filter, cancel: &CancellationToken) -> VectorDataResult<()> {
        let request = DeletePoints {
            collection_name: self.collection.clone(),
            points: Some(PointsSelector {
                points_selector_one_of: Some(PointsSelectorOneOf::Filter(build_filter(&filter))),
            }),
            ..Default::default()
        };
        tokio::select! {
            result = self.client.delete_points(request) => {
                result.map_err(|e| VectorDataError::Storage(format!("delete_matching: {e}")))?;
            }
            () = cancel.cancelled() => return Err(VectorDataError::Cancelled),
        };
        Ok(())
    }

    async fn list_collections(&self) -> VectorDataResult<Vec<String>> {
        let response = self
            .client
            .list_collections()
            .await
            .map_err(|e| VectorDataError::Storage(format!("list_collections: {e}")))?;
        Ok(response.collections.into_iter().map(|c| c.name).collect())
    }

    async fn delete_collection(&self) -> VectorDataResult<()> {
        self.client
            .delete_collection(DeleteCollection { collection_name: self.collection.clone(), ..Default::default() })
            .await
            .map_err(|e| VectorDataError::Storage(format!("delete_collection: {e}")))?;
        Ok(())
    }
}

fn point_id_to_string(id: Option<PointId>) -> String {
    use qdrant_client::qdrant::point_id::PointIdOptions;
    match id.and_then(|p| p.point_id_options) {
        Some(PointIdOptions::Uuid(u)) => u,
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

/// Shared marker type so `Arc<dyn VectorStore>` is the common handle type
/// across the indexing and search crates.
pub type SharedVectorStore = Arc<dyn VectorStore>;
