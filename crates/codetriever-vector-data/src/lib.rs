//! Codetriever vector data storage crate
//!
//! This crate provides vector database operations for storing and retrieving
//! code embeddings. It supports multiple backends like Qdrant and includes
//! mock implementations for testing.

pub mod error;
pub mod mock;
pub mod store;

pub use error::{VectorDataError, VectorDataResult};
pub use mock::MockVectorStore;
pub use store::{Filter, Hit, IndexPoint, Payload, PayloadValue, QdrantStore, SharedVectorStore, VectorStore};
