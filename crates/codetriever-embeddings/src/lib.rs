//! Codetriever embedding generation crate
//!
//! This crate provides ML-based embedding generation for semantic code search.
//! It handles the conversion of code text into high-dimensional vectors using
//! transformer models like Jina embeddings.

pub mod client;
pub mod error;
pub mod mock;

pub use client::{EmbeddingClient, HttpEmbeddingClient};
pub use codetriever_config::EmbeddingConfig;
pub use error::{EmbeddingError, EmbeddingResult};
pub use mock::{EmbeddingErrorKind, MockEmbeddingClient};
