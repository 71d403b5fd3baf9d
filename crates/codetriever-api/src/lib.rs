//! HTTP framing for the codetriever control plane and RAG query endpoint.
//!
//! This crate is a thin axum adapter: it owns routing, request/response
//! JSON shapes, and service wiring. All of the actual indexing and query
//! logic lives in `codetriever-indexing` and `codetriever-search`; the
//! handlers here just translate HTTP to their narrow contracts and back.

pub mod bootstrap;
pub mod error;
pub mod openapi;
pub mod routes;
pub mod state;

#[cfg(test)]
pub mod test_utils;

pub use error::{Error, Result};
pub use state::AppState;
