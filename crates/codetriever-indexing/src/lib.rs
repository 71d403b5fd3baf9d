//! Indexing orchestration for codetriever.
//!
//! [`Indexer`] (C6) drives a single repository through
//! fetch -> chunk -> prepare -> embed -> upsert. [`JobRegistry`] (C8) is the
//! process-wide control plane that starts, tracks, cancels, and deletes
//! indexing jobs keyed by repo name.

pub mod error;
pub mod indexer;
pub mod registry;

pub use error::{IndexError, IndexResult};
pub use indexer::{EMBED_BATCH, Indexer, PROGRESS_INTERVAL, Progress, ProgressSink, Summary};
pub use registry::{
    CancelOutcome, DeleteOutcome, JobRegistry, JobState, JobStatus, JobSummary, StartOutcome,
};
