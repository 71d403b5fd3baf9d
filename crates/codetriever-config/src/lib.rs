//! Centralized configuration for codetriever.
//!
//! Configuration follows a simple hierarchy:
//! 1. Safe defaults (constants below)
//! 2. Environment variable overrides
//! 3. Runtime validation via [`validation::Validate`]
//!
//! The recognized option set is closed per spec.md §6: `storage_path`,
//! `vector_dim`, `max_tokens`, `chars_per_token`, `embed_batch`,
//! `progress_interval`, `max_retries`, `base_delay_ms`, `endpoint`,
//! `api_key`, `embed_model`, `chat_model`, `vector_backend_host`,
//! `vector_backend_port`.

pub mod error;
pub mod profile;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use profile::Profile;
pub use validation::Validate;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// =============================================================================
// SAFE DEFAULTS
// =============================================================================

const DEFAULT_STORAGE_PATH: &str = "./.codetriever/repos";
const DEFAULT_VECTOR_DIM: usize = 1536;
const DEFAULT_MAX_TOKENS: usize = 6000;
const DEFAULT_CHARS_PER_TOKEN: usize = 3;
const DEFAULT_EMBED_BATCH: usize = 100;
const DEFAULT_PROGRESS_INTERVAL: usize = 10;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 500;
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";
const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-small";
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_VECTOR_BACKEND_HOST: &str = "localhost";
const DEFAULT_VECTOR_BACKEND_PORT: u16 = 6334;

/// Repository acquisition and enumeration (C5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Base directory holding one clone per sanitized repo name.
    pub storage_path: PathBuf,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self { storage_path: PathBuf::from(DEFAULT_STORAGE_PATH) }
    }
}

impl Validate for RepoConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(
            self.storage_path.to_string_lossy().as_ref(),
            "repo.storage_path",
        )
    }
}

/// Chunking and token-safety budget (C1/C2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// `MAX_TOKENS` — the token budget a single embeddable piece must stay under.
    pub max_tokens: usize,
    /// `K` — characters-per-token estimator constant.
    pub chars_per_token: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_tokens: DEFAULT_MAX_TOKENS, chars_per_token: DEFAULT_CHARS_PER_TOKEN }
    }
}

impl Validate for ChunkingConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(self.max_tokens as u64, 1, 1_000_000, "chunking.max_tokens")?;
        validation::validate_range(self.chars_per_token as u64, 1, 100, "chunking.chars_per_token")
    }
}

/// Embedding backend (C3): external HTTP collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub dimension: usize,
    /// Batch size the Indexer slices embed calls into.
    pub embed_batch: usize,
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_EMBED_MODEL.to_string(),
            dimension: DEFAULT_VECTOR_DIM,
            embed_batch: DEFAULT_EMBED_BATCH,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
        }
    }
}

impl Validate for EmbeddingConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_url(&self.endpoint, "embedding.endpoint")?;
        validation::validate_non_empty(&self.model, "embedding.model")?;
        validation::validate_range(self.dimension as u64, 1, 65536, "embedding.dimension")?;
        validation::validate_range(self.embed_batch as u64, 1, 10_000, "embedding.embed_batch")
    }
}

/// Chat backend (C7 collaborator): shares the embedding client's HTTP stack
/// but speaks its own model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            model: DEFAULT_CHAT_MODEL.to_string(),
        }
    }
}

impl Validate for ChatConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_url(&self.endpoint, "chat.endpoint")?;
        validation::validate_non_empty(&self.model, "chat.model")
    }
}

/// Vector backend (C4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStorageConfig {
    pub host: String,
    pub port: u16,
    pub collection_name: String,
    pub dimension: usize,
}

impl Default for VectorStorageConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_VECTOR_BACKEND_HOST.to_string(),
            port: DEFAULT_VECTOR_BACKEND_PORT,
            collection_name: "codetriever".to_string(),
            dimension: DEFAULT_VECTOR_DIM,
        }
    }
}

impl VectorStorageConfig {
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Validate for VectorStorageConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.host, "vector_storage.host")?;
        validation::validate_port(self.port, "vector_storage.port")?;
        validation::validate_non_empty(&self.collection_name, "vector_storage.collection_name")?;
        validation::validate_range(self.dimension as u64, 1, 65536, "vector_storage.dimension")
    }
}

/// Indexer orchestration (C6) and control plane (C8) tunables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Files between `Progress` snapshots during enumeration.
    pub progress_interval: usize,
    /// Chunks-per-slice for the embed+upsert phase (`EMBED_BATCH`).
    pub embed_batch: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self { progress_interval: DEFAULT_PROGRESS_INTERVAL, embed_batch: DEFAULT_EMBED_BATCH.min(50) }
    }
}

impl Validate for IndexingConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(self.progress_interval as u64, 1, 10_000, "indexing.progress_interval")?;
        validation::validate_range(self.embed_batch as u64, 1, 10_000, "indexing.embed_batch")
    }
}

/// Top-level application configuration: the closed set of recognized
/// options from spec.md §6, grouped by the component that owns them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub repo: RepoConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub vector_storage: VectorStorageConfig,
    #[serde(default)]
    pub indexing: IndexingConfig,
}

impl ApplicationConfig {
    /// Build the default configuration for `profile`. Profiles currently
    /// only affect logging verbosity (wired up by the API binary); the
    /// closed option set itself has one safe default regardless of profile.
    #[must_use]
    pub fn with_profile(profile: Profile) -> Self {
        Self { profile, ..Self::default() }
    }

    /// Apply environment variable overrides on top of the current values.
    /// Recognized variables are prefixed `CODETRIEVER_` and named after the
    /// dotted option path (e.g. `CODETRIEVER_EMBEDDING_API_KEY`).
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("CODETRIEVER_STORAGE_PATH") {
            self.repo.storage_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CODETRIEVER_VECTOR_DIM") {
            if let Ok(n) = v.parse() {
                self.vector_storage.dimension = n;
                self.embedding.dimension = n;
            }
        }
        if let Ok(v) = std::env::var("CODETRIEVER_MAX_TOKENS") {
            if let Ok(n) = v.parse() {
                self.chunking.max_tokens = n;
            }
        }
        if let Ok(v) = std::env::var("CODETRIEVER_CHARS_PER_TOKEN") {
            if let Ok(n) = v.parse() {
                self.chunking.chars_per_token = n;
            }
        }
        if let Ok(v) = std::env::var("CODETRIEVER_EMBED_BATCH") {
            if let Ok(n) = v.parse() {
                self.embedding.embed_batch = n;
                self.indexing.embed_batch = n;
            }
        }
        if let Ok(v) = std::env::var("CODETRIEVER_PROGRESS_INTERVAL") {
            if let Ok(n) = v.parse() {
                self.indexing.progress_interval = n;
            }
        }
        if let Ok(v) = std::env::var("CODETRIEVER_MAX_RETRIES") {
            if let Ok(n) = v.parse() {
                self.embedding.max_retries = n;
            }
        }
        if let Ok(v) = std::env::var("CODETRIEVER_BASE_DELAY_MS") {
            if let Ok(n) = v.parse() {
                self.embedding.base_delay_ms = n;
            }
        }
        if let Ok(v) = std::env::var("CODETRIEVER_ENDPOINT") {
            self.embedding.endpoint = v;
        }
        if let Ok(v) = std::env::var("CODETRIEVER_API_KEY") {
            self.embedding.api_key = Some(v.clone());
            self.chat.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("CODETRIEVER_EMBED_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("CODETRIEVER_CHAT_MODEL") {
            self.chat.model = v;
        }
        if let Ok(v) = std::env::var("CODETRIEVER_VECTOR_BACKEND_HOST") {
            self.vector_storage.host = v;
        }
        if let Ok(v) = std::env::var("CODETRIEVER_VECTOR_BACKEND_PORT") {
            if let Ok(n) = v.parse() {
                self.vector_storage.port = n;
            }
        }
        self
    }

    /// Load configuration from the environment, applying profile defaults
    /// then env-var overrides, and validate the result.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any section fails validation.
    pub fn load() -> ConfigResult<Self> {
        let profile = std::env::var("CODETRIEVER_PROFILE")
            .unwrap_or_else(|_| "development".to_string())
            .parse()
            .unwrap_or_default();
        let config = Self::with_profile(profile).with_env_overrides();
        config.validate()?;
        Ok(config)
    }
}

impl Validate for ApplicationConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.repo.validate()?;
        self.chunking.validate()?;
        self.embedding.validate()?;
        self.chat.validate()?;
        self.vector_storage.validate()?;
        self.indexing.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ApplicationConfig::default().validate().expect("defaults are valid");
    }

    #[test]
    fn env_overrides_apply() {
        // SAFETY: test runs single-threaded within this process's env mutation.
        unsafe {
            std::env::set_var("CODETRIEVER_MAX_TOKENS", "1234");
        }
        let config = ApplicationConfig::default().with_env_overrides();
        assert_eq!(config.chunking.max_tokens, 1234);
        unsafe {
            std::env::remove_var("CODETRIEVER_MAX_TOKENS");
        }
    }

    #[test]
    fn vector_storage_url_combines_host_and_port() {
        let config = VectorStorageConfig::default();
        assert_eq!(config.url(), "http://localhost:6334");
    }

    #[test]
    fn invalid_dimension_fails_validation() {
        let mut config = ApplicationConfig::default();
        config.vector_storage.dimension = 0;
        assert!(config.validate().is_err());
    }
}
