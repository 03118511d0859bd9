//! Configuration for the retrieval service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Embedding API configuration
    pub embeddings: EmbeddingConfig,
    /// Text chunking configuration
    pub chunking: ChunkingConfig,
    /// Similarity search configuration
    pub search: SearchConfig,
    /// Ingestion processing configuration
    pub processing: ProcessingConfig,
    /// Registry/vector storage configuration
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file, falling back to defaults for
    /// missing sections. A missing file yields the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            tracing::warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::InvalidConfiguration(format!("{}: {}", path.display(), e)))
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size in bytes
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_body_bytes: 16 * 1024 * 1024, // 16MB of raw document text
        }
    }
}

/// Embedding API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Base URL of the OpenAI-compatible embedding API
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Embedding dimensions (1536 for text-embedding-ada-002)
    pub dimensions: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "text-embedding-ada-002".to_string(),
            dimensions: 1536,
            timeout_secs: 30,
            max_retries: 2,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl EmbeddingConfig {
    /// Resolve the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Similarity search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum candidate records fetched per bot before ranking
    pub candidate_limit: usize,
    /// Default number of results when the caller does not specify one
    pub default_top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            candidate_limit: 100,
            default_top_k: 5,
        }
    }
}

/// Ingestion processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Concurrent documents processed by the worker (None: CPU count, max 4)
    pub parallel_documents: Option<usize>,
    /// Concurrent in-flight embedding calls per document
    pub parallel_embeddings: usize,
    /// Retries for transient storage failures during ingestion
    pub storage_retries: u32,
    /// Initial backoff between storage retries in milliseconds
    pub storage_backoff_ms: u64,
    /// Capacity of the ingest job queue
    pub queue_capacity: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_documents: None,
            parallel_embeddings: 4,
            storage_retries: 3,
            storage_backoff_ms: 250,
            queue_capacity: 1000,
        }
    }
}

impl ProcessingConfig {
    /// Worker fan-out, auto-detected from CPU count when unset
    pub fn worker_parallelism(&self) -> usize {
        self.parallel_documents
            .unwrap_or_else(|| num_cpus::get().min(4))
            .max(1)
    }
}

/// Registry/vector storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite registry database
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let database_path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("botdock-rag")
            .join("registry.db");

        Self { database_path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_platform_settings() {
        let config = AppConfig::default();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.search.candidate_limit, 100);
        assert_eq!(config.search.default_top_k, 5);
        assert_eq!(config.embeddings.model, "text-embedding-ada-002");
    }

    #[test]
    fn load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[chunking]\nchunk_size = 500\n\n[server]\nport = 9999"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.chunking.chunk_size, 500);
        // Unspecified fields fall back to defaults
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.search.default_top_k, 5);
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let config = AppConfig::load(Some(Path::new("/nonexistent/botdock.toml"))).unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
