//! Request payloads for the HTTP API

use serde::{Deserialize, Serialize};

/// Request to create a bot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBotRequest {
    /// Display name
    pub name: String,
    /// System prompt (defaults to the platform template)
    #[serde(default)]
    pub prompt_template: Option<String>,
    /// Sampling temperature
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Response token budget
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Chat model identifier
    #[serde(default)]
    pub model: Option<String>,
}

/// Request to upload a document for ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Original file name (or URL title)
    pub file_name: String,
    /// Upload type: pdf | txt | docx | url
    pub file_type: String,
    /// Extracted text content
    #[serde(default)]
    pub content: String,
    /// Source URL for `url` uploads
    #[serde(default)]
    pub url: Option<String>,
}

/// Request for a semantic search over a bot's corpus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text, embedded and matched against stored chunks
    pub query: String,
    /// Number of results to return (default: 5)
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    5
}

impl SearchRequest {
    /// Create a new search request with the default limit
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: default_limit(),
        }
    }

    /// Set the number of results
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}
