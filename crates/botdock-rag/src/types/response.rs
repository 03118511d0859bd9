//! Response payloads for the HTTP API

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bot::Bot;
use super::document::{Document, DocumentStatus, FileType};

/// Summary of a bot (omits the embedding aggregate)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSummary {
    pub id: Uuid,
    pub name: String,
    pub prompt_template: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub model: String,
    pub embedding_count: usize,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Bot> for BotSummary {
    fn from(bot: &Bot) -> Self {
        Self {
            id: bot.id,
            name: bot.name.clone(),
            prompt_template: bot.prompt_template.clone(),
            temperature: bot.temperature,
            max_tokens: bot.max_tokens,
            model: bot.model.clone(),
            embedding_count: bot.embedding_ids.len(),
            created_at: bot.created_at,
        }
    }
}

/// Response to a document upload: the created record, ingestion pending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub id: Uuid,
    pub file_name: String,
    pub status: DocumentStatus,
}

impl From<&Document> for UploadResponse {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            file_name: doc.file_name.clone(),
            status: doc.status,
        }
    }
}

/// Summary of a document for listings (omits content)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: Uuid,
    pub bot_id: Uuid,
    pub file_name: String,
    pub file_type: FileType,
    pub status: DocumentStatus,
    pub embedding_count: usize,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            bot_id: doc.bot_id,
            file_name: doc.file_name.clone(),
            file_type: doc.file_type,
            status: doc.status,
            embedding_count: doc.embedding_count(),
            created_at: doc.created_at,
        }
    }
}

/// Response for listing a bot's documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentSummary>,
    pub total_count: usize,
}

/// Polled ingestion progress for one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStatusResponse {
    pub id: Uuid,
    pub file_name: String,
    pub status: DocumentStatus,
    pub embedding_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Document> for DocumentStatusResponse {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            file_name: doc.file_name.clone(),
            status: doc.status,
            embedding_count: doc.embedding_count(),
            error: doc.error.clone(),
        }
    }
}

/// One ranked search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultItem {
    /// Matched chunk text
    pub text: String,
    /// Cosine similarity against the query (-1.0 to 1.0)
    pub similarity: f32,
    /// Position of the chunk within its source document
    pub chunk_index: u32,
    /// Source file name
    pub source: String,
    /// Owning document
    pub document_id: Uuid,
}

/// Response to a semantic search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResultItem>,
}
