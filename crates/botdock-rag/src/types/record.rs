//! Embedding records: one stored vector per document chunk

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Positional metadata stored alongside each vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordMetadata {
    /// Zero-based position of the chunk within its source document
    pub chunk_index: u32,
    /// Source file name, denormalized for result display
    pub source: String,
}

/// One chunk's vector representation. Immutable once created; removed only
/// when its owning document is deleted or a failed ingestion is purged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Unique record ID
    pub id: Uuid,
    /// Owning bot
    pub bot_id: Uuid,
    /// Owning document
    pub document_id: Uuid,
    /// Chunk text
    pub text: String,
    /// Embedding vector
    pub embedding: Vec<f32>,
    /// Chunk position and source
    pub metadata: RecordMetadata,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl EmbeddingRecord {
    /// Create a new record for a chunk
    pub fn new(
        bot_id: Uuid,
        document_id: Uuid,
        text: String,
        embedding: Vec<f32>,
        chunk_index: u32,
        source: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            bot_id,
            document_id,
            text,
            embedding,
            metadata: RecordMetadata { chunk_index, source },
            created_at: chrono::Utc::now(),
        }
    }
}
