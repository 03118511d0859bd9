//! Vector store provider trait for embedding record persistence

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::types::EmbeddingRecord;

/// Trait for storing and retrieving embedding records
///
/// Implementations:
/// - `SqliteVectorStore`: registry-backed linear store
///
/// A multi-record insert carries no transactional guarantee; the owning
/// document's status field is the source of truth for whether an ingestion
/// completed. Corpora expected to exceed a few hundred chunks should swap in
/// an ANN-indexed implementation behind this same trait.
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Store records, returning their assigned ids in input order
    async fn insert_many(&self, records: Vec<EmbeddingRecord>) -> Result<Vec<Uuid>>;

    /// Fetch up to `limit` of a bot's records. Order is unspecified by the
    /// contract; the shipped implementation returns insertion order.
    async fn find_by_bot(&self, bot_id: Uuid, limit: usize) -> Result<Vec<EmbeddingRecord>>;

    /// Remove records by id; idempotent for already-missing ids. Returns the
    /// number actually removed.
    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<usize>;

    /// Remove all records owned by a document
    async fn delete_by_document(&self, document_id: Uuid) -> Result<usize>;

    /// Count records owned by a document
    async fn count_by_document(&self, document_id: Uuid) -> Result<usize>;

    /// Total records stored
    async fn len(&self) -> Result<usize>;

    /// Check if the store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Check if the provider is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
