//! Registry-backed vector store
//!
//! Bridges the synchronous SQLite registry onto the async provider trait by
//! running every call on the blocking thread pool.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::RegistryDb;
use crate::types::EmbeddingRecord;

use super::vector_store::VectorStoreProvider;

/// Vector store over the SQLite registry
pub struct SqliteVectorStore {
    db: Arc<RegistryDb>,
}

impl SqliteVectorStore {
    /// Create from a shared registry handle
    pub fn new(db: Arc<RegistryDb>) -> Self {
        Self { db }
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<RegistryDb>) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || f(db))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl VectorStoreProvider for SqliteVectorStore {
    async fn insert_many(&self, records: Vec<EmbeddingRecord>) -> Result<Vec<Uuid>> {
        self.run_blocking(move |db| db.insert_embeddings(&records))
            .await
    }

    async fn find_by_bot(&self, bot_id: Uuid, limit: usize) -> Result<Vec<EmbeddingRecord>> {
        self.run_blocking(move |db| db.find_embeddings_by_bot(&bot_id, limit))
            .await
    }

    async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<usize> {
        let ids = ids.to_vec();
        self.run_blocking(move |db| db.delete_embeddings_by_ids(&ids))
            .await
    }

    async fn delete_by_document(&self, document_id: Uuid) -> Result<usize> {
        self.run_blocking(move |db| db.delete_embeddings_by_document(&document_id))
            .await
    }

    async fn count_by_document(&self, document_id: Uuid) -> Result<usize> {
        self.run_blocking(move |db| db.count_embeddings_by_document(&document_id))
            .await
    }

    async fn len(&self) -> Result<usize> {
        self.run_blocking(move |db| db.count_embeddings()).await
    }

    async fn health_check(&self) -> Result<bool> {
        // The registry is process-local; reachable if the count query runs
        Ok(self.run_blocking(move |db| db.count_embeddings()).await.is_ok())
    }

    fn name(&self) -> &str {
        "sqlite-registry"
    }
}
