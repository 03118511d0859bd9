//! Application state for the retrieval service
//!
//! All providers are constructed once here and handed around as `Arc`
//! handles; nothing reaches for a global client.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::generation::ResponseAssembler;
use crate::ingestion::IngestPipeline;
use crate::processing::{IngestWorker, JobQueue};
use crate::providers::{EmbeddingProvider, OpenAiEmbedder, SqliteVectorStore, VectorStoreProvider};
use crate::retrieval::SearchEngine;
use crate::storage::RegistryDb;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    db: Arc<RegistryDb>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStoreProvider>,
    search_engine: Arc<SearchEngine>,
    assembler: Arc<ResponseAssembler>,
    job_queue: Arc<JobQueue>,
    ready: RwLock<bool>,
}

impl AppState {
    /// Create the application state, spawn the ingest worker, and re-enqueue
    /// documents interrupted by a previous run.
    pub async fn new(config: AppConfig) -> Result<Self> {
        let db = Arc::new(RegistryDb::new(&config.storage.database_path)?);
        tracing::info!(
            "Registry opened at {}",
            config.storage.database_path.display()
        );

        let embedding_provider: Arc<dyn EmbeddingProvider> =
            Arc::new(OpenAiEmbedder::new(&config.embeddings)?);
        tracing::info!(
            "Embedding provider initialized ({}, {} dims)",
            config.embeddings.model,
            config.embeddings.dimensions
        );

        let vector_store: Arc<dyn VectorStoreProvider> =
            Arc::new(SqliteVectorStore::new(Arc::clone(&db)));

        let search_engine = Arc::new(SearchEngine::new(
            Arc::clone(&embedding_provider),
            Arc::clone(&vector_store),
            config.search.clone(),
        ));

        let assembler = Arc::new(ResponseAssembler::new(
            Arc::clone(&db),
            Arc::clone(&search_engine),
        ));

        let pipeline = Arc::new(IngestPipeline::new(
            Arc::clone(&db),
            Arc::clone(&embedding_provider),
            Arc::clone(&vector_store),
            config.chunking.clone(),
            config.processing.clone(),
        ));

        let (job_queue, receiver) = JobQueue::new(config.processing.queue_capacity);
        let job_queue = Arc::new(job_queue);

        let worker = IngestWorker::new(
            pipeline,
            Arc::clone(&job_queue),
            config.processing.worker_parallelism(),
        );
        tokio::spawn(worker.run(receiver));

        // At-least-once delivery: pick up documents a previous process left
        // pending or mid-processing
        let recovered = IngestWorker::recover(&db, &job_queue).await;
        if recovered > 0 {
            tracing::info!("Re-enqueued {} interrupted documents", recovered);
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                embedding_provider,
                vector_store,
                search_engine,
                assembler,
                job_queue,
                ready: RwLock::new(true),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the registry handle
    pub fn db(&self) -> &Arc<RegistryDb> {
        &self.inner.db
    }

    /// Get the embedding provider
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedding_provider
    }

    /// Get the vector store
    pub fn vector_store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.inner.vector_store
    }

    /// Get the search engine
    pub fn search_engine(&self) -> &Arc<SearchEngine> {
        &self.inner.search_engine
    }

    /// Get the response assembler
    pub fn assembler(&self) -> &Arc<ResponseAssembler> {
        &self.inner.assembler
    }

    /// Get the job queue
    pub fn job_queue(&self) -> &Arc<JobQueue> {
        &self.inner.job_queue
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    /// Cascade-delete a document: remove its embedding records and detach
    /// their ids from the owning bot. Returns the number of records removed,
    /// or `None` when the document was already gone (a no-op, not an error).
    pub async fn delete_document_with_records(
        &self,
        bot_id: &uuid::Uuid,
        document_id: &uuid::Uuid,
    ) -> Result<Option<usize>> {
        let Some(doc) = self.inner.db.delete_document(document_id)? else {
            return Ok(None);
        };

        let removed = self
            .inner
            .vector_store
            .delete_by_document(*document_id)
            .await?;
        self.inner
            .db
            .remove_bot_embeddings(bot_id, &doc.embedding_ids)?;

        tracing::info!(
            "Deleted '{}' ({}): {} embedding records removed",
            doc.file_name,
            document_id,
            removed
        );

        Ok(Some(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use uuid::Uuid;

    use crate::types::{Bot, Document, EmbeddingRecord, FileType};

    async fn test_state() -> (AppState, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.database_path = dir.path().join("registry.db");
        let state = AppState::new(config).await.unwrap();
        (state, dir)
    }

    #[tokio::test]
    async fn cascade_delete_removes_records_and_detaches_ids() {
        let (state, _dir) = test_state().await;
        let db = state.db();

        let bot = Bot::new("bot".to_string());
        db.create_bot(&bot).unwrap();
        let doc = Document::new(
            bot.id,
            "faq.txt".to_string(),
            FileType::Txt,
            "content".to_string(),
        );
        db.create_document(&doc).unwrap();

        let records: Vec<EmbeddingRecord> = (0..4)
            .map(|i| {
                EmbeddingRecord::new(
                    bot.id,
                    doc.id,
                    format!("chunk {}", i),
                    vec![i as f32, 1.0],
                    i as u32,
                    doc.file_name.clone(),
                )
            })
            .collect();
        let ids = db.insert_embeddings(&records).unwrap();
        db.complete_document(&doc.id, &ids).unwrap();
        db.add_bot_embeddings(&bot.id, &ids).unwrap();

        let removed = state
            .delete_document_with_records(&bot.id, &doc.id)
            .await
            .unwrap();
        assert_eq!(removed, Some(4));

        assert!(db.get_document(&doc.id).unwrap().is_none());
        assert_eq!(db.count_embeddings_by_document(&doc.id).unwrap(), 0);
        assert!(db.get_bot(&bot.id).unwrap().unwrap().embedding_ids.is_empty());
    }

    #[tokio::test]
    async fn deleting_missing_document_is_a_noop() {
        let (state, _dir) = test_state().await;
        let bot = Bot::new("bot".to_string());
        state.db().create_bot(&bot).unwrap();

        let removed = state
            .delete_document_with_records(&bot.id, &Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(removed, None);
    }
}
