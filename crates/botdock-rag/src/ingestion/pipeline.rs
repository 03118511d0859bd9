//! End-to-end ingestion of one uploaded document
//!
//! Drives the document state machine `pending -> processing -> {completed |
//! failed}`: chunk the content, embed every chunk under a bounded fan-out,
//! bulk-insert the records, then attach the ordered id list to the document
//! and register it on the owning bot. Any failure purges the document's
//! records before marking it failed, so a retry always starts from a clean
//! slate.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use uuid::Uuid;

use crate::config::{ChunkingConfig, ProcessingConfig};
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::storage::RegistryDb;
use crate::types::{Document, DocumentStatus, EmbeddingRecord};

use super::chunker::Chunker;

/// Ingestion pipeline over injectable provider handles
pub struct IngestPipeline {
    db: Arc<RegistryDb>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    chunking: ChunkingConfig,
    processing: ProcessingConfig,
}

impl IngestPipeline {
    /// Create a pipeline
    pub fn new(
        db: Arc<RegistryDb>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        chunking: ChunkingConfig,
        processing: ProcessingConfig,
    ) -> Self {
        Self {
            db,
            embedder,
            store,
            chunking,
            processing,
        }
    }

    /// Process one document end to end.
    ///
    /// Safe to re-invoke on a `failed` document: any records left from a
    /// previous attempt are purged before re-chunking. Provider failures are
    /// converted into a `failed` status on the document; the returned error
    /// mirrors what was recorded.
    pub async fn process(&self, document_id: Uuid) -> Result<()> {
        // Misconfiguration is rejected before any state transition
        let chunker = Chunker::new(self.chunking.chunk_size, self.chunking.chunk_overlap)?;

        let doc = self
            .db
            .get_document(&document_id)?
            .ok_or_else(|| Error::NotFound(format!("Document {}", document_id)))?;

        // Clean slate: drop orphans from any previous failed attempt
        let purged = self.store.delete_by_document(document_id).await?;
        if purged > 0 {
            tracing::info!(
                "Purged {} stale records for document {} before reprocessing",
                purged,
                document_id
            );
        }

        self.db
            .update_document_status(&document_id, DocumentStatus::Processing, None)?;

        match self.run(&doc, &chunker).await {
            Ok(ids) => {
                self.db.complete_document(&document_id, &ids)?;
                self.db.add_bot_embeddings(&doc.bot_id, &ids)?;
                tracing::info!(
                    "Ingested '{}': {} chunks embedded and stored",
                    doc.file_name,
                    ids.len()
                );
                Ok(())
            }
            Err(e) => {
                // Leave nothing behind for a retry to trip over
                if let Err(purge_err) = self.store.delete_by_document(document_id).await {
                    tracing::error!(
                        "Failed to purge records for failed document {}: {}",
                        document_id,
                        purge_err
                    );
                }

                let message = e.to_string();
                // The document may have been deleted mid-flight; its cascade
                // already covers cleanup in that case
                if self.db.get_document(&document_id)?.is_some() {
                    self.db.update_document_status(
                        &document_id,
                        DocumentStatus::Failed,
                        Some(&message),
                    )?;
                }

                tracing::error!("Ingestion failed for '{}': {}", doc.file_name, message);
                Err(e)
            }
        }
    }

    /// Chunk, embed, and store; returns the ordered record id list
    async fn run(&self, doc: &Document, chunker: &Chunker) -> Result<Vec<Uuid>> {
        let chunks: Vec<String> = chunker
            .split(&doc.content)
            .into_iter()
            .map(str::to_string)
            .collect();

        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!("'{}': {} chunks to embed", doc.file_name, chunks.len());

        // Indices are assigned before dispatch, so concurrent completion
        // order cannot reorder the result list
        let semaphore = Arc::new(Semaphore::new(self.processing.parallel_embeddings.max(1)));
        let embed_futures = chunks.into_iter().enumerate().map(|(index, text)| {
            let embedder = Arc::clone(&self.embedder);
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| Error::Internal(format!("semaphore closed: {}", e)))?;

                let embedding = embedder.embed(&text).await.map_err(|e| {
                    Error::EmbeddingFailed {
                        chunk_index: index as u32,
                        message: e.to_string(),
                    }
                })?;

                Ok::<_, Error>((index, text, embedding))
            }
        });

        let mut records = Vec::new();
        for result in join_all(embed_futures).await {
            let (index, text, embedding) = result?;
            records.push(EmbeddingRecord::new(
                doc.bot_id,
                doc.id,
                text,
                embedding,
                index as u32,
                doc.file_name.clone(),
            ));
        }

        // Existence check: don't re-create records for a document deleted
        // while its chunks were embedding
        if self.db.get_document(&doc.id)?.is_none() {
            return Err(Error::NotFound(format!(
                "Document {} removed during ingestion",
                doc.id
            )));
        }

        let ids = self.insert_with_retry(records).await?;

        // Reconcile: the document may have been deleted during the insert
        if self.db.get_document(&doc.id)?.is_none() {
            self.store.delete_by_ids(&ids).await?;
            return Err(Error::NotFound(format!(
                "Document {} removed during ingestion",
                doc.id
            )));
        }

        Ok(ids)
    }

    /// Insert with bounded retry and exponential backoff on transient
    /// storage failures. A retry purges the document's records first so a
    /// partial insert cannot leave duplicates.
    async fn insert_with_retry(&self, records: Vec<EmbeddingRecord>) -> Result<Vec<Uuid>> {
        let document_id = records[0].document_id;
        let mut attempt = 0u32;

        loop {
            match self.store.insert_many(records.clone()).await {
                Ok(ids) => return Ok(ids),
                Err(Error::Storage(message)) if attempt < self.processing.storage_retries => {
                    attempt += 1;
                    let delay = Duration::from_millis(
                        self.processing.storage_backoff_ms * 2u64.pow(attempt - 1),
                    );
                    tracing::warn!(
                        "Storage insert failed (attempt {}/{}): {}; retrying in {:?}",
                        attempt,
                        self.processing.storage_retries,
                        message,
                        delay
                    );
                    sleep(delay).await;
                    self.store.delete_by_document(document_id).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
