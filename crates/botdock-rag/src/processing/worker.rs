//! Background worker draining the ingest queue

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use crate::ingestion::IngestPipeline;
use crate::storage::RegistryDb;

use super::job_queue::{IngestJob, JobOutcome, JobQueue};

/// Worker that processes ingest jobs with a bounded document fan-out
pub struct IngestWorker {
    pipeline: Arc<IngestPipeline>,
    queue: Arc<JobQueue>,
    parallelism: usize,
}

impl IngestWorker {
    /// Create a worker
    pub fn new(pipeline: Arc<IngestPipeline>, queue: Arc<JobQueue>, parallelism: usize) -> Self {
        Self {
            pipeline,
            queue,
            parallelism: parallelism.max(1),
        }
    }

    /// Drain the queue until every sender is dropped.
    ///
    /// Each job runs as its own task; the semaphore bounds how many
    /// documents ingest concurrently. Per-document errors are already
    /// recorded on the document by the pipeline, so here they only feed the
    /// queue statistics.
    pub async fn run(self, mut receiver: mpsc::Receiver<IngestJob>) {
        tracing::info!(
            "Ingest worker started ({} concurrent documents)",
            self.parallelism
        );

        let semaphore = Arc::new(Semaphore::new(self.parallelism));

        while let Some(job) = receiver.recv().await {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };

            let pipeline = Arc::clone(&self.pipeline);
            let queue = Arc::clone(&self.queue);

            tokio::spawn(async move {
                let _permit = permit;
                queue.mark(job.document_id, JobOutcome::Processing);

                match pipeline.process(job.document_id).await {
                    Ok(()) => queue.mark(job.document_id, JobOutcome::Complete),
                    Err(e) => {
                        tracing::warn!("Ingest job for {} failed: {}", job.document_id, e);
                        queue.mark(job.document_id, JobOutcome::Failed);
                    }
                }
            });
        }

        tracing::info!("Ingest worker stopped");
    }

    /// Re-enqueue documents left `pending` or stuck in `processing` by a
    /// previous run. Returns how many were submitted.
    pub async fn recover(db: &RegistryDb, queue: &JobQueue) -> usize {
        let docs = match db.list_documents_needing_processing() {
            Ok(docs) => docs,
            Err(e) => {
                tracing::error!("Recovery scan failed: {}", e);
                return 0;
            }
        };

        let mut submitted = 0;
        for doc in docs {
            tracing::info!(
                "Recovering document '{}' ({}) left in {:?}",
                doc.file_name,
                doc.id,
                doc.status
            );
            if queue.submit(doc.id).await {
                submitted += 1;
            }
        }

        submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use uuid::Uuid;

    use crate::config::{ChunkingConfig, ProcessingConfig};
    use crate::error::Result;
    use crate::providers::{EmbeddingProvider, SqliteVectorStore};
    use crate::types::{Bot, Document, DocumentStatus, FileType};

    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn test_pipeline(db: &Arc<RegistryDb>) -> Arc<IngestPipeline> {
        let store = Arc::new(SqliteVectorStore::new(Arc::clone(db)));
        Arc::new(IngestPipeline::new(
            Arc::clone(db),
            Arc::new(StubEmbedder),
            store,
            ChunkingConfig::default(),
            ProcessingConfig::default(),
        ))
    }

    async fn wait_for_status(
        db: &RegistryDb,
        id: &Uuid,
        wanted: DocumentStatus,
    ) -> DocumentStatus {
        for _ in 0..100 {
            let doc = db.get_document(id).unwrap().unwrap();
            if doc.status == wanted {
                return doc.status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        db.get_document(id).unwrap().unwrap().status
    }

    #[tokio::test]
    async fn queued_document_reaches_completed() {
        let db = Arc::new(RegistryDb::in_memory().unwrap());
        let bot = Bot::new("bot".to_string());
        db.create_bot(&bot).unwrap();
        let doc = Document::new(
            bot.id,
            "notes.txt".to_string(),
            FileType::Txt,
            "a".repeat(1500),
        );
        db.create_document(&doc).unwrap();

        let (queue, receiver) = JobQueue::new(8);
        let queue = Arc::new(queue);
        let worker = IngestWorker::new(test_pipeline(&db), Arc::clone(&queue), 2);
        tokio::spawn(worker.run(receiver));

        queue.submit(doc.id).await;

        let status = wait_for_status(&db, &doc.id, DocumentStatus::Completed).await;
        assert_eq!(status, DocumentStatus::Completed);
    }

    #[tokio::test]
    async fn recovery_resubmits_interrupted_documents() {
        let db = Arc::new(RegistryDb::in_memory().unwrap());
        let bot = Bot::new("bot".to_string());
        db.create_bot(&bot).unwrap();

        let pending = Document::new(
            bot.id,
            "pending.txt".to_string(),
            FileType::Txt,
            "pending content".to_string(),
        );
        db.create_document(&pending).unwrap();

        let stuck = Document::new(
            bot.id,
            "stuck.txt".to_string(),
            FileType::Txt,
            "stuck content".to_string(),
        );
        db.create_document(&stuck).unwrap();
        db.update_document_status(&stuck.id, DocumentStatus::Processing, None)
            .unwrap();

        let (queue, mut receiver) = JobQueue::new(8);
        let submitted = IngestWorker::recover(&db, &queue).await;
        assert_eq!(submitted, 2);

        let mut recovered = vec![
            receiver.recv().await.unwrap().document_id,
            receiver.recv().await.unwrap().document_id,
        ];
        recovered.sort();
        let mut expected = vec![pending.id, stuck.id];
        expected.sort();
        assert_eq!(recovered, expected);
    }
}
