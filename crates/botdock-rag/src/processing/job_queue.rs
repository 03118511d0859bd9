//! Queue of ingest jobs decoupling uploads from pipeline execution
//!
//! The queue itself is in-memory; durability comes from the document rows,
//! whose status column the worker re-scans on startup. That makes delivery
//! at-least-once: a job lost to a crash is re-created from its `pending` or
//! stuck-`processing` document.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// One unit of background work: ingest a single document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestJob {
    /// Document to process
    pub document_id: Uuid,
}

/// Live outcome of a submitted job, kept for queue statistics
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Queued,
    Processing,
    Complete,
    Failed,
}

/// Ingest job queue
pub struct JobQueue {
    sender: mpsc::Sender<IngestJob>,
    outcomes: Arc<DashMap<Uuid, JobOutcome>>,
    queued: Arc<AtomicUsize>,
}

impl JobQueue {
    /// Create a queue with the given capacity, returning the receiver the
    /// worker drains
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<IngestJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));

        let queue = Self {
            sender,
            outcomes: Arc::new(DashMap::new()),
            queued: Arc::new(AtomicUsize::new(0)),
        };

        (queue, receiver)
    }

    /// Enqueue an ingest job for a document
    pub async fn submit(&self, document_id: Uuid) -> bool {
        self.outcomes.insert(document_id, JobOutcome::Queued);

        match self.sender.send(IngestJob { document_id }).await {
            Ok(()) => {
                self.queued.fetch_add(1, Ordering::SeqCst);
                tracing::debug!("Queued ingest job for document {}", document_id);
                true
            }
            Err(e) => {
                tracing::error!("Failed to queue document {}: {}", document_id, e);
                self.outcomes.insert(document_id, JobOutcome::Failed);
                false
            }
        }
    }

    /// Record a job outcome transition
    pub fn mark(&self, document_id: Uuid, outcome: JobOutcome) {
        if matches!(outcome, JobOutcome::Complete | JobOutcome::Failed) {
            // Leaving the queue
            let _ = self
                .queued
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        }
        self.outcomes.insert(document_id, outcome);
    }

    /// Queue statistics
    pub fn stats(&self) -> JobStats {
        let mut stats = JobStats {
            queued: self.queued.load(Ordering::SeqCst),
            ..Default::default()
        };

        for entry in self.outcomes.iter() {
            match entry.value() {
                JobOutcome::Queued => {}
                JobOutcome::Processing => stats.processing += 1,
                JobOutcome::Complete => stats.complete += 1,
                JobOutcome::Failed => stats.failed += 1,
            }
        }
        stats.total_jobs = self.outcomes.len();

        stats
    }
}

/// Aggregate queue statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobStats {
    pub total_jobs: usize,
    pub queued: usize,
    pub processing: usize,
    pub complete: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submit_delivers_to_the_receiver() {
        let (queue, mut receiver) = JobQueue::new(8);
        let doc_id = Uuid::new_v4();

        assert!(queue.submit(doc_id).await);

        let job = receiver.recv().await.unwrap();
        assert_eq!(job.document_id, doc_id);
        assert_eq!(queue.stats().queued, 1);
    }

    #[tokio::test]
    async fn outcomes_show_up_in_stats() {
        let (queue, _receiver) = JobQueue::new(8);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        queue.submit(a).await;
        queue.submit(b).await;
        queue.mark(a, JobOutcome::Complete);
        queue.mark(b, JobOutcome::Failed);

        let stats = queue.stats();
        assert_eq!(stats.total_jobs, 2);
        assert_eq!(stats.complete, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.queued, 0);
    }
}
