//! Background processing: the ingest job queue and its worker

pub mod job_queue;
pub mod worker;

pub use job_queue::{IngestJob, JobOutcome, JobQueue, JobStats};
pub use worker::IngestWorker;
