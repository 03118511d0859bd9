//! botdock-rag: document ingestion and semantic retrieval for the Botdock
//! chatbot platform
//!
//! This crate implements the retrieval core behind Botdock bots: uploaded
//! documents are chunked, embedded through an external embedding model, and
//! stored as per-bot vector records that chat responses are grounded on via
//! cosine-similarity search.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use types::{
    bot::Bot,
    document::{Document, DocumentStatus, FileType},
    record::{EmbeddingRecord, RecordMetadata},
};
