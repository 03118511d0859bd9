//! Core types for the retrieval service

pub mod bot;
pub mod document;
pub mod query;
pub mod record;
pub mod response;

pub use bot::Bot;
pub use document::{Document, DocumentStatus, FileType};
pub use query::{CreateBotRequest, SearchRequest, UploadRequest};
pub use record::{EmbeddingRecord, RecordMetadata};
pub use response::{
    BotSummary, DocumentListResponse, DocumentStatusResponse, DocumentSummary, SearchResponse,
    SearchResultItem, UploadResponse,
};
