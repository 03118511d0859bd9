//! Provider abstractions for embeddings and vector storage
//!
//! Trait-based seams so the external embedding model and the record store
//! are injectable handles constructed once at startup and substitutable
//! with fakes in tests.

pub mod embedding;
pub mod local;
pub mod openai;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use local::SqliteVectorStore;
pub use openai::OpenAiEmbedder;
pub use vector_store::VectorStoreProvider;
