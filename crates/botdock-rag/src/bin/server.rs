//! Retrieval server binary
//!
//! Run with: cargo run -p botdock-rag --bin botdock-rag-server

use std::path::PathBuf;

use botdock_rag::{config::AppConfig, providers::OpenAiEmbedder, server::ApiServer};
use botdock_rag::providers::EmbeddingProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "botdock_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("BOTDOCK_RAG_CONFIG")
        .ok()
        .map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);
    tracing::info!("  - Chunk overlap: {}", config.chunking.chunk_overlap);

    if config.embeddings.api_key().is_none() {
        tracing::warn!(
            "No API key in ${}; embedding calls will be unauthenticated",
            config.embeddings.api_key_env
        );
    }

    // Probe the embedding API so misconfiguration shows up at startup
    // rather than on the first upload
    let probe = OpenAiEmbedder::new(&config.embeddings)?;
    match probe.health_check().await {
        Ok(true) => tracing::info!("Embedding API reachable at {}", config.embeddings.base_url),
        _ => tracing::warn!(
            "Embedding API not reachable at {}; ingestion will fail until it is",
            config.embeddings.base_url
        ),
    }

    let server = ApiServer::new(config).await?;

    tracing::info!("API: http://{}", server.address());
    tracing::info!("Health: http://{}/health", server.address());

    server.start().await?;

    Ok(())
}
