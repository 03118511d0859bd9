//! Semantic search over a bot's stored embedding records

use std::sync::Arc;
use uuid::Uuid;

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorStoreProvider};
use crate::types::response::SearchResultItem;
use crate::types::EmbeddingRecord;

use super::similarity::rank;

/// A candidate record with its similarity against the query
#[derive(Debug, Clone)]
pub struct RankedMatch {
    /// The matched record
    pub record: EmbeddingRecord,
    /// Cosine similarity (-1.0 to 1.0, higher is closer)
    pub similarity: f32,
}

impl RankedMatch {
    /// Convert to the API result shape
    pub fn into_result_item(self) -> SearchResultItem {
        SearchResultItem {
            text: self.record.text,
            similarity: self.similarity,
            chunk_index: self.record.metadata.chunk_index,
            source: self.record.metadata.source,
            document_id: self.record.document_id,
        }
    }
}

/// Similarity search engine.
///
/// Embeds the query, fetches the bot's candidate pool bounded by
/// `candidate_limit`, and ranks by cosine similarity. The pool bound makes
/// this approximate once a corpus outgrows it; swapping the store behind
/// [`VectorStoreProvider`] for a real index is the upgrade path and does not
/// change this interface.
pub struct SearchEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    config: SearchConfig,
}

impl SearchEngine {
    /// Create a search engine over the given providers
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
        config: SearchConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    /// Search a bot's corpus for the chunks closest to `query`.
    ///
    /// A bot with no stored records yields an empty list, not an error.
    pub async fn search(
        &self,
        bot_id: Uuid,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RankedMatch>> {
        let top_k = if limit == 0 {
            self.config.default_top_k
        } else {
            limit
        };

        let query_embedding = self.embedder.embed(query).await?;

        let pool = self
            .store
            .find_by_bot(bot_id, self.config.candidate_limit)
            .await?;

        if pool.is_empty() {
            return Ok(Vec::new());
        }

        // Ranking is CPU-bound; keep it off the request-handling threads
        let ranked = tokio::task::spawn_blocking(move || rank(&query_embedding, pool, top_k))
            .await
            .map_err(|e| Error::Internal(format!("ranking task failed: {}", e)))?;

        Ok(ranked)
    }

    /// Default result count when the caller does not specify one
    pub fn default_top_k(&self) -> usize {
        self.config.default_top_k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::RwLock;

    /// Deterministic embedder: maps text to a small vector derived from its
    /// bytes, so equal text always produces the identical vector.
    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(stub_vector(text))
        }

        fn dimensions(&self) -> usize {
            4
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn stub_vector(text: &str) -> Vec<f32> {
        let bytes = text.as_bytes();
        let sum: u32 = bytes.iter().map(|b| *b as u32).sum();
        vec![
            bytes.len() as f32,
            sum as f32,
            bytes.first().copied().unwrap_or(0) as f32,
            bytes.last().copied().unwrap_or(0) as f32,
        ]
    }

    /// In-memory store preserving insertion order per bot.
    #[derive(Default)]
    struct StubStore {
        records: RwLock<Vec<EmbeddingRecord>>,
    }

    #[async_trait]
    impl VectorStoreProvider for StubStore {
        async fn insert_many(&self, records: Vec<EmbeddingRecord>) -> Result<Vec<Uuid>> {
            let ids = records.iter().map(|r| r.id).collect();
            self.records.write().extend(records);
            Ok(ids)
        }

        async fn find_by_bot(&self, bot_id: Uuid, limit: usize) -> Result<Vec<EmbeddingRecord>> {
            Ok(self
                .records
                .read()
                .iter()
                .filter(|r| r.bot_id == bot_id)
                .take(limit)
                .cloned()
                .collect())
        }

        async fn delete_by_ids(&self, ids: &[Uuid]) -> Result<usize> {
            let mut records = self.records.write();
            let before = records.len();
            records.retain(|r| !ids.contains(&r.id));
            Ok(before - records.len())
        }

        async fn delete_by_document(&self, document_id: Uuid) -> Result<usize> {
            let mut records = self.records.write();
            let before = records.len();
            records.retain(|r| r.document_id != document_id);
            Ok(before - records.len())
        }

        async fn count_by_document(&self, document_id: Uuid) -> Result<usize> {
            Ok(self
                .records
                .read()
                .iter()
                .filter(|r| r.document_id == document_id)
                .count())
        }

        async fn len(&self) -> Result<usize> {
            Ok(self.records.read().len())
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    async fn seed_store(store: &StubStore, bot_id: Uuid, texts: &[&str]) {
        let document_id = Uuid::new_v4();
        let records: Vec<EmbeddingRecord> = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                EmbeddingRecord::new(
                    bot_id,
                    document_id,
                    text.to_string(),
                    stub_vector(text),
                    i as u32,
                    "notes.txt".to_string(),
                )
            })
            .collect();
        store.insert_many(records).await.unwrap();
    }

    #[tokio::test]
    async fn query_matching_a_stored_chunk_returns_it_with_similarity_one() {
        let store = Arc::new(StubStore::default());
        let bot_id = Uuid::new_v4();
        seed_store(
            &store,
            bot_id,
            &["alpha pricing notes", "beta refund policy", "gamma onboarding"],
        )
        .await;

        let engine = SearchEngine::new(Arc::new(StubEmbedder), store, SearchConfig::default());

        let results = engine
            .search(bot_id, "beta refund policy", 1)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.text, "beta refund policy");
        assert!((results[0].similarity - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn empty_corpus_returns_empty_results() {
        let store = Arc::new(StubStore::default());
        let engine = SearchEngine::new(Arc::new(StubEmbedder), store, SearchConfig::default());

        let results = engine
            .search(Uuid::new_v4(), "anything", 5)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn results_are_scoped_to_the_requested_bot() {
        let store = Arc::new(StubStore::default());
        let bot_a = Uuid::new_v4();
        let bot_b = Uuid::new_v4();
        seed_store(&store, bot_a, &["shared phrasing"]).await;
        seed_store(&store, bot_b, &["other corpus"]).await;

        let engine = SearchEngine::new(Arc::new(StubEmbedder), store, SearchConfig::default());

        let results = engine.search(bot_b, "shared phrasing", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.text, "other corpus");
    }

    #[tokio::test]
    async fn zero_limit_falls_back_to_default_top_k() {
        let store = Arc::new(StubStore::default());
        let bot_id = Uuid::new_v4();
        seed_store(
            &store,
            bot_id,
            &["one", "two", "three", "four", "five", "six", "seven"],
        )
        .await;

        let engine = SearchEngine::new(Arc::new(StubEmbedder), store, SearchConfig::default());
        let results = engine.search(bot_id, "one", 0).await.unwrap();
        assert_eq!(results.len(), engine.default_top_k());
    }
}
