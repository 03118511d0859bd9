//! Bot registry entries

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bot owning documents and, transitively, their embedding records.
///
/// Generation parameters are consumed by response assembly; the retrieval
/// core itself only touches the embedding aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bot {
    /// Unique bot ID
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// System prompt the bot's answers start from
    pub prompt_template: String,
    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,
    /// Response token budget
    pub max_tokens: u32,
    /// Chat model identifier
    pub model: String,
    /// Aggregate of all embedding record ids across the bot's documents
    pub embedding_ids: Vec<Uuid>,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Bot {
    /// Create a bot with platform default generation parameters
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            prompt_template: "You are a helpful assistant.".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            model: "gpt-3.5-turbo".to_string(),
            embedding_ids: Vec::new(),
            created_at: chrono::Utc::now(),
        }
    }
}
