//! Retrieval-augmented prompt assembly
//!
//! At message time the incoming query is embedded, the bot's corpus is
//! searched, and the retrieved chunks are merged with the bot's prompt
//! template into the prompt handed to the chat model. The chat-model call
//! itself belongs to the conversation layer, not this crate.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::retrieval::{RankedMatch, SearchEngine};
use crate::storage::RegistryDb;
use crate::types::Bot;

/// Prompt builder for grounded responses
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build a context block from retrieved chunks
    pub fn build_context(matches: &[RankedMatch]) -> String {
        let mut context = String::new();

        for (i, m) in matches.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {} (chunk {})\n{}\n\n---\n\n",
                i + 1,
                m.record.metadata.source,
                m.record.metadata.chunk_index,
                m.record.text
            ));
        }

        context
    }

    /// Merge the bot's template with retrieved context into a system prompt
    pub fn build_system_prompt(bot: &Bot, context: &str) -> String {
        if context.is_empty() {
            return bot.prompt_template.clone();
        }

        format!(
            r#"{template}

Use the following excerpts from the bot's knowledge base to ground your answer. Prefer this material over general knowledge; if it does not cover the question, say so.

KNOWLEDGE BASE EXCERPTS:
{context}"#,
            template = bot.prompt_template,
            context = context
        )
    }
}

/// A fully assembled prompt ready for the chat model
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    /// System prompt: bot template merged with retrieved context
    pub system: String,
    /// The user's message, unchanged
    pub user_message: String,
    /// The chunks that were merged in, for citation display
    pub context: Vec<RankedMatch>,
    /// Generation parameters carried from the bot
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Assembles retrieval-grounded prompts for a bot's conversations
pub struct ResponseAssembler {
    db: Arc<RegistryDb>,
    search: Arc<SearchEngine>,
}

impl ResponseAssembler {
    /// Create an assembler over the registry and search engine
    pub fn new(db: Arc<RegistryDb>, search: Arc<SearchEngine>) -> Self {
        Self { db, search }
    }

    /// Assemble the prompt for one incoming message.
    ///
    /// A bot with no ingested documents gets its bare template; retrieval
    /// failures propagate rather than silently degrading to an ungrounded
    /// prompt.
    pub async fn assemble(&self, bot_id: Uuid, message: &str) -> Result<AssembledPrompt> {
        let bot = self
            .db
            .get_bot(&bot_id)?
            .ok_or_else(|| Error::NotFound(format!("Bot {}", bot_id)))?;

        let matches = self
            .search
            .search(bot_id, message, self.search.default_top_k())
            .await?;

        let context = PromptBuilder::build_context(&matches);
        let system = PromptBuilder::build_system_prompt(&bot, &context);

        Ok(AssembledPrompt {
            system,
            user_message: message.to_string(),
            context: matches,
            model: bot.model,
            temperature: bot.temperature,
            max_tokens: bot.max_tokens,
        })
    }
}
