//! Bot registry endpoints
//!
//! Minimal surface: the retrieval core needs bots to exist so documents have
//! an owner and ingestion has an aggregate to register ids against. Full
//! CRUD, ownership checks, and API keys live in the platform backend.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{Bot, BotSummary, CreateBotRequest};

/// POST /api/bots - Create a bot
pub async fn create_bot(
    State(state): State<AppState>,
    Json(request): Json<CreateBotRequest>,
) -> Result<(StatusCode, Json<BotSummary>)> {
    if request.name.trim().is_empty() {
        return Err(Error::InvalidConfiguration(
            "Bot name must not be empty".to_string(),
        ));
    }

    let mut bot = Bot::new(request.name);
    if let Some(template) = request.prompt_template {
        bot.prompt_template = template;
    }
    if let Some(temperature) = request.temperature {
        bot.temperature = temperature.clamp(0.0, 2.0);
    }
    if let Some(max_tokens) = request.max_tokens {
        bot.max_tokens = max_tokens;
    }
    if let Some(model) = request.model {
        bot.model = model;
    }

    state.db().create_bot(&bot)?;
    tracing::info!("Created bot '{}' ({})", bot.name, bot.id);

    Ok((StatusCode::CREATED, Json(BotSummary::from(&bot))))
}

/// GET /api/bots/:bot_id - Fetch a bot
pub async fn get_bot(
    State(state): State<AppState>,
    Path(bot_id): Path<Uuid>,
) -> Result<Json<BotSummary>> {
    let bot = state
        .db()
        .get_bot(&bot_id)?
        .ok_or_else(|| Error::NotFound(format!("Bot {}", bot_id)))?;

    Ok(Json(BotSummary::from(&bot)))
}
