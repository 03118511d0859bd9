//! Semantic search endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{SearchRequest, SearchResponse};

/// POST /api/bots/:bot_id/search - Rank a bot's chunks against a query
///
/// A bot with no completed documents yields an empty result list.
pub async fn search(
    State(state): State<AppState>,
    Path(bot_id): Path<Uuid>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    if request.query.trim().is_empty() {
        return Err(Error::InvalidConfiguration(
            "query must not be empty".to_string(),
        ));
    }

    state
        .db()
        .get_bot(&bot_id)?
        .ok_or_else(|| Error::NotFound(format!("Bot {}", bot_id)))?;

    let matches = state
        .search_engine()
        .search(bot_id, &request.query, request.limit)
        .await?;

    tracing::debug!(
        "Search for bot {} returned {} results",
        bot_id,
        matches.len()
    );

    Ok(Json(SearchResponse {
        results: matches.into_iter().map(|m| m.into_result_item()).collect(),
    }))
}
