//! Ingest queue observability

use axum::{extract::State, Json};

use crate::processing::JobStats;
use crate::server::state::AppState;

/// GET /api/jobs - Queue statistics
pub async fn queue_stats(State(state): State<AppState>) -> Json<JobStats> {
    Json(state.job_queue().stats())
}
