//! Document upload, status, listing, and deletion endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{
    Document, DocumentListResponse, DocumentStatusResponse, DocumentSummary, FileType,
    UploadRequest, UploadResponse,
};

/// POST /api/bots/:bot_id/documents - Upload a document for ingestion
///
/// Creates the document with status `pending` and enqueues an ingest job;
/// processing is asynchronous relative to this request.
pub async fn upload_document(
    State(state): State<AppState>,
    Path(bot_id): Path<Uuid>,
    Json(request): Json<UploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let file_type = FileType::parse(&request.file_type).ok_or_else(|| {
        Error::InvalidConfiguration(format!(
            "Unsupported file_type '{}' (expected pdf, txt, docx, or url)",
            request.file_type
        ))
    })?;

    // URL uploads may omit the file name and fall back to the URL itself
    let file_name = match (&file_type, &request.url) {
        (FileType::Url, Some(url)) if request.file_name.trim().is_empty() => url.clone(),
        _ => request.file_name.clone(),
    };
    if file_name.trim().is_empty() {
        return Err(Error::InvalidConfiguration(
            "file_name must not be empty".to_string(),
        ));
    }

    state
        .db()
        .get_bot(&bot_id)?
        .ok_or_else(|| Error::NotFound(format!("Bot {}", bot_id)))?;

    let doc = Document::new(bot_id, file_name, file_type, request.content);
    state.db().create_document(&doc)?;

    state.job_queue().submit(doc.id).await;
    tracing::info!(
        "Accepted '{}' ({}) for ingestion into bot {}",
        doc.file_name,
        doc.id,
        bot_id
    );

    Ok((StatusCode::CREATED, Json(UploadResponse::from(&doc))))
}

/// GET /api/bots/:bot_id/documents - List a bot's documents
pub async fn list_documents(
    State(state): State<AppState>,
    Path(bot_id): Path<Uuid>,
) -> Result<Json<DocumentListResponse>> {
    state
        .db()
        .get_bot(&bot_id)?
        .ok_or_else(|| Error::NotFound(format!("Bot {}", bot_id)))?;

    let documents: Vec<DocumentSummary> = state
        .db()
        .list_documents_by_bot(&bot_id)?
        .iter()
        .map(DocumentSummary::from)
        .collect();

    let total_count = documents.len();
    Ok(Json(DocumentListResponse {
        documents,
        total_count,
    }))
}

/// GET /api/documents/:document_id/status - Poll ingestion progress
pub async fn get_status(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentStatusResponse>> {
    let doc = state
        .db()
        .get_document(&document_id)?
        .ok_or_else(|| Error::NotFound(format!("Document {}", document_id)))?;

    Ok(Json(DocumentStatusResponse::from(&doc)))
}

/// DELETE /api/bots/:bot_id/documents/:document_id - Delete a document
///
/// Cascade-deletes the document's embedding records and detaches their ids
/// from the owning bot. Deleting an already-missing document is a no-op.
pub async fn delete_document(
    State(state): State<AppState>,
    Path((bot_id, document_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>> {
    state
        .db()
        .get_bot(&bot_id)?
        .ok_or_else(|| Error::NotFound(format!("Bot {}", bot_id)))?;

    match state
        .delete_document_with_records(&bot_id, &document_id)
        .await?
    {
        Some(removed) => Ok(Json(json!({
            "message": "Document deleted",
            "embeddings_removed": removed,
        }))),
        None => Ok(Json(json!({
            "message": "Document already deleted",
            "embeddings_removed": 0,
        }))),
    }
}
