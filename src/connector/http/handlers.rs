use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use super::error::ApiError;
use crate::application::{DeleteReport, DEFAULT_TOP_K};
use crate::connector::api::Container;
use crate::domain::{FileResponse, SearchQuery, SearchResult};

const UPLOAD_FIELD: &str = "file";
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub min_score: Option<f32>,
    #[serde(default)]
    pub file_names: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub content: String,
    pub file_name: String,
    pub file_id: Option<u64>,
    pub chunk_index: u32,
    pub score: f32,
}

impl From<&SearchResult> for SearchHit {
    fn from(result: &SearchResult) -> Self {
        let chunk = result.chunk();
        Self {
            content: chunk.content().to_string(),
            file_name: chunk.file_name().to_string(),
            file_id: chunk.file_id(),
            chunk_index: chunk.chunk_index(),
            score: result.score(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub session_id: String,
    pub sources: Vec<SearchHit>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn list_files(
    State(container): State<Arc<Container>>,
) -> ApiResult<Json<Vec<FileResponse>>> {
    let files = container.list_use_case().execute().await?;
    Ok(Json(files.iter().map(FileResponse::from).collect()))
}

pub async fn get_file(
    State(container): State<Arc<Container>>,
    file_id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<FileResponse>> {
    let Path(file_id) = file_id?;
    let record = container.list_use_case().get(file_id).await?;
    Ok(Json(record.to_response()))
}

/// Accepts a multipart form with a single `file` field.
pub async fn upload_file(
    State(container): State<Arc<Container>>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<FileResponse>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;

        info!("Received upload {} ({} bytes)", filename, bytes.len());
        let record = container
            .upload_use_case()
            .execute(&filename, &content_type, &bytes)
            .await?;
        return Ok((StatusCode::CREATED, Json(record.to_response())));
    }

    Err(ApiError::BadRequest("No file provided".to_string()))
}

pub async fn delete_file(
    State(container): State<Arc<Container>>,
    file_id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<DeleteReport>> {
    let Path(file_id) = file_id?;
    let report = container.delete_use_case().execute(file_id).await?;
    Ok(Json(report))
}

pub async fn ingest_file(
    State(container): State<Arc<Container>>,
    file_id: Result<Path<u64>, PathRejection>,
) -> ApiResult<Json<FileResponse>> {
    let Path(file_id) = file_id?;
    let record = container.ingest_use_case().ingest_file(file_id).await?;
    Ok(Json(record.to_response()))
}

pub async fn search(
    State(container): State<Arc<Container>>,
    request: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<SearchHit>>> {
    let Json(request) = request?;
    let mut query =
        SearchQuery::new(request.query).with_limit(request.top_k.unwrap_or(DEFAULT_TOP_K));
    if let Some(score) = request.min_score {
        query = query.with_min_score(score);
    }
    if let Some(names) = request.file_names {
        query = query.with_file_names(names);
    }

    let results = container.search_use_case().execute(query).await?;
    Ok(Json(results.iter().map(SearchHit::from).collect()))
}

pub async fn chat(
    State(container): State<Arc<Container>>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = request?;
    let sessions = container.chat_sessions().ok_or_else(|| {
        ApiError::Unavailable("No language model configured. Set OPENAI_API_KEY.".to_string())
    })?;

    let reply = sessions
        .ask(request.session_id.as_deref(), &request.question)
        .await?;

    Ok(Json(ChatResponse {
        answer: reply.answer.answer,
        session_id: reply.session_id,
        sources: reply.answer.sources.iter().map(SearchHit::from).collect(),
    }))
}
