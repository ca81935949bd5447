use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{debug, error};

use crate::domain::DomainError;

/// Error returned by HTTP handlers, rendered as `{"error": kind, "detail": message}`.
#[derive(Debug)]
pub enum ApiError {
    Domain(DomainError),
    BadRequest(String),
    /// A feature that needs an unconfigured backend, such as the LLM.
    Unavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Domain(e) => match e {
                DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                DomainError::ExtractionError(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::EmbeddingError(_) | DomainError::LlmError(_) => {
                    StatusCode::BAD_GATEWAY
                }
                DomainError::StorageError(_)
                | DomainError::IoError(_)
                | DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Domain(e) => match e {
                DomainError::NotFound(_) => "not_found",
                DomainError::InvalidInput(_) => "invalid_input",
                DomainError::ExtractionError(_) => "extraction_error",
                DomainError::EmbeddingError(_) => "embedding_error",
                DomainError::LlmError(_) => "llm_error",
                DomainError::StorageError(_) => "storage_error",
                DomainError::IoError(_) => "io_error",
                DomainError::Internal(_) => "internal_error",
            },
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unavailable(_) => "service_unavailable",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            ApiError::Domain(e) => e.detail(),
            ApiError::BadRequest(msg) | ApiError::Unavailable(msg) => msg.clone(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::Domain(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();

        if status.is_server_error() {
            error!("{} {}: {}", status.as_u16(), self.kind(), detail);
        } else {
            debug!("{} {}: {}", status.as_u16(), self.kind(), detail);
        }

        (status, Json(json!({ "error": self.kind(), "detail": detail }))).into_response()
    }
}
