use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::db::StorageError;

#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    message: String,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Logs the storage failure and hides it behind a generic 500.
pub(crate) fn storage_error(error: StorageError, action: &'static str) -> ErrorResponse {
    tracing::error!(?error, action, "storage operation failed");
    ErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR, "Database error")
}
