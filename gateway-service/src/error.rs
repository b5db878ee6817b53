use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kv_store::KvError;
use thiserror::Error;

use crate::platform::PlatformError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("store error: {0}")]
    Kv(#[from] KvError),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Invariant violated; aborts the request, never the process.
    #[error("{0}")]
    Fatal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
