use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use kv_store::KvError;
use serde_json::json;
use tracing::error;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /capture/task/:connect_code
/// Long poll for the next task addressed to a capture client.
pub async fn get_capture_task(
    State(state): State<AppState>,
    Path(connect_code): Path<String>,
) -> Response {
    match state
        .capture
        .next_task(&connect_code, state.config.task_poll_timeout)
        .await
    {
        Err(KvError::NotFound) => (
            StatusCode::ACCEPTED,
            Json(json!({ "status": "No tasks available" })),
        )
            .into_response(),
        Err(e) => {
            error!(%connect_code, error = %e, "store error when popping capture task");
            AppError::Kv(e).into_response()
        }
        Ok(task) if task.is_empty() => {
            error!(%connect_code, "nil task returned, despite no store errors");
            AppError::Fatal("nil task returned, despite no store errors".into()).into_response()
        }
        Ok(task) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            task,
        )
            .into_response(),
    }
}

/// POST /capture/status/:task_id
/// Capture clients report "true" or "false" here; the waiting dispatcher is
/// the single consumer of the ack.
pub async fn set_capture_task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    body: String,
) -> AppResult<StatusCode> {
    let complete = match body.trim() {
        "true" => true,
        "false" => false,
        other => {
            return Err(AppError::BadRequest(format!(
                "task status must be true or false, got {other:?}"
            )))
        }
    };
    state.capture.publish_status(&task_id, complete).await?;
    Ok(StatusCode::OK)
}
