use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kv_store::KvError;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::error::{AppError, AppResult};
use crate::jobs;
use crate::state::AppState;

#[derive(Serialize)]
pub struct JobsNumber {
    pub jobs: i64,
}

/// POST /request/job
/// Long poll for the next queued gateway event; the raw job payload is the
/// response body.
pub async fn request_job(State(state): State<AppState>) -> Response {
    match jobs::pop_job(&state.kv, state.config.job_poll_timeout).await {
        Err(KvError::NotFound) => (
            StatusCode::ACCEPTED,
            Json(json!({ "status": "No jobs available" })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "store error when popping job");
            AppError::Kv(e).into_response()
        }
        Ok(msg) if msg.is_empty() => {
            error!("nil job returned, despite no store errors");
            AppError::Fatal("nil job returned, despite no store errors".into()).into_response()
        }
        Ok(msg) => (StatusCode::OK, msg).into_response(),
    }
}

/// GET /jobs/count
pub async fn job_count(State(state): State<AppState>) -> AppResult<Json<JobsNumber>> {
    let jobs = jobs::job_count(&state.kv).await?;
    Ok(Json(JobsNumber { jobs }))
}
