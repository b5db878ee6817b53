use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::error::AppResult;
use crate::state::AppState;

/// POST /channels/:channel_id/messages/:message_id/reactions/:emoji/add
pub async fn add_reaction(
    State(state): State<AppState>,
    Path((channel_id, message_id, emoji)): Path<(String, String, String)>,
) -> AppResult<StatusCode> {
    let session = state.shards.any_session()?;
    session.add_reaction(&channel_id, &message_id, &emoji).await?;
    Ok(StatusCode::OK)
}

#[derive(Deserialize)]
pub struct RemoveReactionRequest {
    pub user_id: String,
}

/// POST /channels/:channel_id/messages/:message_id/reactions/:emoji/remove
pub async fn remove_reaction(
    State(state): State<AppState>,
    Path((channel_id, message_id, emoji)): Path<(String, String, String)>,
    Json(request): Json<RemoveReactionRequest>,
) -> AppResult<StatusCode> {
    let session = state.shards.any_session()?;
    session
        .remove_reaction(&channel_id, &message_id, &emoji, &request.user_id)
        .await?;
    Ok(StatusCode::OK)
}

/// POST /channels/:channel_id/messages/:message_id/reactions/clear
pub async fn remove_all_reactions(
    State(state): State<AppState>,
    Path((channel_id, message_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let session = state.shards.any_session()?;
    session.remove_all_reactions(&channel_id, &message_id).await?;
    Ok(StatusCode::OK)
}
