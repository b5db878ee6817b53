use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::error::AppResult;
use crate::platform::{Channel, Embed, Message};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// POST /channels/:channel_id/messages
pub async fn send_message(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Json(request): Json<SendMessageRequest>,
) -> AppResult<Json<Message>> {
    let session = state.shards.any_session()?;
    Ok(Json(
        session.send_message(&channel_id, &request.content).await?,
    ))
}

/// POST /channels/:channel_id/messages/:message_id/embed
pub async fn edit_message_embed(
    State(state): State<AppState>,
    Path((channel_id, message_id)): Path<(String, String)>,
    Json(embed): Json<Embed>,
) -> AppResult<Json<Message>> {
    let session = state.shards.any_session()?;
    Ok(Json(
        session
            .edit_message_embed(&channel_id, &message_id, &embed)
            .await?,
    ))
}

/// POST /channels/:channel_id/messages/:message_id/delete
pub async fn delete_message(
    State(state): State<AppState>,
    Path((channel_id, message_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let session = state.shards.any_session()?;
    session.delete_message(&channel_id, &message_id).await?;
    Ok(StatusCode::OK)
}

/// POST /users/:user_id/channel
/// Open (or reuse) the bot's DM channel with a user.
pub async fn create_user_channel(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<Channel>> {
    let session = state.shards.any_session()?;
    Ok(Json(session.create_user_channel(&user_id).await?))
}
