use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::error::AppResult;
use crate::keys;
use crate::platform::{Channel, Emoji, Guild, Member, Role};
use crate::state::AppState;

/// POST /guilds/:guild_id
pub async fn get_guild(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
) -> AppResult<Json<Guild>> {
    let session = state.shards.session_for_guild(&guild_id)?;
    Ok(Json(session.get_guild(&guild_id).await?))
}

/// POST /guilds/:guild_id/channels
pub async fn get_guild_channels(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
) -> AppResult<Json<Vec<Channel>>> {
    let session = state.shards.session_for_guild(&guild_id)?;
    Ok(Json(session.get_guild_channels(&guild_id).await?))
}

/// POST /guilds/:guild_id/members/:user_id
pub async fn get_guild_member(
    State(state): State<AppState>,
    Path((guild_id, user_id)): Path<(String, String)>,
) -> AppResult<Json<Member>> {
    let session = state.shards.session_for_guild(&guild_id)?;
    Ok(Json(session.get_guild_member(&guild_id, &user_id).await?))
}

/// POST /guilds/:guild_id/roles
pub async fn get_guild_roles(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
) -> AppResult<Json<Vec<Role>>> {
    let session = state.shards.session_for_guild(&guild_id)?;
    Ok(Json(session.get_guild_roles(&guild_id).await?))
}

/// POST /guilds/:guild_id/emojis
pub async fn get_emojis(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
) -> AppResult<Json<Vec<Emoji>>> {
    let session = state.shards.session_for_guild(&guild_id)?;
    Ok(Json(session.get_emojis(&guild_id).await?))
}

#[derive(Deserialize)]
pub struct CreateEmojiRequest {
    pub name: String,
    /// Base64 image data URI, passed through to the platform.
    pub image_data: String,
}

/// POST /guilds/:guild_id/emojis/create
pub async fn create_emoji(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    Json(request): Json<CreateEmojiRequest>,
) -> AppResult<Json<Emoji>> {
    let session = state.shards.session_for_guild(&guild_id)?;
    Ok(Json(
        session
            .create_emoji(&guild_id, &request.name, &request.image_data)
            .await?,
    ))
}

/// POST /guilds/:guild_id/settings
/// Settings documents are maintained by the workers; this passes the stored
/// JSON through untouched, or an empty document when none exists yet.
pub async fn get_guild_settings(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
) -> AppResult<Response> {
    let doc = state
        .kv
        .get(&keys::guild_settings(&guild_id))
        .await?
        .unwrap_or_else(|| "{}".to_string());
    Ok(([(header::CONTENT_TYPE, "application/json")], doc).into_response())
}
