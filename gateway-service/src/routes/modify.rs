use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::dispatch::{MuteOutcome, UserModify};
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ModifyResponse {
    pub outcome: MuteOutcome,
}

/// POST /guilds/:guild_id/:connect_code/modify
/// Fan a mute/deafen request down the ladder secondary -> capture -> primary.
pub async fn modify_user(
    State(state): State<AppState>,
    Path((guild_id, connect_code)): Path<(String, String)>,
    Json(request): Json<UserModify>,
) -> AppResult<Json<ModifyResponse>> {
    let outcome = state
        .dispatcher
        .modify_user(&guild_id, &connect_code, &request)
        .await?;
    Ok(Json(ModifyResponse { outcome }))
}
