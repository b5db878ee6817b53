use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod guilds;
pub mod jobs;
pub mod messages;
pub mod modify;
pub mod reactions;
pub mod tasks;

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { "ok" }))
        // Voice mute/deaf fan-out
        .route(
            "/guilds/:guild_id/:connect_code/modify",
            post(modify::modify_user),
        )
        // Guild lookups through the primary bot
        .route("/guilds/:guild_id", post(guilds::get_guild))
        .route("/guilds/:guild_id/channels", post(guilds::get_guild_channels))
        .route(
            "/guilds/:guild_id/members/:user_id",
            post(guilds::get_guild_member),
        )
        .route("/guilds/:guild_id/roles", post(guilds::get_guild_roles))
        .route("/guilds/:guild_id/emojis", post(guilds::get_emojis))
        .route("/guilds/:guild_id/emojis/create", post(guilds::create_emoji))
        .route("/guilds/:guild_id/settings", post(guilds::get_guild_settings))
        // Channel operations through the primary bot
        .route("/channels/:channel_id/messages", post(messages::send_message))
        .route(
            "/channels/:channel_id/messages/:message_id/embed",
            post(messages::edit_message_embed),
        )
        .route(
            "/channels/:channel_id/messages/:message_id/delete",
            post(messages::delete_message),
        )
        .route(
            "/channels/:channel_id/messages/:message_id/reactions/:emoji/add",
            post(reactions::add_reaction),
        )
        .route(
            "/channels/:channel_id/messages/:message_id/reactions/:emoji/remove",
            post(reactions::remove_reaction),
        )
        .route(
            "/channels/:channel_id/messages/:message_id/reactions/clear",
            post(reactions::remove_all_reactions),
        )
        .route("/users/:user_id/channel", post(messages::create_user_channel))
        // Capture client hand-off
        .route("/capture/task/:connect_code", post(tasks::get_capture_task))
        .route("/capture/status/:task_id", post(tasks::set_capture_task_status))
        // Worker job long-poll
        .route("/request/job", post(jobs::request_job))
        .route("/jobs/count", get(jobs::job_count))
}
