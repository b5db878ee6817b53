//! Store key layout.
//!
//! These formats are shared with the worker fleet and the capture clients;
//! they must stay byte-exact across releases.

/// Set of hashed identities known to be members of a guild.
pub fn guild_tokens(guild_id: &str) -> String {
    format!("guild:{guild_id}:tokens")
}

/// Admission counter for a (guild, identity) pair. Capture connect codes
/// stand in for the identity on the capture rung.
pub fn guild_token_lock(guild_id: &str, identity: &str) -> String {
    format!("guild:{guild_id}:token:{identity}")
}

/// Per-connect-code list of encoded capture tasks.
pub fn capture_tasks(connect_code: &str) -> String {
    format!("tasks:{connect_code}")
}

/// Completion topic for a capture task; payload is "true" or "false".
pub fn task_complete(task_id: &str) -> String {
    format!("task:{task_id}:complete")
}

/// Shared FIFO list of serialized inbound gateway events.
pub const JOB_QUEUE: &str = "jobs:gateway";

/// Set of connect codes with a game running in the guild.
pub fn guild_games(guild_id: &str) -> String {
    format!("guild:{guild_id}:games")
}

/// Worker-maintained liveness key for a game; expiry marks the game stale.
pub fn game_heartbeat(connect_code: &str) -> String {
    format!("game:{connect_code}:heartbeat")
}

/// Worker-maintained settings document for a guild.
pub fn guild_settings(guild_id: &str) -> String {
    format!("guild:{guild_id}:settings")
}

/// Distributed session lock for an identity; held by the opening instance.
pub fn token_session_lock(hashed_token: &str) -> String {
    format!("token:{hashed_token}:lock")
}
