use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::events::{
    Channel, Embed, Emoji, GatewayEvent, Guild, Member, Message, Role,
};

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform transport error: {0}")]
    Transport(String),

    #[error("platform rejected the request: {0}")]
    Rejected(String),

    #[error("no session available")]
    Unavailable,
}

/// Gateway intents requested when opening a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intents(u32);

impl Intents {
    pub const GUILDS: Intents = Intents(1 << 0);
    pub const GUILD_VOICE_STATES: Intents = Intents(1 << 7);
    pub const GUILD_MESSAGES: Intents = Intents(1 << 9);
    pub const GUILD_MESSAGE_REACTIONS: Intents = Intents(1 << 10);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn union(self, other: Intents) -> Intents {
        Intents(self.0 | other.0)
    }
}

/// Everything the primary listener needs.
pub fn default_intents() -> Intents {
    Intents::GUILDS
        .union(Intents::GUILD_VOICE_STATES)
        .union(Intents::GUILD_MESSAGES)
        .union(Intents::GUILD_MESSAGE_REACTIONS)
}

/// A live gateway connection bound to one identity. Implemented by the SDK
/// adapter; everything here is an opaque platform operation to the gateway.
#[async_trait]
pub trait PlatformSession: Send + Sync {
    /// The bot user this session authenticates as.
    fn user_id(&self) -> u64;

    /// Guilds the session reported as joined at open time.
    fn joined_guilds(&self) -> Vec<String>;

    async fn apply_mute_deaf(
        &self,
        guild_id: &str,
        user_id: u64,
        mute: bool,
        deaf: bool,
    ) -> Result<(), PlatformError>;

    async fn send_message(&self, channel_id: &str, content: &str)
        -> Result<Message, PlatformError>;

    async fn edit_message_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        embed: &Embed,
    ) -> Result<Message, PlatformError>;

    async fn delete_message(&self, channel_id: &str, message_id: &str)
        -> Result<(), PlatformError>;

    async fn get_guild(&self, guild_id: &str) -> Result<Guild, PlatformError>;

    async fn get_guild_channels(&self, guild_id: &str) -> Result<Vec<Channel>, PlatformError>;

    async fn get_guild_member(
        &self,
        guild_id: &str,
        user_id: &str,
    ) -> Result<Member, PlatformError>;

    async fn get_guild_roles(&self, guild_id: &str) -> Result<Vec<Role>, PlatformError>;

    async fn add_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
    ) -> Result<(), PlatformError>;

    async fn remove_reaction(
        &self,
        channel_id: &str,
        message_id: &str,
        emoji: &str,
        user_id: &str,
    ) -> Result<(), PlatformError>;

    async fn remove_all_reactions(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), PlatformError>;

    async fn create_user_channel(&self, user_id: &str) -> Result<Channel, PlatformError>;

    async fn get_emojis(&self, guild_id: &str) -> Result<Vec<Emoji>, PlatformError>;

    async fn create_emoji(
        &self,
        guild_id: &str,
        name: &str,
        image_data: &str,
    ) -> Result<Emoji, PlatformError>;

    async fn close(&self) -> Result<(), PlatformError>;
}

/// Receives inbound gateway events from a session's worker.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_event(&self, event: GatewayEvent);
}

/// Opens gateway sessions. Reconnect-on-drop is the implementor's concern;
/// the registry opens each identity exactly once.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(
        &self,
        token: &str,
        intents: Intents,
        handler: Arc<dyn EventHandler>,
    ) -> Result<Arc<dyn PlatformSession>, PlatformError>;
}

/// Multiplexes the primary identity across shards.
#[async_trait]
pub trait ShardManager: Send + Sync {
    /// The primary bot's user id, known once the shards are up.
    fn user_id(&self) -> u64;

    /// The shard session responsible for a guild.
    fn session_for_guild(&self, guild_id: &str) -> Result<Arc<dyn PlatformSession>, PlatformError>;

    /// Any live shard session, for channel-scoped calls with no guild in hand.
    fn any_session(&self) -> Result<Arc<dyn PlatformSession>, PlatformError>;

    /// Register the handler that receives the primary identity's events.
    fn add_handler(&self, handler: Arc<dyn EventHandler>);

    async fn stop_all(&self) -> Result<(), PlatformError>;
}
