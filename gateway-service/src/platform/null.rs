//! Inert platform adapter.
//!
//! Stands in for the SDK adapter in test mode and documents the seam a real
//! adapter plugs into: implement [`SessionConnector`] and [`ShardManager`]
//! over the platform SDK and wire them in `main`.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::events::{Channel, Embed, Emoji, Guild, Member, Message, Role};
use super::session::{
    EventHandler, Intents, PlatformError, PlatformSession, SessionConnector, ShardManager,
};

pub struct NullSession;

#[async_trait]
impl PlatformSession for NullSession {
    fn user_id(&self) -> u64 {
        0
    }

    fn joined_guilds(&self) -> Vec<String> {
        Vec::new()
    }

    async fn apply_mute_deaf(
        &self,
        _guild_id: &str,
        _user_id: u64,
        _mute: bool,
        _deaf: bool,
    ) -> Result<(), PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn send_message(
        &self,
        _channel_id: &str,
        _content: &str,
    ) -> Result<Message, PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn edit_message_embed(
        &self,
        _channel_id: &str,
        _message_id: &str,
        _embed: &Embed,
    ) -> Result<Message, PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn delete_message(
        &self,
        _channel_id: &str,
        _message_id: &str,
    ) -> Result<(), PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn get_guild(&self, _guild_id: &str) -> Result<Guild, PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn get_guild_channels(&self, _guild_id: &str) -> Result<Vec<Channel>, PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn get_guild_member(
        &self,
        _guild_id: &str,
        _user_id: &str,
    ) -> Result<Member, PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn get_guild_roles(&self, _guild_id: &str) -> Result<Vec<Role>, PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn add_reaction(
        &self,
        _channel_id: &str,
        _message_id: &str,
        _emoji: &str,
    ) -> Result<(), PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn remove_reaction(
        &self,
        _channel_id: &str,
        _message_id: &str,
        _emoji: &str,
        _user_id: &str,
    ) -> Result<(), PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn remove_all_reactions(
        &self,
        _channel_id: &str,
        _message_id: &str,
    ) -> Result<(), PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn create_user_channel(&self, _user_id: &str) -> Result<Channel, PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn get_emojis(&self, _guild_id: &str) -> Result<Vec<Emoji>, PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn create_emoji(
        &self,
        _guild_id: &str,
        _name: &str,
        _image_data: &str,
    ) -> Result<Emoji, PlatformError> {
        Err(PlatformError::Unavailable)
    }

    async fn close(&self) -> Result<(), PlatformError> {
        Ok(())
    }
}

pub struct NullConnector;

#[async_trait]
impl SessionConnector for NullConnector {
    async fn connect(
        &self,
        _token: &str,
        _intents: Intents,
        _handler: Arc<dyn EventHandler>,
    ) -> Result<Arc<dyn PlatformSession>, PlatformError> {
        Ok(Arc::new(NullSession))
    }
}

pub struct NullShardManager;

impl NullShardManager {
    pub fn new() -> Self {
        info!("platform adapter disabled; gateway events will not be delivered");
        Self
    }
}

impl Default for NullShardManager {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShardManager for NullShardManager {
    fn user_id(&self) -> u64 {
        0
    }

    fn session_for_guild(
        &self,
        _guild_id: &str,
    ) -> Result<Arc<dyn PlatformSession>, PlatformError> {
        Ok(Arc::new(NullSession))
    }

    fn any_session(&self) -> Result<Arc<dyn PlatformSession>, PlatformError> {
        Ok(Arc::new(NullSession))
    }

    fn add_handler(&self, _handler: Arc<dyn EventHandler>) {}

    async fn stop_all(&self) -> Result<(), PlatformError> {
        Ok(())
    }
}
