#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gateway_service::config::Config;
use gateway_service::platform::{
    Channel, Embed, Emoji, EventHandler, Guild, Intents, Member, Message, PlatformError,
    PlatformSession, Role, SessionConnector, ShardManager,
};

/// Session double that records mute calls and can be told to fail them.
pub struct MockSession {
    user: u64,
    guilds: Vec<String>,
    fail_mute: bool,
    mute_calls: Mutex<Vec<(String, u64, bool, bool)>>,
    closed: Mutex<bool>,
}

impl MockSession {
    pub fn new(user: u64, guilds: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            user,
            guilds: guilds.iter().map(|g| g.to_string()).collect(),
            fail_mute: false,
            mute_calls: Mutex::new(Vec::new()),
            closed: Mutex::new(false),
        })
    }

    pub fn failing(user: u64, guilds: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            user,
            guilds: guilds.iter().map(|g| g.to_string()).collect(),
            fail_mute: true,
            mute_calls: Mutex::new(Vec::new()),
            closed: Mutex::new(false),
        })
    }

    pub fn mute_calls(&self) -> Vec<(String, u64, bool, bool)> {
        self.mute_calls.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

#[async_trait]
impl PlatformSession for MockSession {
    fn user_id(&self) -> u64 {
        self.user
    }

    fn joined_guilds(&self) -> Vec<String> {
        self.guilds.clone()
    }

    async fn apply_mute_deaf(
        &self,
        guild_id: &str,
        user_id: u64,
        mute: bool,
        deaf: bool,
    ) -> Result<(), PlatformError> {
        self.mute_calls
            .lock()
            .unwrap()
            .push((guild_id.to_string(), user_id, mute, deaf));
        if self.fail_mute {
            Err(PlatformError::Rejected("mock failure".into()))
        } else {
            Ok(())
        }
    }

    async fn send_message(
        &self,
        channel_id: &str,
        content: &str,
    ) -> Result<Message, PlatformError> {
        Ok(Message {
            id: "m1".into(),
            channel_id: channel_id.into(),
            content: content.into(),
        })
    }

    async fn edit_message_embed(
        &self,
        channel_id: &str,
        message_id: &str,
        _embed: &Embed,
    ) -> Result<Message, PlatformError> {
        Ok(Message {
            id: message_id.into(),
            channel_id: channel_id.into(),
            content: String::new(),
        })
    }

    async fn delete_message(
        &self,
        _channel_id: &str,
        _message_id: &str,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn get_guild(&self, guild_id: &str) -> Result<Guild, PlatformError> {
        Ok(Guild {
            id: guild_id.into(),
            name: "mock guild".into(),
        })
    }

    async fn get_guild_channels(&self, _guild_id: &str) -> Result<Vec<Channel>, PlatformError> {
        Ok(Vec::new())
    }

    async fn get_guild_member(
        &self,
        _guild_id: &str,
        user_id: &str,
    ) -> Result<Member, PlatformError> {
        Ok(Member {
            user_id: user_id.into(),
            nick: None,
            roles: Vec::new(),
        })
    }

    async fn get_guild_roles(&self, _guild_id: &str) -> Result<Vec<Role>, PlatformError> {
        Ok(Vec::new())
    }

    async fn add_reaction(
        &self,
        _channel_id: &str,
        _message_id: &str,
        _emoji: &str,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn remove_reaction(
        &self,
        _channel_id: &str,
        _message_id: &str,
        _emoji: &str,
        _user_id: &str,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn remove_all_reactions(
        &self,
        _channel_id: &str,
        _message_id: &str,
    ) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn create_user_channel(&self, user_id: &str) -> Result<Channel, PlatformError> {
        Ok(Channel {
            id: format!("dm-{user_id}"),
            name: String::new(),
            kind: 1,
        })
    }

    async fn get_emojis(&self, _guild_id: &str) -> Result<Vec<Emoji>, PlatformError> {
        Ok(Vec::new())
    }

    async fn create_emoji(
        &self,
        _guild_id: &str,
        name: &str,
        _image_data: &str,
    ) -> Result<Emoji, PlatformError> {
        Ok(Emoji {
            id: Some("e1".into()),
            name: name.into(),
        })
    }

    async fn close(&self) -> Result<(), PlatformError> {
        *self.closed.lock().unwrap() = true;
        Ok(())
    }
}

/// Connector double handing out prepared sessions by token.
pub struct MockConnector {
    sessions: Mutex<HashMap<String, Arc<MockSession>>>,
    pub handlers: Mutex<Vec<Arc<dyn EventHandler>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_session(self, token: &str, session: Arc<MockSession>) -> Self {
        self.sessions
            .lock()
            .unwrap()
            .insert(token.to_string(), session);
        self
    }
}

#[async_trait]
impl SessionConnector for MockConnector {
    async fn connect(
        &self,
        token: &str,
        _intents: Intents,
        handler: Arc<dyn EventHandler>,
    ) -> Result<Arc<dyn PlatformSession>, PlatformError> {
        self.handlers.lock().unwrap().push(handler);
        match self.sessions.lock().unwrap().get(token) {
            Some(session) => Ok(session.clone()),
            None => Err(PlatformError::Rejected("unknown token".into())),
        }
    }
}

/// Single-shard double fronting one primary session.
pub struct MockShardManager {
    pub primary: Arc<MockSession>,
}

impl MockShardManager {
    pub fn new(primary: Arc<MockSession>) -> Arc<Self> {
        Arc::new(Self { primary })
    }
}

#[async_trait]
impl ShardManager for MockShardManager {
    fn user_id(&self) -> u64 {
        self.primary.user_id()
    }

    fn session_for_guild(
        &self,
        _guild_id: &str,
    ) -> Result<Arc<dyn PlatformSession>, PlatformError> {
        Ok(self.primary.clone())
    }

    fn any_session(&self) -> Result<Arc<dyn PlatformSession>, PlatformError> {
        Ok(self.primary.clone())
    }

    fn add_handler(&self, _handler: Arc<dyn EventHandler>) {}

    async fn stop_all(&self) -> Result<(), PlatformError> {
        Ok(())
    }
}

/// Full application state over an in-memory store and mock platform.
pub fn make_state(kv: &kv_store::KvStore) -> gateway_service::state::AppState {
    use gateway_service::admission::AdmissionController;
    use gateway_service::capture::CaptureChannel;
    use gateway_service::dispatch::Dispatcher;
    use gateway_service::guild_index::GuildIndex;
    use gateway_service::registry::IdentityRegistry;

    let config = Arc::new(test_config());
    let index = GuildIndex::new(kv.clone());
    let shards = MockShardManager::new(MockSession::new(1, &[]));
    let registry = Arc::new(IdentityRegistry::new(
        kv.clone(),
        index.clone(),
        Arc::new(MockConnector::new()),
        shards.clone(),
    ));
    let admission = AdmissionController::new(
        kv.clone(),
        config.max_requests_per_window,
        config.admission_window,
    );
    let capture = CaptureChannel::new(kv.clone());
    let dispatcher = Arc::new(Dispatcher::new(
        registry,
        index,
        admission,
        capture.clone(),
        shards.clone(),
        config.max_secondary_workers,
        config.capture_ack_timeout,
    ));
    gateway_service::state::AppState {
        kv: kv.clone(),
        dispatcher,
        capture,
        shards,
        config,
    }
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        redis_addr: String::new(),
        redis_user: String::new(),
        redis_pass: String::new(),
        test_mode: true,
        bot_token: "primary-token".into(),
        worker_bot_tokens: Vec::new(),
        max_requests_per_window: 7,
        admission_window: Duration::from_secs(5),
        max_secondary_workers: 3,
        capture_ack_timeout: Duration::from_millis(100),
        job_poll_timeout: Duration::from_millis(50),
        task_poll_timeout: Duration::from_millis(50),
    }
}
