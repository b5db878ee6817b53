use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kv_store::KvStore;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::guild_index::GuildIndex;
use crate::hashing::hash_token;
use crate::keys;
use crate::platform::{
    EventHandler, GatewayEvent, Intents, PlatformSession, SessionConnector, ShardManager,
};

const TOKEN_LOCK_TTL: Duration = Duration::from_secs(5 * 60);
const TOKEN_LOCK_REFRESH: Duration = Duration::from_secs(60);
const TOKEN_LOCK_POLL: Duration = Duration::from_secs(1);

pub type SessionMap = HashMap<String, Arc<dyn PlatformSession>>;

/// Instance-local registry of secondary identity sessions, keyed by hashed
/// identity. Sessions are opened once at startup and never reopened on drop;
/// reconnect is the SDK adapter's concern.
pub struct IdentityRegistry {
    kv: KvStore,
    index: GuildIndex,
    connector: Arc<dyn SessionConnector>,
    shards: Arc<dyn ShardManager>,
    sessions: RwLock<SessionMap>,
    lock_refreshers: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl IdentityRegistry {
    pub fn new(
        kv: KvStore,
        index: GuildIndex,
        connector: Arc<dyn SessionConnector>,
        shards: Arc<dyn ShardManager>,
    ) -> Self {
        Self {
            kv,
            index,
            connector,
            shards,
            sessions: RwLock::new(HashMap::new()),
            lock_refreshers: Mutex::new(HashMap::new()),
        }
    }

    /// Open a session for every configured secondary identity. An identity
    /// that fails to open is logged and omitted; the instance continues.
    pub async fn load_worker_tokens(&self, tokens: &[String]) {
        if tokens.is_empty() {
            info!("no worker bot tokens provided");
            return;
        }
        for token in tokens {
            let hashed = hash_token(token);
            if self.sessions.read().await.contains_key(&hashed) {
                info!(hashed_token = %hashed, "identity already has a running session on this instance");
                continue;
            }

            // The platform forbids duplicate sessions per identity, so block
            // until whatever instance holds this identity lets go.
            self.wait_for_token_lock(&hashed).await;
            self.lock_token(&hashed).await;

            let hook = Arc::new(GuildCreateHook {
                index: self.index.clone(),
                hashed_token: hashed.clone(),
            });
            let session = match self.connector.connect(token, Intents::GUILDS, hook).await {
                Ok(session) => session,
                Err(e) => {
                    error!(hashed_token = %hashed, error = %e, "failed to open session; omitting identity");
                    self.release_token_lock(&hashed).await;
                    continue;
                }
            };

            for guild_id in session.joined_guilds() {
                match self.index.add(&guild_id, &hashed).await {
                    Ok(()) => info!(%guild_id, hashed_token = %hashed, "registered identity for guild"),
                    Err(e) => error!(%guild_id, hashed_token = %hashed, error = %e, "error registering identity for guild"),
                }
            }

            self.sessions.write().await.insert(hashed.clone(), session);
            self.spawn_lock_refresher(hashed).await;
        }
    }

    /// Sessions keyed by hashed identity. The dispatcher holds this guard
    /// across its entire ladder walk; writes happen only at startup and
    /// shutdown.
    pub async fn sessions(&self) -> RwLockReadGuard<'_, SessionMap> {
        self.sessions.read().await
    }

    /// Stop the shard manager, close every secondary session, and release
    /// the token locks. Individual failures are logged and skipped.
    pub async fn close(&self) {
        if let Err(e) = self.shards.stop_all().await {
            error!(error = %e, "error stopping shard sessions");
        }

        let mut refreshers = self.lock_refreshers.lock().await;
        for handle in refreshers.values() {
            handle.abort();
        }
        refreshers.clear();
        drop(refreshers);

        let mut sessions = self.sessions.write().await;
        for (hashed, session) in sessions.drain() {
            if let Err(e) = session.close().await {
                error!(hashed_token = %hashed, error = %e, "error closing active session");
            }
            self.release_token_lock(&hashed).await;
        }
    }

    async fn wait_for_token_lock(&self, hashed_token: &str) {
        let key = keys::token_session_lock(hashed_token);
        loop {
            match self.kv.get(&key).await {
                Ok(None) => return,
                Ok(Some(_)) => tokio::time::sleep(TOKEN_LOCK_POLL).await,
                Err(e) => {
                    // Proceeding beats spinning forever against a dead store.
                    error!(hashed_token, error = %e, "token lock poll failed; proceeding");
                    return;
                }
            }
        }
    }

    async fn lock_token(&self, hashed_token: &str) {
        let key = keys::token_session_lock(hashed_token);
        if let Err(e) = self.kv.set_ex(&key, "1", TOKEN_LOCK_TTL).await {
            error!(hashed_token, error = %e, "failed to write token session lock");
        }
    }

    async fn release_token_lock(&self, hashed_token: &str) {
        let key = keys::token_session_lock(hashed_token);
        if let Err(e) = self.kv.del(&key).await {
            error!(hashed_token, error = %e, "failed to release token session lock");
        }
    }

    /// Keep the lock alive while the session is open; the TTL bounds how
    /// long a crashed holder can wedge the identity.
    async fn spawn_lock_refresher(&self, hashed_token: String) {
        let kv = self.kv.clone();
        let key = keys::token_session_lock(&hashed_token);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TOKEN_LOCK_REFRESH);
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = kv.set_ex(&key, "1", TOKEN_LOCK_TTL).await {
                    warn!(%key, error = %e, "failed to refresh token session lock");
                }
            }
        });
        self.lock_refreshers
            .lock()
            .await
            .insert(hashed_token, handle);
    }
}

/// Guild-create hook registered on each secondary session; keeps the shared
/// guild index current for its identity.
struct GuildCreateHook {
    index: GuildIndex,
    hashed_token: String,
}

#[async_trait]
impl EventHandler for GuildCreateHook {
    async fn on_event(&self, event: GatewayEvent) {
        if let GatewayEvent::GuildCreate(guild) = event {
            match self.index.add(&guild.id, &self.hashed_token).await {
                Ok(()) => info!(guild_id = %guild.id, "identity added for guild"),
                Err(e) => {
                    error!(guild_id = %guild.id, hashed_token = %self.hashed_token, error = %e, "error adding identity for guild")
                }
            }
        }
    }
}
