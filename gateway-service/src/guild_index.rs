use kv_store::{KvResult, KvStore};

use crate::keys;

/// Shared set per guild of hashed identities known to have joined it.
///
/// Eventually consistent across instances: an identity listed here may be
/// owned elsewhere or gone entirely. Readers tolerate stale entries; the
/// dispatcher removes them lazily when the local session lookup misses.
#[derive(Clone)]
pub struct GuildIndex {
    kv: KvStore,
}

impl GuildIndex {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    pub async fn add(&self, guild_id: &str, hashed_token: &str) -> KvResult<()> {
        self.kv
            .sadd(&keys::guild_tokens(guild_id), hashed_token)
            .await
    }

    pub async fn remove(&self, guild_id: &str, hashed_token: &str) -> KvResult<()> {
        self.kv
            .srem(&keys::guild_tokens(guild_id), hashed_token)
            .await
    }

    pub async fn list(&self, guild_id: &str) -> KvResult<Vec<String>> {
        self.kv.smembers(&keys::guild_tokens(guild_id)).await
    }
}
