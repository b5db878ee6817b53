use async_trait::async_trait;
use kv_store::KvStore;
use serde::Serialize;
use tracing::{error, info};

use crate::guild_index::GuildIndex;
use crate::jobs::{self, JobKind};
use crate::keys;
use crate::platform::{EventHandler, GatewayEvent, Guild, Reaction, ReactionRemoveAll, UnavailableGuild, VoiceState};

/// Turns inbound gateway events into queued jobs for the worker fleet.
///
/// Registered on the primary identity's shards. Marshal and push failures are
/// logged and the event dropped; the platform resends on reconnect.
pub struct EventIngress {
    kv: KvStore,
    index: GuildIndex,
    primary_hashed_token: String,
    own_user_id: u64,
}

impl EventIngress {
    pub fn new(
        kv: KvStore,
        index: GuildIndex,
        primary_hashed_token: String,
        own_user_id: u64,
    ) -> Self {
        Self {
            kv,
            index,
            primary_hashed_token,
            own_user_id,
        }
    }

    async fn on_guild_create(&self, guild: Guild) {
        if let Err(e) = self.index.add(&guild.id, &self.primary_hashed_token).await {
            error!(guild_id = %guild.id, error = %e, "error registering primary identity for guild");
        }
        self.enqueue(JobKind::GuildCreate, &guild.id, &guild).await;
    }

    async fn on_guild_delete(&self, guild: UnavailableGuild) {
        info!(guild_id = %guild.id, "received guild delete");
        self.enqueue(JobKind::GuildDelete, &guild.id, &guild).await;
    }

    async fn on_voice_state(&self, state: VoiceState) {
        // ignore the bot itself
        if state.user_id == self.own_user_id.to_string() {
            return;
        }
        if !self.guild_has_active_games(&state.guild_id).await {
            return;
        }
        self.enqueue(JobKind::VoiceStateUpdate, &state.guild_id, &state)
            .await;
    }

    async fn on_reaction(&self, kind: JobKind, reaction: Reaction) {
        if reaction.user_id == self.own_user_id.to_string() {
            return;
        }
        if !self.guild_has_active_games(&reaction.guild_id).await {
            return;
        }
        self.enqueue(kind, &reaction.guild_id, &reaction).await;
    }

    async fn on_reaction_remove_all(&self, event: ReactionRemoveAll) {
        if !self.guild_has_active_games(&event.guild_id).await {
            return;
        }
        self.enqueue(JobKind::ReactionRemoveAll, &event.guild_id, &event)
            .await;
    }

    /// Gate on whether any game is running in the guild; a positive match
    /// also kicks off a background prune of games gone stale.
    async fn guild_has_active_games(&self, guild_id: &str) -> bool {
        let active = match self.kv.smembers(&keys::guild_games(guild_id)).await {
            Ok(codes) => !codes.is_empty(),
            Err(e) => {
                error!(%guild_id, error = %e, "error checking active games");
                false
            }
        };
        if active {
            let kv = self.kv.clone();
            let guild_id = guild_id.to_string();
            tokio::spawn(async move {
                purge_stale_games(&kv, &guild_id).await;
            });
        }
        active
    }

    async fn enqueue<T: Serialize>(&self, kind: JobKind, guild_id: &str, event: &T) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                error!(%guild_id, ?kind, error = %e, "error marshalling gateway event");
                return;
            }
        };
        match jobs::push_job(&self.kv, kind, payload).await {
            Ok(()) => info!(%guild_id, ?kind, "pushed gateway event to job queue"),
            Err(e) => error!(%guild_id, ?kind, error = %e, "error pushing gateway event to job queue"),
        }
    }
}

#[async_trait]
impl EventHandler for EventIngress {
    async fn on_event(&self, event: GatewayEvent) {
        match event {
            GatewayEvent::GuildCreate(guild) => self.on_guild_create(guild).await,
            GatewayEvent::GuildDelete(guild) => self.on_guild_delete(guild).await,
            GatewayEvent::VoiceStateUpdate(state) => self.on_voice_state(state).await,
            GatewayEvent::ReactionAdd(reaction) => {
                self.on_reaction(JobKind::ReactionAdd, reaction).await
            }
            GatewayEvent::ReactionRemove(reaction) => {
                self.on_reaction(JobKind::ReactionRemove, reaction).await
            }
            GatewayEvent::ReactionRemoveAll(event) => self.on_reaction_remove_all(event).await,
        }
    }
}

/// Drop connect codes whose heartbeat key has expired from a guild's
/// active-game set.
pub async fn purge_stale_games(kv: &KvStore, guild_id: &str) {
    let codes = match kv.smembers(&keys::guild_games(guild_id)).await {
        Ok(codes) => codes,
        Err(e) => {
            error!(%guild_id, error = %e, "error listing games for purge");
            return;
        }
    };
    for code in codes {
        match kv.get(&keys::game_heartbeat(&code)).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                if let Err(e) = kv.srem(&keys::guild_games(guild_id), &code).await {
                    error!(%guild_id, connect_code = %code, error = %e, "error pruning stale game");
                } else {
                    info!(%guild_id, connect_code = %code, "pruned stale game");
                }
            }
            Err(e) => error!(%guild_id, connect_code = %code, error = %e, "error checking game heartbeat"),
        }
    }
}
