use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::admission::AdmissionController;
use crate::capture::{CaptureChannel, ModifyTask, UNRESPONSIVE_CAPTURE_BLACKLIST};
use crate::error::{AppError, AppResult};
use crate::guild_index::GuildIndex;
use crate::registry::IdentityRegistry;
use crate::platform::ShardManager;

/// Secondary pool size granted to each premium tier.
pub fn premium_bot_limit(tier: u8) -> usize {
    match tier {
        0 | 1 => 0,
        2 => 1,
        3 => 3,
        4 => 10,
        5 => 100,
        _ => 0,
    }
}

/// Voice-modification request from a worker.
#[derive(Debug, Clone, Deserialize)]
pub struct UserModify {
    pub user_id: u64,
    pub mute: bool,
    pub deaf: bool,
    #[serde(default)]
    pub premium_tier: Option<u8>,
}

/// Which rung of the ladder performed the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MuteOutcome {
    Secondary,
    Capture,
    Primary,
}

/// Walks the fallback ladder for each modify request: secondary identities
/// first (cheapest), then the in-guild capture client, then the primary bot.
/// Each rung is tried at most once per traversal; failures are logged and the
/// ladder advances.
pub struct Dispatcher {
    registry: Arc<IdentityRegistry>,
    index: GuildIndex,
    admission: AdmissionController,
    capture: CaptureChannel,
    shards: Arc<dyn ShardManager>,
    max_secondary_workers: usize,
    ack_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<IdentityRegistry>,
        index: GuildIndex,
        admission: AdmissionController,
        capture: CaptureChannel,
        shards: Arc<dyn ShardManager>,
        max_secondary_workers: usize,
        ack_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            index,
            admission,
            capture,
            shards,
            max_secondary_workers,
            ack_timeout,
        }
    }

    pub async fn modify_user(
        &self,
        guild_id: &str,
        connect_code: &str,
        request: &UserModify,
    ) -> AppResult<MuteOutcome> {
        let guild_numeric: u64 = guild_id
            .parse()
            .map_err(|_| AppError::BadRequest(format!("guild id {guild_id} is not numeric")))?;

        let limit = request
            .premium_tier
            .map(premium_bot_limit)
            .unwrap_or(self.max_secondary_workers);

        if self.attempt_on_secondary(guild_id, request, limit).await {
            return Ok(MuteOutcome::Secondary);
        }

        if !connect_code.is_empty()
            && self
                .attempt_on_capture(guild_id, guild_numeric, connect_code, request)
                .await
        {
            return Ok(MuteOutcome::Capture);
        }

        let session = self.shards.session_for_guild(guild_id)?;
        session
            .apply_mute_deaf(guild_id, request.user_id, request.mute, request.deaf)
            .await?;
        info!(%guild_id, user_id = request.user_id, "applied mute/deaf on primary bot");
        Ok(MuteOutcome::Primary)
    }

    async fn attempt_on_secondary(
        &self,
        guild_id: &str,
        request: &UserModify,
        limit: usize,
    ) -> bool {
        if limit == 0 {
            info!(%guild_id, "guild has no access to secondary identities; skipping");
            return false;
        }
        let hashed_tokens = match self.index.list(guild_id).await {
            Ok(tokens) => tokens,
            Err(e) => {
                error!(%guild_id, error = %e, "error listing guild identities");
                return false;
            }
        };
        if hashed_tokens.is_empty() {
            info!(%guild_id, "no secondary identities known for guild");
            return false;
        }

        let sessions = self.registry.sessions().await;
        for hashed in hashed_tokens.iter().take(limit) {
            if !self.admission.try_admit(guild_id, hashed).await {
                info!(%guild_id, hashed_token = %hashed, "secondary identity potentially rate-limited; skipping");
                continue;
            }
            let Some(session) = sessions.get(hashed) else {
                // Stale shared entry: the session lives on another instance or
                // is gone. Drop it; its owner re-adds on the next guild-create.
                if let Err(e) = self.index.remove(guild_id, hashed).await {
                    error!(%guild_id, hashed_token = %hashed, error = %e, "failed to drop stale identity");
                }
                continue;
            };
            match session
                .apply_mute_deaf(guild_id, request.user_id, request.mute, request.deaf)
                .await
            {
                Ok(()) => {
                    info!(
                        %guild_id,
                        user_id = request.user_id,
                        hashed_token = %hashed,
                        mute = request.mute,
                        deaf = request.deaf,
                        "applied mute/deaf on secondary identity"
                    );
                    return true;
                }
                Err(e) => {
                    error!(
                        %guild_id,
                        user_id = request.user_id,
                        hashed_token = %hashed,
                        error = %e,
                        "failed to apply mute/deaf on secondary identity"
                    );
                }
            }
        }
        false
    }

    async fn attempt_on_capture(
        &self,
        guild_id: &str,
        guild_numeric: u64,
        connect_code: &str,
        request: &UserModify,
    ) -> bool {
        // The connect code doubles as the admission key so a single capture
        // client is never flooded.
        if !self.admission.try_admit(guild_id, connect_code).await {
            info!(%guild_id, connect_code, "capture client potentially rate-limited; deferring to primary");
            return false;
        }

        let task = ModifyTask::new(guild_numeric, request.user_id, request.mute, request.deaf);

        // Subscribe before pushing; a fast ack must not slip past us.
        let subscription = match self.capture.subscribe_completion(&task.task_id).await {
            Ok(sub) => sub,
            Err(e) => {
                error!(%guild_id, task_id = %task.task_id, error = %e, "failed to subscribe for capture ack");
                return false;
            }
        };
        if let Err(e) = self
            .capture
            .push(connect_code, &task, Some(self.ack_timeout))
            .await
        {
            error!(%guild_id, connect_code, error = %e, "failed to push capture task");
            return false;
        }

        if self
            .capture
            .wait_for_ack(subscription, self.ack_timeout)
            .await
        {
            info!(%guild_id, connect_code, task_id = %task.task_id, "applied mute/deaf via capture client");
            return true;
        }

        match self
            .admission
            .blacklist(guild_id, connect_code, UNRESPONSIVE_CAPTURE_BLACKLIST)
            .await
        {
            Ok(()) => info!(
                %guild_id,
                connect_code,
                duration_secs = UNRESPONSIVE_CAPTURE_BLACKLIST.as_secs(),
                "no ack from capture client; blacklisting connect code"
            ),
            Err(e) => {
                error!(%guild_id, connect_code, error = %e, "failed to blacklist unresponsive capture client")
            }
        }
        false
    }
}
