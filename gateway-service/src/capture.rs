use std::time::Duration;

use kv_store::{KvResult, KvStore, Subscription};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::keys;

/// How long an unresponsive capture client is benched.
pub const UNRESPONSIVE_CAPTURE_BLACKLIST: Duration = Duration::from_secs(5 * 60);

/// Voice-modification request handed to an in-guild capture client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyTask {
    pub task_id: String,
    #[serde(rename = "guild_numeric_id")]
    pub guild_id: u64,
    pub user_id: u64,
    pub mute: bool,
    pub deaf: bool,
}

impl ModifyTask {
    pub fn new(guild_id: u64, user_id: u64, mute: bool, deaf: bool) -> Self {
        Self {
            task_id: Uuid::new_v4().simple().to_string(),
            guild_id,
            user_id,
            mute,
            deaf,
        }
    }
}

/// Task hand-off to capture clients: a per-connect-code list for delivery and
/// a per-task topic for the ack.
#[derive(Clone)]
pub struct CaptureChannel {
    kv: KvStore,
}

impl CaptureChannel {
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Subscribe to a task's completion topic. Must happen before [`push`]
    /// so an immediate ack is not lost.
    ///
    /// [`push`]: CaptureChannel::push
    pub async fn subscribe_completion(&self, task_id: &str) -> KvResult<Subscription> {
        self.kv.subscribe(&keys::task_complete(task_id)).await
    }

    /// Encode and enqueue a task for the capture client behind `connect_code`,
    /// optionally bounding how long it may sit undelivered.
    pub async fn push(
        &self,
        connect_code: &str,
        task: &ModifyTask,
        ttl: Option<Duration>,
    ) -> KvResult<()> {
        let payload =
            serde_json::to_string(task).map_err(|e| kv_store::KvError::Encoding(e.to_string()))?;
        let key = keys::capture_tasks(connect_code);
        self.kv.rpush(&key, &payload).await?;
        if let Some(ttl) = ttl {
            self.kv.expire(&key, ttl).await?;
        }
        Ok(())
    }

    /// Wait for the ack on an already-open subscription. Payload `"true"`
    /// means the client performed the change; anything else, or the timer
    /// firing first, is a failure.
    pub async fn wait_for_ack(&self, mut subscription: Subscription, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, subscription.next()).await {
            Ok(Some(payload)) => payload == "true",
            Ok(None) => false,
            Err(_) => false,
        }
    }

    /// Blocking pop of the next task for a capture client.
    pub async fn next_task(&self, connect_code: &str, timeout: Duration) -> KvResult<String> {
        self.kv
            .blpop(&keys::capture_tasks(connect_code), timeout)
            .await
    }

    /// Announce a task's outcome to its single waiting consumer.
    pub async fn publish_status(&self, task_id: &str, complete: bool) -> KvResult<()> {
        self.kv
            .publish(
                &keys::task_complete(task_id),
                if complete { "true" } else { "false" },
            )
            .await
    }
}
