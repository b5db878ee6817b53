use std::time::Duration;

use kv_store::{KvError, KvResult, KvStore};
use serde::{Deserialize, Serialize};

use crate::keys;

/// Type tag on a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    GuildCreate,
    GuildDelete,
    VoiceStateUpdate,
    ReactionAdd,
    ReactionRemove,
    ReactionRemoveAll,
}

/// A serialized inbound event on the shared queue. The payload is the event's
/// own JSON, carried opaquely so a pop returns the original bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub kind: JobKind,
    pub payload: String,
}

pub async fn push_job(kv: &KvStore, kind: JobKind, payload: String) -> KvResult<()> {
    let encoded = serde_json::to_string(&Job { kind, payload })
        .map_err(|e| KvError::Encoding(e.to_string()))?;
    kv.rpush(keys::JOB_QUEUE, &encoded).await
}

/// Blocking pop of the next job; `KvError::NotFound` when none arrives
/// within the timeout.
pub async fn pop_job(kv: &KvStore, timeout: Duration) -> KvResult<String> {
    kv.blpop(keys::JOB_QUEUE, timeout).await
}

/// Queued job count; 0 on a fresh instance.
pub async fn job_count(kv: &KvStore) -> KvResult<i64> {
    kv.llen(keys::JOB_QUEUE).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn jobs_roundtrip_through_the_queue() {
        let kv = KvStore::in_memory();
        push_job(&kv, JobKind::GuildDelete, "{\"id\":\"1\"}".into())
            .await
            .unwrap();
        assert_eq!(job_count(&kv).await.unwrap(), 1);

        let raw = pop_job(&kv, Duration::from_millis(10)).await.unwrap();
        let job: Job = serde_json::from_str(&raw).unwrap();
        assert_eq!(job.kind, JobKind::GuildDelete);
        assert_eq!(job.payload, "{\"id\":\"1\"}");
        assert_eq!(job_count(&kv).await.unwrap(), 0);
    }
}
