//! Typed key/value + pub/sub adapter shared by the gateway and its workers.
//!
//! Two backends hide behind one handle: a Redis-backed store for deployments
//! and an in-memory store for test mode. Both expose identical observable
//! semantics — string values with TTL, atomic counters, sets, FIFO lists with
//! blocking pop, and fire-and-forget pub/sub.

mod error;
mod memory;
mod redis_backend;

pub use error::{KvError, KvResult};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[async_trait]
pub(crate) trait KvBackend: Send + Sync {
    async fn get(&self, key: &str) -> KvResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> KvResult<()>;
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()>;
    async fn del(&self, key: &str) -> KvResult<()>;
    async fn incr(&self, key: &str) -> KvResult<i64>;
    async fn expire(&self, key: &str, ttl: Duration) -> KvResult<bool>;
    async fn sadd(&self, key: &str, member: &str) -> KvResult<()>;
    async fn srem(&self, key: &str, member: &str) -> KvResult<()>;
    async fn smembers(&self, key: &str) -> KvResult<Vec<String>>;
    async fn lpush(&self, key: &str, value: &str) -> KvResult<()>;
    async fn rpush(&self, key: &str, value: &str) -> KvResult<()>;
    async fn llen(&self, key: &str) -> KvResult<i64>;
    async fn blpop(&self, key: &str, timeout: Duration) -> KvResult<String>;
    async fn publish(&self, topic: &str, payload: &str) -> KvResult<()>;
    async fn subscribe(&self, topic: &str) -> KvResult<Subscription>;
}

/// Handle over the configured backend. Cheap to clone and share.
#[derive(Clone)]
pub struct KvStore {
    backend: Arc<dyn KvBackend>,
}

impl KvStore {
    /// Connect to a remote Redis store.
    pub async fn connect(addr: &str, username: &str, password: &str) -> KvResult<Self> {
        let backend = redis_backend::RedisBackend::connect(addr, username, password).await?;
        Ok(Self {
            backend: Arc::new(backend),
        })
    }

    /// In-memory store for test mode. Same semantics, process-local.
    pub fn in_memory() -> Self {
        Self {
            backend: Arc::new(memory::MemoryBackend::new()),
        }
    }

    pub async fn get(&self, key: &str) -> KvResult<Option<String>> {
        self.backend.get(key).await
    }

    pub async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        self.backend.set(key, value).await
    }

    /// Set a value with a TTL in one round trip.
    pub async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()> {
        self.backend.set_ex(key, value, ttl).await
    }

    pub async fn del(&self, key: &str) -> KvResult<()> {
        self.backend.del(key).await
    }

    /// Atomically increment an integer counter, creating it at 1.
    pub async fn incr(&self, key: &str) -> KvResult<i64> {
        self.backend.incr(key).await
    }

    /// Returns false when the key does not exist.
    pub async fn expire(&self, key: &str, ttl: Duration) -> KvResult<bool> {
        self.backend.expire(key, ttl).await
    }

    pub async fn sadd(&self, key: &str, member: &str) -> KvResult<()> {
        self.backend.sadd(key, member).await
    }

    pub async fn srem(&self, key: &str, member: &str) -> KvResult<()> {
        self.backend.srem(key, member).await
    }

    pub async fn smembers(&self, key: &str) -> KvResult<Vec<String>> {
        self.backend.smembers(key).await
    }

    pub async fn lpush(&self, key: &str, value: &str) -> KvResult<()> {
        self.backend.lpush(key, value).await
    }

    pub async fn rpush(&self, key: &str, value: &str) -> KvResult<()> {
        self.backend.rpush(key, value).await
    }

    /// List length; 0 when the key is absent.
    pub async fn llen(&self, key: &str) -> KvResult<i64> {
        self.backend.llen(key).await
    }

    /// Blocking head pop. `KvError::NotFound` when the timeout elapses with
    /// nothing to pop, mirroring the store's nil reply.
    pub async fn blpop(&self, key: &str, timeout: Duration) -> KvResult<String> {
        self.backend.blpop(key, timeout).await
    }

    pub async fn publish(&self, topic: &str, payload: &str) -> KvResult<()> {
        self.backend.publish(topic, payload).await
    }

    /// Subscribe to a topic. The subscription is live once this returns, so
    /// subscribe-then-publish never loses the first message.
    pub async fn subscribe(&self, topic: &str) -> KvResult<Subscription> {
        self.backend.subscribe(topic).await
    }
}

/// A live pub/sub subscription. Dropping it unsubscribes.
pub struct Subscription {
    rx: mpsc::Receiver<String>,
    _forwarder: Option<AbortOnDrop>,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::Receiver<String>, forwarder: Option<JoinHandle<()>>) -> Self {
        Self {
            rx,
            _forwarder: forwarder.map(AbortOnDrop),
        }
    }

    /// Next payload on the topic, or `None` once the subscription is dead.
    pub async fn next(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
