use std::collections::hash_map;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time::Instant;

use crate::{KvBackend, KvError, KvResult, Subscription};

const SUBSCRIPTION_BUFFER: usize = 64;

/// Process-local backend used in test mode. Keeps the remote store's
/// semantics: lazy TTL expiry, atomic counters, FIFO lists with blocking pop,
/// and topic fan-out. Time comes from the tokio clock so tests may pause it.
pub(crate) struct MemoryBackend {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<State>,
    pushed: Notify,
}

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
    topics: HashMap<String, Vec<mpsc::Sender<String>>>,
}

struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn persistent(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }
}

enum Value {
    Str(String),
    List(VecDeque<String>),
    Set(HashSet<String>),
}

impl Value {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Set(_) => "set",
        }
    }
}

fn wrong_type(key: &str, found: &Value) -> KvError {
    KvError::Transport(format!(
        "WRONGTYPE operation against key {key} holding {}",
        found.type_name()
    ))
}

impl State {
    /// Lazy TTL: drop the entry if its deadline has passed.
    fn purge_expired(&mut self, key: &str) {
        let expired = self
            .entries
            .get(key)
            .and_then(|e| e.expires_at)
            .is_some_and(|at| Instant::now() >= at);
        if expired {
            self.entries.remove(key);
        }
    }

    fn live(&mut self, key: &str) -> Option<&mut Entry> {
        self.purge_expired(key);
        self.entries.get_mut(key)
    }
}

impl MemoryBackend {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                pushed: Notify::new(),
            }),
        }
    }

    async fn push(&self, key: &str, value: &str, front: bool) -> KvResult<()> {
        let mut state = self.inner.state.lock().await;
        state.purge_expired(key);
        match state.entries.entry(key.to_string()) {
            hash_map::Entry::Vacant(slot) => {
                let mut list = VecDeque::new();
                list.push_back(value.to_string());
                slot.insert(Entry::persistent(Value::List(list)));
            }
            hash_map::Entry::Occupied(mut slot) => match &mut slot.get_mut().value {
                Value::List(list) => {
                    if front {
                        list.push_front(value.to_string());
                    } else {
                        list.push_back(value.to_string());
                    }
                }
                other => return Err(wrong_type(key, other)),
            },
        }
        drop(state);
        self.inner.pushed.notify_waiters();
        Ok(())
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let mut state = self.inner.state.lock().await;
        match state.live(key) {
            None => Ok(None),
            Some(entry) => match &entry.value {
                Value::Str(s) => Ok(Some(s.clone())),
                other => Err(wrong_type(key, other)),
            },
        }
    }

    async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        let mut state = self.inner.state.lock().await;
        state
            .entries
            .insert(key.to_string(), Entry::persistent(Value::Str(value.to_string())));
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> KvResult<()> {
        let mut state = self.inner.state.lock().await;
        state.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn del(&self, key: &str) -> KvResult<()> {
        let mut state = self.inner.state.lock().await;
        state.entries.remove(key);
        Ok(())
    }

    async fn incr(&self, key: &str) -> KvResult<i64> {
        let mut state = self.inner.state.lock().await;
        state.purge_expired(key);
        match state.entries.entry(key.to_string()) {
            hash_map::Entry::Vacant(slot) => {
                slot.insert(Entry::persistent(Value::Str("1".to_string())));
                Ok(1)
            }
            hash_map::Entry::Occupied(mut slot) => match &mut slot.get_mut().value {
                Value::Str(s) => {
                    let n: i64 = s
                        .parse()
                        .map_err(|_| KvError::Encoding(format!("key {key} is not an integer")))?;
                    let n = n + 1;
                    *s = n.to_string();
                    Ok(n)
                }
                other => Err(wrong_type(key, other)),
            },
        }
    }

    async fn expire(&self, key: &str, ttl: Duration) -> KvResult<bool> {
        let mut state = self.inner.state.lock().await;
        match state.live(key) {
            None => Ok(false),
            Some(entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
        }
    }

    async fn sadd(&self, key: &str, member: &str) -> KvResult<()> {
        let mut state = self.inner.state.lock().await;
        state.purge_expired(key);
        match state.entries.entry(key.to_string()) {
            hash_map::Entry::Vacant(slot) => {
                let mut set = HashSet::new();
                set.insert(member.to_string());
                slot.insert(Entry::persistent(Value::Set(set)));
                Ok(())
            }
            hash_map::Entry::Occupied(mut slot) => match &mut slot.get_mut().value {
                Value::Set(set) => {
                    set.insert(member.to_string());
                    Ok(())
                }
                other => Err(wrong_type(key, other)),
            },
        }
    }

    async fn srem(&self, key: &str, member: &str) -> KvResult<()> {
        let mut state = self.inner.state.lock().await;
        match state.live(key) {
            None => Ok(()),
            Some(entry) => match &mut entry.value {
                Value::Set(set) => {
                    set.remove(member);
                    Ok(())
                }
                other => Err(wrong_type(key, other)),
            },
        }
    }

    async fn smembers(&self, key: &str) -> KvResult<Vec<String>> {
        let mut state = self.inner.state.lock().await;
        match state.live(key) {
            None => Ok(Vec::new()),
            Some(entry) => match &entry.value {
                Value::Set(set) => {
                    // Sorted for a stable iteration order; the remote store
                    // leaves member order unspecified.
                    let mut members: Vec<String> = set.iter().cloned().collect();
                    members.sort();
                    Ok(members)
                }
                other => Err(wrong_type(key, other)),
            },
        }
    }

    async fn lpush(&self, key: &str, value: &str) -> KvResult<()> {
        self.push(key, value, true).await
    }

    async fn rpush(&self, key: &str, value: &str) -> KvResult<()> {
        self.push(key, value, false).await
    }

    async fn llen(&self, key: &str) -> KvResult<i64> {
        let mut state = self.inner.state.lock().await;
        match state.live(key) {
            None => Ok(0),
            Some(entry) => match &entry.value {
                Value::List(list) => Ok(list.len() as i64),
                other => Err(wrong_type(key, other)),
            },
        }
    }

    async fn blpop(&self, key: &str, timeout: Duration) -> KvResult<String> {
        let deadline = Instant::now() + timeout;
        loop {
            // Arm the notification before checking the list so a push between
            // the check and the wait still wakes us.
            let notified = self.inner.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let popped = {
                let mut state = self.inner.state.lock().await;
                let popped = match state.live(key) {
                    None => None,
                    Some(entry) => match &mut entry.value {
                        Value::List(list) => {
                            let value = list.pop_front();
                            let drained = list.is_empty();
                            value.map(|v| (v, drained))
                        }
                        other => return Err(wrong_type(key, other)),
                    },
                };
                if let Some((_, true)) = &popped {
                    state.entries.remove(key);
                }
                popped
            };
            if let Some((value, _)) = popped {
                return Ok(value);
            }

            if Instant::now() >= deadline {
                return Err(KvError::NotFound);
            }
            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep_until(deadline) => return Err(KvError::NotFound),
            }
        }
    }

    async fn publish(&self, topic: &str, payload: &str) -> KvResult<()> {
        let mut state = self.inner.state.lock().await;
        let drained = match state.topics.get_mut(topic) {
            None => false,
            Some(subscribers) => {
                subscribers.retain(|tx| !tx.is_closed());
                for tx in subscribers.iter() {
                    let _ = tx.try_send(payload.to_string());
                }
                subscribers.is_empty()
            }
        };
        if drained {
            state.topics.remove(topic);
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> KvResult<Subscription> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let mut state = self.inner.state.lock().await;
        state.topics.entry(topic.to_string()).or_default().push(tx);
        Ok(Subscription::new(rx, None))
    }
}
