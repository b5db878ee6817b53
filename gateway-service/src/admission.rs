use std::time::Duration;

use kv_store::{KvResult, KvStore};
use tracing::{debug, error};

use crate::keys;

/// Fixed-window admission control per (guild, identity).
///
/// A single atomic increment decides admission, so instances sharing a store
/// coordinate without locks; the platform's own limits backstop the
/// well-known window-boundary slack. Capture connect codes pass through the
/// same counters in place of a hashed identity.
#[derive(Clone)]
pub struct AdmissionController {
    kv: KvStore,
    capacity: i64,
    window: Duration,
}

impl AdmissionController {
    pub fn new(kv: KvStore, capacity: i64, window: Duration) -> Self {
        Self {
            kv,
            capacity,
            window,
        }
    }

    /// Try to take one admission grant for the current window. At most
    /// `capacity` calls return true per window; a denial never extends the
    /// window. Store failures deny.
    pub async fn try_admit(&self, guild_id: &str, identity: &str) -> bool {
        let key = keys::guild_token_lock(guild_id, identity);
        let count = match self.kv.incr(&key).await {
            Ok(count) => count,
            Err(e) => {
                error!(%guild_id, identity, error = %e, "admission increment failed");
                return false;
            }
        };
        let usable = count <= self.capacity;
        debug!(%guild_id, identity, count, usable, "guild token combo");
        if !usable {
            return false;
        }

        if let Err(e) = self.kv.expire(&key, self.window).await {
            error!(%guild_id, identity, error = %e, "failed to arm admission window");
        }
        true
    }

    /// Exhaust the window for `duration`; used to bench an identity or an
    /// unresponsive capture client.
    pub async fn blacklist(
        &self,
        guild_id: &str,
        identity: &str,
        duration: Duration,
    ) -> KvResult<()> {
        let key = keys::guild_token_lock(guild_id, identity);
        self.kv
            .set_ex(&key, &self.capacity.to_string(), duration)
            .await
    }
}
