use std::sync::Arc;

use kv_store::KvStore;

use crate::capture::CaptureChannel;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::platform::ShardManager;

#[derive(Clone)]
pub struct AppState {
    pub kv: KvStore,
    pub dispatcher: Arc<Dispatcher>,
    pub capture: CaptureChannel,
    pub shards: Arc<dyn ShardManager>,
    pub config: Arc<Config>,
}
