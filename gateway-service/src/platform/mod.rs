//! The out-of-scope platform SDK boundary: session and shard traits plus the
//! wire models the gateway passes through.

pub mod events;
pub mod null;
mod session;

pub use events::*;
pub use session::{
    default_intents, EventHandler, Intents, PlatformError, PlatformSession, SessionConnector,
    ShardManager,
};
