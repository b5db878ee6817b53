//! Store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KvError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("not found")]
    NotFound,

    #[error("timed out")]
    Timeout,

    #[error("encoding error: {0}")]
    Encoding(String),
}

pub type KvResult<T> = Result<T, KvError>;

impl From<redis::RedisError> for KvError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::TypeError => KvError::Encoding(err.to_string()),
            _ if err.is_timeout() => KvError::Timeout,
            _ => KvError::Transport(err.to_string()),
        }
    }
}
