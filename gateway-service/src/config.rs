use std::env;
use std::time::Duration;

use dotenvy::dotenv;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub redis_addr: String,
    pub redis_user: String,
    pub redis_pass: String,
    /// Selects the in-memory store and the inert platform adapter.
    pub test_mode: bool,
    /// Primary bot identity secret.
    pub bot_token: String,
    /// Secondary pool identity secrets.
    pub worker_bot_tokens: Vec<String>,
    /// Admission grants allowed per (guild, identity) per window.
    pub max_requests_per_window: i64,
    pub admission_window: Duration,
    /// Ladder walk limit when the request carries no premium tier.
    pub max_secondary_workers: usize,
    pub capture_ack_timeout: Duration,
    pub job_poll_timeout: Duration,
    pub task_poll_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let test_mode = env::var("TEST_MODE")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE"))
            .unwrap_or(false);

        let bot_token = env::var("BOT_TOKEN").unwrap_or_default();
        if bot_token.is_empty() && !test_mode {
            return Err(AppError::Config("BOT_TOKEN missing".into()));
        }

        let worker_bot_tokens = env::var("WORKER_BOT_TOKENS")
            .map(|raw| parse_worker_tokens(&raw))
            .unwrap_or_default();

        Ok(Self {
            port: parse_or("PORT", 5858),
            redis_addr: env::var("REDIS_ADDR").unwrap_or_else(|_| "127.0.0.1:6379".into()),
            redis_user: env::var("REDIS_USER").unwrap_or_default(),
            redis_pass: env::var("REDIS_PASS").unwrap_or_default(),
            test_mode,
            bot_token,
            worker_bot_tokens,
            max_requests_per_window: parse_or("MAX_REQUESTS_PER_WINDOW", 7),
            admission_window: Duration::from_secs(parse_or("ADMISSION_WINDOW_SECS", 5)),
            max_secondary_workers: parse_or("MAX_SECONDARY_WORKERS", 3),
            capture_ack_timeout: Duration::from_millis(parse_or("CAPTURE_ACK_TIMEOUT_MS", 3000)),
            job_poll_timeout: Duration::from_secs(parse_or("JOB_POLL_TIMEOUT_SECS", 10)),
            task_poll_timeout: Duration::from_secs(parse_or("TASK_POLL_TIMEOUT_SECS", 10)),
        })
    }
}

fn parse_or<T: std::str::FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Split the comma-separated identity secrets, stripping all whitespace.
pub fn parse_worker_tokens(raw: &str) -> Vec<String> {
    raw.replace(' ', "")
        .split(',')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
