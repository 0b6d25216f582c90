use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use crate::session::CallerId;

/// Application configuration loaded from environment variables.
/// Fails at startup if a set variable cannot be parsed.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent → history lives in memory and sessions come from `session_tokens`.
    pub database_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub mock_engine_latency: Duration,
    /// Set → requests go to a `RemoteEngine` at this URL instead of the mock.
    pub engine_url: Option<String>,
    pub engine_api_key: Option<String>,
    pub engine_timeout: Duration,
    pub session_tokens: HashMap<String, CallerId>,
    pub max_upload_bytes: usize,
    pub history_cache_ttl: Duration,
    pub history_cache_max_entries: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            mock_engine_latency: Duration::from_millis(parse_env("MOCK_ENGINE_LATENCY_MS", 3000)?),
            engine_url: optional_env("TAILOR_ENGINE_URL"),
            engine_api_key: optional_env("TAILOR_ENGINE_API_KEY"),
            engine_timeout: Duration::from_secs(parse_env("TAILOR_ENGINE_TIMEOUT_SECS", 60)?),
            session_tokens: parse_session_tokens(
                &std::env::var("SESSION_TOKENS").unwrap_or_default(),
            )?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
            history_cache_ttl: Duration::from_secs(parse_env("HISTORY_CACHE_TTL_SECS", 60)?),
            history_cache_max_entries: parse_env("HISTORY_CACHE_MAX_ENTRIES", 1024)?,
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

/// Parses `token=uuid,token=uuid`.
fn parse_session_tokens(raw: &str) -> Result<HashMap<String, CallerId>> {
    let mut tokens = HashMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((token, user_id)) = pair.split_once('=') else {
            bail!("SESSION_TOKENS entry '{pair}' must look like token=uuid");
        };
        let user_id = Uuid::parse_str(user_id.trim())
            .with_context(|| format!("SESSION_TOKENS entry '{pair}' has an invalid uuid"))?;
        tokens.insert(token.trim().to_string(), CallerId(user_id));
    }
    Ok(tokens)
}
