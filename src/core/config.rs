use secrecy::SecretString;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::core::error::{AppError, AppResult};

/// Default SQLite file when DATABASE_PATH is unset
pub const DEFAULT_DATABASE_PATH: &str = "doorman.sqlite";

/// Default log file when LOG_FILE_PATH is unset
pub const DEFAULT_LOG_FILE_PATH: &str = "doorman.log";

/// Runtime configuration, read once at startup.
///
/// Built from any key lookup so tests can feed a map instead of the process
/// environment. Only presence and shape are checked here; whether the token
/// actually works is found out by the first `getMe`.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: SecretString,
    pub admin_ids: Vec<i64>,
    pub bot_api_url: Option<Url>,
    pub database_path: PathBuf,
    pub channel_link: Option<Url>,
    pub channel_id: Option<i64>,
    /// `None` keeps pending inputs until they are consumed or cancelled.
    pub pending_input_ttl: Option<Duration>,
    pub webhook_url: Option<Url>,
    pub webhook_addr: Option<SocketAddr>,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = get("BOT_TOKEN")
            .or_else(|| get("TELOXIDE_TOKEN"))
            .ok_or_else(|| AppError::Config("BOT_TOKEN (or TELOXIDE_TOKEN) is not set".to_string()))?;

        let admin_ids = get("ADMIN_IDS")
            .map(|raw| admin::parse_admin_ids(&raw))
            .unwrap_or_default();
        if admin_ids.is_empty() {
            return Err(AppError::Config(
                "ADMIN_IDS must contain at least one numeric user id".to_string(),
            ));
        }

        let bot_api_url = get("BOT_API_URL").map(|raw| Url::parse(&raw)).transpose()?;

        let channel_id = match get("CHANNEL_ID") {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| AppError::Config(format!("CHANNEL_ID is not a chat id: {}", raw)))?,
            ),
            None => None,
        };

        let pending_input_ttl = match get("PENDING_INPUT_TTL_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| {
                    AppError::Config(format!("PENDING_INPUT_TTL_SECS is not a number of seconds: {}", raw))
                })?;
                session::ttl_from_secs(secs)
            }
            None => session::ttl_from_secs(session::DEFAULT_TTL_SECS),
        };

        let channel_link = get("CHANNEL_LINK").map(|raw| Url::parse(&raw)).transpose()?;

        let webhook_url = get("WEBHOOK_URL").map(|raw| Url::parse(&raw)).transpose()?;
        let webhook_addr = match get("WEBHOOK_ADDR") {
            Some(raw) => Some(
                raw.parse::<SocketAddr>()
                    .map_err(|_| AppError::Config(format!("WEBHOOK_ADDR is not a socket address: {}", raw)))?,
            ),
            None => None,
        };

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            admin_ids,
            bot_api_url,
            database_path: PathBuf::from(get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())),
            channel_link,
            channel_id,
            pending_input_ttl,
            webhook_url,
            webhook_addr,
        })
    }
}

/// Database file path for commands that don't need the full bot config.
pub fn database_path_from_env() -> PathBuf {
    env::var("DATABASE_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
}

/// Log file path, read before the rest of the config so errors can be logged.
pub fn log_file_path_from_env() -> String {
    env::var("LOG_FILE_PATH")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_FILE_PATH.to_string())
}

/// Admin configuration
pub mod admin {
    /// Splits on commas and any whitespace; non-numeric parts are skipped.
    pub fn parse_admin_ids(raw: &str) -> Vec<i64> {
        raw.split([',', ' ', '\n', '\t'])
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .collect()
    }
}

/// Pending-input configuration
pub mod session {
    use super::Duration;

    /// Awaiting-input expiry when PENDING_INPUT_TTL_SECS is unset (10 minutes)
    pub const DEFAULT_TTL_SECS: u64 = 600;

    /// How often expired pending inputs are swept
    pub const CLEANUP_INTERVAL_SECS: u64 = 60;

    /// `0` means never expire.
    pub fn ttl_from_secs(secs: u64) -> Option<Duration> {
        (secs > 0).then(|| Duration::from_secs(secs))
    }

    pub fn cleanup_interval() -> Duration {
        Duration::from_secs(CLEANUP_INTERVAL_SECS)
    }
}

/// Broadcast configuration
pub mod broadcast {
    /// The status message is edited after this many recipients
    pub const PROGRESS_EVERY: usize = 10;
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Startup configuration
pub mod startup {
    use super::Duration;

    /// Attempts at `getMe` before giving up
    pub const GET_ME_ATTEMPTS: u32 = 5;

    /// Delay between `getMe` attempts (in seconds)
    pub const GET_ME_RETRY_DELAY_SECS: u64 = 5;

    pub fn get_me_retry_delay() -> Duration {
        Duration::from_secs(GET_ME_RETRY_DELAY_SECS)
    }
}
