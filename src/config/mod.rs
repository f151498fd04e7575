//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

use crate::game::player::{PLAYER_HEIGHT, PLAYER_WIDTH};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Arena width in world units
    pub arena_width: f32,
    /// Arena height in world units
    pub arena_height: f32,
    /// Fixed seed for spawn positions (random when unset)
    pub arena_seed: Option<u64>,

    /// Telegram bot token; notifications are disabled without one
    pub telegram_bot_token: Option<String>,
    /// Bot API base URL
    pub telegram_api_url: String,

    /// Allowed client origin for CORS ("*" or comma-separated list)
    pub client_origin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:5000".to_string()),
        };

        let arena_width = parse_or(&lookup, "ARENA_WIDTH", 800.0_f32)?;
        let arena_height = parse_or(&lookup, "ARENA_HEIGHT", 600.0_f32)?;
        if !arena_width.is_finite() {
            return Err(ConfigError::Invalid("ARENA_WIDTH"));
        }
        if !arena_height.is_finite() {
            return Err(ConfigError::Invalid("ARENA_HEIGHT"));
        }
        let fits = arena_width >= PLAYER_WIDTH && arena_height >= PLAYER_HEIGHT;
        if !fits {
            return Err(ConfigError::ArenaTooSmall);
        }

        let arena_seed = match lookup("ARENA_SEED") {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|_| ConfigError::Invalid("ARENA_SEED"))?,
            ),
            None => None,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            arena_width,
            arena_height,
            arena_seed,

            telegram_bot_token: lookup("TELEGRAM_BOT_TOKEN").filter(|t| !t.trim().is_empty()),
            telegram_api_url: lookup("TELEGRAM_API_URL")
                .unwrap_or_else(|| "https://api.telegram.org".to_string()),

            client_origin: lookup("CLIENT_ORIGIN").unwrap_or_else(|| "*".to_string()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Arena must be at least as large as a player")]
    ArenaTooSmall,
}
