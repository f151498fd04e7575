//! Telegram Bot API client for outbound chat messages

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Minimal Bot API client (sendMessage only)
#[derive(Clone)]
pub struct BotClient {
    client: Client,
    base_url: String,
    token: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Envelope every Bot API response is wrapped in
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl BotClient {
    /// `None` when no bot token is configured
    pub fn from_config(config: &Config) -> Option<Self> {
        let token = config.telegram_bot_token.clone()?;
        Some(Self::new(config.telegram_api_url.clone(), token))
    }

    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Send a plain text message to a chat
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessage { chat_id, text })
            .send()
            .await
            .map_err(NotifyError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ApiResponse = response.json().await.map_err(NotifyError::Parse)?;
        if !parsed.ok {
            return Err(NotifyError::Rejected(
                parsed.description.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(())
    }
}

/// Notification delivery errors
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    #[error("Bot API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse Bot API response: {0}")]
    Parse(reqwest::Error),

    #[error("Bot API rejected message: {0}")]
    Rejected(String),
}
