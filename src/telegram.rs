//! Telegram Bot API surface.
//!
//! - Update payload types, deserialized from the webhook body. Only the
//!   fields the bot reads are modelled; everything else is ignored.
//! - The [`Messenger`] trait, the one outbound capability the message
//!   handler needs. Tests substitute a recording implementation.
//! - [`TelegramClient`], the reqwest-backed implementation, plus the
//!   webhook management calls used at startup and by `saoke webhook`.
//!
//! Every Bot API method is a JSON `POST` to
//! `{api_base}/bot{token}/{method}` answering with the envelope
//! `{"ok": bool, "result": ..., "description": ...}`.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::config::BotConfig;

// ============ Update payload ============

/// Incoming webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

impl Update {
    /// Chat id and text of a text message, if this update carries one.
    pub fn text_message(&self) -> Option<(i64, &str)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        Some((message.chat.id, text))
    }
}

// ============ Outbound ============

/// Sends a text reply to a chat.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;
}

/// Envelope wrapping every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

/// Current webhook registration as reported by `getWebhookInfo`.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookInfo {
    pub url: String,
    #[serde(default)]
    pub pending_update_count: i64,
    #[serde(default)]
    pub last_error_message: Option<String>,
}

/// Bot API client over a shared `reqwest::Client`.
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(config: &BotConfig, token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = format!("{}/bot{}", config.api_base.trim_end_matches('/'), token);

        Ok(Self { client, base_url })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Bot API {} request failed", method))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read Bot API {} response", method))?;

        let envelope: ApiResponse<T> = serde_json::from_str(&text).map_err(|_| {
            anyhow!("Bot API {} returned {}: {}", method, status, text)
        })?;

        if !envelope.ok {
            bail!(
                "Bot API {} failed ({}): {}",
                method,
                status,
                envelope.description.unwrap_or_else(|| "no description".to_string())
            );
        }

        envelope
            .result
            .ok_or_else(|| anyhow!("Bot API {} returned no result", method))
    }

    /// Point the platform at `url` for update delivery.
    pub async fn set_webhook(&self, url: &str) -> Result<()> {
        let _: bool = self
            .call("setWebhook", serde_json::json!({ "url": url }))
            .await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<()> {
        let _: bool = self.call("deleteWebhook", serde_json::json!({})).await?;
        Ok(())
    }

    pub async fn get_webhook_info(&self) -> Result<WebhookInfo> {
        self.call("getWebhookInfo", serde_json::json!({})).await
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                serde_json::json!({ "chat_id": chat_id, "text": text }),
            )
            .await?;
        Ok(())
    }
}
