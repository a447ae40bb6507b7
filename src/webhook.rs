//! Webhook registration with the messaging platform.
//!
//! The platform is told to deliver updates to `{WEBHOOK_URL}/{bot_token}`,
//! the same path [`crate::server`] listens on.

use anyhow::Result;

use crate::config::Config;
use crate::telegram::TelegramClient;

/// Full public URL for the webhook route.
pub fn webhook_url(base: &str, token: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), token)
}

/// Register the webhook before the server starts.
///
/// A missing `WEBHOOK_URL` is a configuration error and is returned. A
/// rejected registration call is only logged: the server can still receive
/// updates if an earlier registration is in place.
pub async fn register_on_startup(config: &Config) -> Result<()> {
    let token = config.bot_token()?;
    let url = webhook_url(config.webhook_base()?, token);
    let client = TelegramClient::new(&config.bot, token)?;

    match client.set_webhook(&url).await {
        Ok(()) => tracing::info!("Webhook set successfully"),
        Err(e) => tracing::error!("Failed to set webhook: {:#}", e),
    }

    Ok(())
}

/// `saoke webhook set`
pub async fn run_set(config: &Config) -> Result<()> {
    let token = config.bot_token()?;
    let url = webhook_url(config.webhook_base()?, token);
    let client = TelegramClient::new(&config.bot, token)?;

    client.set_webhook(&url).await?;
    println!("Webhook set to {}", redact(&url, token));
    Ok(())
}

/// `saoke webhook delete`
pub async fn run_delete(config: &Config) -> Result<()> {
    let client = TelegramClient::new(&config.bot, config.bot_token()?)?;
    client.delete_webhook().await?;
    println!("Webhook deleted.");
    Ok(())
}

/// `saoke webhook info`
pub async fn run_info(config: &Config) -> Result<()> {
    let token = config.bot_token()?;
    let client = TelegramClient::new(&config.bot, token)?;
    let info = client.get_webhook_info().await?;

    if info.url.is_empty() {
        println!("url:              (not set)");
    } else {
        println!("url:              {}", redact(&info.url, token));
    }
    println!("pending updates:  {}", info.pending_update_count);
    if let Some(msg) = info.last_error_message {
        println!("last error:       {}", msg);
    }
    Ok(())
}

/// Hide the token when printing a webhook URL.
fn redact(url: &str, token: &str) -> String {
    if token.is_empty() {
        return url.to_string();
    }
    url.replace(token, "<token>")
}
