//! Configuration parsing and validation.
//!
//! Settings come from an optional TOML file and are then overridden by the
//! process environment (`BOT_TOKEN`, `WEBHOOK_URL`, `PORT`). Every section
//! and field has a default, so the bot runs with no file at all as long as
//! the environment provides the credential.
//!
//! ```toml
//! [bot]
//! api_base = "https://api.telegram.org"
//! welcome_message = "Xin chao to VAR! Nhap tu khoa de tim kiem sao ke"
//!
//! [dataset]
//! path = "saoke_vietinbank.csv"
//!
//! [chunking]
//! max_chars = 4000
//!
//! [server]
//! bind = "0.0.0.0:5000"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::chunk::DEFAULT_MAX_CHARS;

/// Environment variable holding the Bot API credential.
pub const ENV_BOT_TOKEN: &str = "BOT_TOKEN";
/// Environment variable holding the public base URL of this server.
pub const ENV_WEBHOOK_URL: &str = "WEBHOOK_URL";
/// Environment variable overriding the listen port.
pub const ENV_PORT: &str = "PORT";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    /// Bot API credential. Normally supplied through `BOT_TOKEN`.
    #[serde(default)]
    pub token: Option<String>,
    /// Public base URL the platform should deliver updates to.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            webhook_url: None,
            api_base: default_api_base(),
            welcome_message: default_welcome_message(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}
fn default_welcome_message() -> String {
    "Xin chao to VAR! Nhap tu khoa de tim kiem sao ke".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_path")]
    pub path: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
            delimiter: default_delimiter(),
        }
    }
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("saoke_vietinbank.csv")
}
fn default_delimiter() -> String {
    ",".to_string()
}

impl DatasetConfig {
    /// The delimiter as the single byte the CSV reader expects.
    ///
    /// Only meaningful after [`Config::validate`] has accepted the value.
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
        }
    }
}

fn default_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

impl Config {
    /// Overlay environment values on top of the file settings.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a closure over
    /// a fixed map instead of mutating the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(ENV_BOT_TOKEN).filter(|t| !t.trim().is_empty()) {
            self.bot.token = Some(token.trim().to_string());
        }
        if let Some(url) = lookup(ENV_WEBHOOK_URL).filter(|u| !u.trim().is_empty()) {
            self.bot.webhook_url = Some(url.trim().to_string());
        }
        if let Some(port) = lookup(ENV_PORT).filter(|p| !p.trim().is_empty()) {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("{} must be a port number, got '{}'", ENV_PORT, port))?;
            self.server.bind = format!("0.0.0.0:{}", port);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chars == 0 {
            bail!("chunking.max_chars must be > 0");
        }

        let delim = self.dataset.delimiter.as_bytes();
        if delim.len() != 1 || !delim[0].is_ascii() {
            bail!(
                "dataset.delimiter must be a single ASCII character, got '{}'",
                self.dataset.delimiter
            );
        }

        if self.dataset.path.as_os_str().is_empty() {
            bail!("dataset.path must not be empty");
        }

        if self.bot.timeout_secs == 0 {
            bail!("bot.timeout_secs must be > 0");
        }

        if self.bot.api_base.trim().is_empty() {
            bail!("bot.api_base must not be empty");
        }

        Ok(())
    }

    /// The Bot API credential, or a fatal error naming the variable.
    pub fn bot_token(&self) -> Result<&str> {
        match self.bot.token.as_deref() {
            Some(token) => Ok(token),
            None => bail!(
                "Bot token not set. Please set the '{}' environment variable.",
                ENV_BOT_TOKEN
            ),
        }
    }

    /// The public webhook base URL, or a fatal error naming the variable.
    pub fn webhook_base(&self) -> Result<&str> {
        match self.bot.webhook_url.as_deref() {
            Some(url) => Ok(url),
            None => bail!("{} environment variable not set", ENV_WEBHOOK_URL),
        }
    }
}

/// Read the config file (if any), apply the process environment and validate.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content).with_context(|| "Failed to parse config file")?
        }
        None => Config::default(),
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;

    Ok(config)
}
