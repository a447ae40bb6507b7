//! # saoke CLI
//!
//! Runs the keyword-search bot and a few supporting commands.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `saoke serve` | Register the webhook and start the HTTP server |
//! | `saoke search "<query>"` | Print the replies the bot would send for a query |
//! | `saoke dataset` | Show the loaded dataset's size and columns |
//! | `saoke webhook set\|delete\|info` | Manage the webhook registration |
//!
//! ## Environment
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `BOT_TOKEN` | Bot API credential (required for `serve` and `webhook`) |
//! | `WEBHOOK_URL` | Public base URL updates are delivered to |
//! | `PORT` | Listen on `0.0.0.0:$PORT` instead of `[server].bind` |
//! | `RUST_LOG` | Log filter (default `saoke_bot=info,tower_http=info`) |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use saoke_bot::config::{self, Config};
use saoke_bot::handler::Bot;
use saoke_bot::server;
use saoke_bot::table::Table;
use saoke_bot::webhook;

/// Keyword-search bot over a CSV dataset.
#[derive(Parser)]
#[command(
    name = "saoke",
    about = "Telegram bot that searches a CSV dataset by keyword",
    version
)]
struct Cli {
    /// Path to a TOML configuration file.
    ///
    /// Optional; without it every setting takes its default and the
    /// environment supplies the rest.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server.
    ///
    /// Loads the dataset, registers `{WEBHOOK_URL}/{BOT_TOKEN}` with the
    /// platform and serves updates until terminated.
    Serve {
        /// Don't call setWebhook before starting.
        #[arg(long)]
        skip_webhook: bool,
    },

    /// Search the dataset from the command line.
    ///
    /// Prints each reply block the bot would send, separated by `---`.
    Search {
        /// The search query.
        query: String,

        /// Override `[chunking].max_chars`.
        #[arg(long)]
        max_chars: Option<usize>,
    },

    /// Show dataset statistics.
    Dataset,

    /// Manage the webhook registration.
    Webhook {
        #[command(subcommand)]
        action: WebhookAction,
    },
}

#[derive(Subcommand)]
enum WebhookAction {
    /// Register `{WEBHOOK_URL}/{BOT_TOKEN}`.
    Set,
    /// Remove the current registration.
    Delete,
    /// Show the current registration.
    Info,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "saoke_bot=info,saoke=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_table(cfg: &Config) -> Result<Table> {
    let table = Table::load(&cfg.dataset.path, cfg.dataset.delimiter_byte())?;
    tracing::info!(
        path = %cfg.dataset.path.display(),
        rows = table.len(),
        columns = table.headers().len(),
        "dataset loaded"
    );
    Ok(table)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { skip_webhook } => {
            // Fail on a missing credential before doing any work
            cfg.bot_token()?;
            let table = Arc::new(load_table(&cfg)?);
            if skip_webhook {
                tracing::info!("skipping webhook registration");
            } else {
                webhook::register_on_startup(&cfg).await?;
            }
            server::run_server(&cfg, table).await?;
        }
        Commands::Search { query, max_chars } => {
            let table = Arc::new(load_table(&cfg)?);
            let max_chars = max_chars.unwrap_or(cfg.chunking.max_chars);
            if max_chars == 0 {
                anyhow::bail!("--max-chars must be > 0");
            }
            let bot = Bot::new(table, cfg.bot.welcome_message.clone(), max_chars);
            for (i, block) in bot.search_replies(&query).iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                println!("{}", block);
            }
        }
        Commands::Dataset => {
            let table = load_table(&cfg)?;
            println!("path:     {}", cfg.dataset.path.display());
            println!("rows:     {}", table.len());
            println!("columns:  {}", table.headers().len());
            println!("headers:  {}", table.headers().join(", "));
        }
        Commands::Webhook { action } => match action {
            WebhookAction::Set => webhook::run_set(&cfg).await?,
            WebhookAction::Delete => webhook::run_delete(&cfg).await?,
            WebhookAction::Info => webhook::run_info(&cfg).await?,
        },
    }

    Ok(())
}
