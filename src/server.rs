//! Webhook HTTP server.
//!
//! The messaging platform delivers each update as a JSON `POST` to a path
//! containing the bot token, so only a caller who knows the token can feed
//! messages to the bot.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/{bot_token}` | Receive one update; replies are sent before responding |
//! | `GET`  | `/health` | Health check (version and dataset size) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid update payload: ..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404).
//!
//! A reply that fails to send is logged and does not change the response:
//! the platform would otherwise redeliver the update and the user would see
//! duplicate replies.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handler::Bot;
use crate::table::Table;
use crate::telegram::{Messenger, TelegramClient, Update};

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    bot: Arc<Bot>,
    messenger: Arc<dyn Messenger>,
    /// Secret path segment the webhook is registered under.
    token: Arc<str>,
}

impl AppState {
    pub fn new(bot: Arc<Bot>, messenger: Arc<dyn Messenger>, token: &str) -> Self {
        Self {
            bot,
            messenger,
            token: Arc::from(token),
        }
    }
}

/// Build the router without binding, so callers can mount or test it.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/{token}", post(handle_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the webhook server with the real Bot API client.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config, table: Arc<Table>) -> anyhow::Result<()> {
    let token = config.bot_token()?;
    let messenger = Arc::new(TelegramClient::new(&config.bot, token)?);
    run_server_with_messenger(config, table, messenger).await
}

/// Start the webhook server with a caller-supplied [`Messenger`].
pub async fn run_server_with_messenger(
    config: &Config,
    table: Arc<Table>,
    messenger: Arc<dyn Messenger>,
) -> anyhow::Result<()> {
    let token = config.bot_token()?;
    let bot = Arc::new(Bot::from_config(config, table));
    let rows = bot.table().len();
    let app = router(AppState::new(bot, messenger, token));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        bind = %config.server.bind,
        rows,
        "webhook server listening"
    );
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    rows: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rows: state.bot.table().len(),
    })
}

// ============ POST /{token} ============

/// Handler for `POST /{token}`.
///
/// The body is parsed by hand rather than with the `Json` extractor so that
/// a malformed payload gets the same error body as every other failure.
async fn handle_webhook(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<&'static str, AppError> {
    if token != *state.token {
        return Err(not_found("no webhook registered at this path"));
    }

    let update: Update = serde_json::from_slice(&body).map_err(|e| {
        tracing::warn!("rejecting malformed update: {}", e);
        bad_request(format!("invalid update payload: {}", e))
    })?;

    tracing::debug!(update_id = update.update_id, "received update");

    state
        .bot
        .handle_update(&update, state.messenger.as_ref())
        .await;

    Ok("OK")
}
