//! HTTP tests for the Bot API client.
//!
//! A small axum app on a free local port stands in for the Bot API. The
//! token in the request path selects how it answers: `ok` accepts,
//! `rejected` answers with an error envelope, `broken` answers with a
//! plain-text gateway error.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use saoke_bot::config::{BotConfig, Config};
use saoke_bot::telegram::{Messenger, TelegramClient};
use saoke_bot::webhook;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Request bodies received by the stub, keyed by route.
type Received = Arc<Mutex<Vec<(&'static str, Value)>>>;

// ─── Stub Bot API ───────────────────────────────────────────────────

async fn send_ok(State(received): State<Received>, Json(body): Json<Value>) -> Json<Value> {
    received.lock().unwrap().push(("ok/sendMessage", body));
    Json(json!({"ok": true, "result": {"message_id": 1, "chat": {"id": 42}}}))
}

async fn send_rejected() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })),
    )
}

async fn send_broken() -> (StatusCode, &'static str) {
    (StatusCode::BAD_GATEWAY, "Bad Gateway")
}

async fn set_webhook_ok(State(received): State<Received>, Json(body): Json<Value>) -> Json<Value> {
    received.lock().unwrap().push(("ok/setWebhook", body));
    Json(json!({"ok": true, "result": true, "description": "Webhook was set"}))
}

async fn set_webhook_rejected(
    State(received): State<Received>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    received.lock().unwrap().push(("rejected/setWebhook", body));
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: bad webhook: HTTPS url must be provided for webhook"
        })),
    )
}

async fn start_stub() -> (String, Received) {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/botok/sendMessage", post(send_ok))
        .route("/botrejected/sendMessage", post(send_rejected))
        .route("/botbroken/sendMessage", post(send_broken))
        .route("/botok/setWebhook", post(set_webhook_ok))
        .route("/botrejected/setWebhook", post(set_webhook_rejected))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), received)
}

fn bot_config(api_base: &str) -> BotConfig {
    BotConfig {
        api_base: api_base.to_string(),
        timeout_secs: 5,
        ..BotConfig::default()
    }
}

fn app_config(api_base: &str, token: &str) -> Config {
    let mut config = Config::default();
    config.bot = bot_config(api_base);
    config.bot.token = Some(token.to_string());
    config.bot.webhook_url = Some("https://bot.example.com".to_string());
    config
}

// ─── sendMessage ────────────────────────────────────────────────────

#[tokio::test]
async fn test_send_message_ok() {
    let (api_base, received) = start_stub().await;
    let client = TelegramClient::new(&bot_config(&api_base), "ok").unwrap();

    client.send_message(42, "A | 1 | foo").await.unwrap();

    let received = received.lock().unwrap().clone();
    assert_eq!(
        received,
        vec![("ok/sendMessage", json!({"chat_id": 42, "text": "A | 1 | foo"}))]
    );
}

#[tokio::test]
async fn test_send_message_error_carries_description() {
    let (api_base, _) = start_stub().await;
    let client = TelegramClient::new(&bot_config(&api_base), "rejected").unwrap();

    let err = client.send_message(42, "hi").await.unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("sendMessage"), "got: {}", msg);
    assert!(msg.contains("Bad Request: chat not found"), "got: {}", msg);
}

#[tokio::test]
async fn test_send_message_non_json_body() {
    let (api_base, _) = start_stub().await;
    let client = TelegramClient::new(&bot_config(&api_base), "broken").unwrap();

    let err = client.send_message(42, "hi").await.unwrap_err();
    let msg = format!("{:#}", err);
    assert!(msg.contains("502"), "got: {}", msg);
    assert!(msg.contains("Bad Gateway"), "got: {}", msg);
}

#[tokio::test]
async fn test_unreachable_api_is_an_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client =
        TelegramClient::new(&bot_config(&format!("http://127.0.0.1:{}", port)), "ok").unwrap();

    let err = client.send_message(42, "hi").await.unwrap_err();
    assert!(err.to_string().contains("sendMessage"));
}

// ─── setWebhook ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_set_webhook_sends_url() {
    let (api_base, received) = start_stub().await;
    let client = TelegramClient::new(&bot_config(&api_base), "ok").unwrap();

    client
        .set_webhook("https://bot.example.com/ok")
        .await
        .unwrap();

    let received = received.lock().unwrap().clone();
    assert_eq!(
        received,
        vec![("ok/setWebhook", json!({"url": "https://bot.example.com/ok"}))]
    );
}

#[tokio::test]
async fn test_register_on_startup_tolerates_rejection() {
    let (api_base, received) = start_stub().await;
    let config = app_config(&api_base, "rejected");

    webhook::register_on_startup(&config).await.unwrap();

    // The call was made and refused; startup still went ahead
    let received = received.lock().unwrap().clone();
    assert_eq!(
        received,
        vec![(
            "rejected/setWebhook",
            json!({"url": "https://bot.example.com/rejected"})
        )]
    );
}

#[tokio::test]
async fn test_webhook_set_command_reports_rejection() {
    let (api_base, _) = start_stub().await;
    let config = app_config(&api_base, "rejected");

    let err = webhook::run_set(&config).await.unwrap_err();
    assert!(format!("{:#}", err).contains("bad webhook"));
}

#[tokio::test]
async fn test_register_on_startup_ok() {
    let (api_base, received) = start_stub().await;
    let config = app_config(&api_base, "ok");

    webhook::register_on_startup(&config).await.unwrap();
    assert_eq!(received.lock().unwrap().len(), 1);
}
