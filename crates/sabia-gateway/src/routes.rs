//! Route handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use sabia_channels::{Skipped, parse_webhook};
use sabia_core::error::SabiaError;

use crate::server::AppState;

/// Header Telegram uses to echo the secret given to `setWebhook`.
pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Liveness text kept from the first deployment.
pub async fn index() -> &'static str {
    "everything is awesome"
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "queue": state.queue.stats(),
    }))
}

/// Telegram webhook: parse and enqueue, then acknowledge. Never processes inline.
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, &'static str) {
    if let Some(expected) = &state.webhook_secret {
        let given = headers
            .get(SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if given != expected {
            tracing::warn!("[webhook] Rejected update with missing or wrong secret");
            return (StatusCode::UNAUTHORIZED, "unauthorized");
        }
    }

    let payload: serde_json::Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("[webhook] Malformed body: {e}");
            return (StatusCode::OK, "ok");
        }
    };

    let inbound = match parse_webhook(&payload) {
        Ok(inbound) => inbound,
        Err(Skipped::Malformed) => {
            tracing::warn!("[webhook] Update without message.chat.id: {}", payload);
            return (StatusCode::OK, "ok");
        }
        Err(Skipped::NoText) => {
            tracing::debug!("[webhook] Ignoring message without text");
            return (StatusCode::OK, "ok");
        }
    };

    match state.queue.enqueue(inbound.chat_id, &inbound.text) {
        Ok(order) => {
            tracing::debug!("[webhook] chat_id={} queued as #{}", inbound.chat_id, order);
            (StatusCode::OK, "ok")
        }
        Err(SabiaError::QueueFull(_)) => (StatusCode::SERVICE_UNAVAILABLE, "busy"),
        Err(e) => {
            tracing::error!("[webhook] chat_id={} not queued: {}", inbound.chat_id, e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
