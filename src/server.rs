//! HTTP surface - hook endpoints plus chat event intake
//!
//! `/notify`, `/cancel` and `/health` are the contract the agent's hooks
//! call. `/slack/events` and `/slack/interactions` receive the chat
//! platform's callbacks (typed replies and button clicks) and hand them to
//! the reply relay. Event processing is fire-and-forget: the platform gets
//! its 200 immediately.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::chat::ChatDelivery;
use crate::coordinator::Coordinator;
use crate::notification::normalize;
use crate::relay::ReplyRelay;

pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub relay: Arc<ReplyRelay>,
    pub chat: Arc<dyn ChatDelivery>,
    /// Our own bot identity; its messages are never relayed back.
    pub bot_user_id: Option<String>,
    /// When set, only messages from this channel id are relayed.
    pub channel_id: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/notify", post(notify))
        .route("/cancel", post(cancel))
        .route("/health", get(health))
        .route("/slack/events", post(slack_events))
        .route("/slack/interactions", post(slack_interactions))
        .with_state(state)
}

/// Hook receipt. Always 200: a malformed payload is wrapped, never rejected.
async fn notify(State(state): State<Arc<AppState>>, body: String) -> Json<Value> {
    let notification = normalize(&body);
    debug!(?notification, "Hook received");

    let delay = state.coordinator.hook_received(notification);
    Json(json!({ "status": "queued", "delay": delay }))
}

/// The human answered in the terminal; drop the pending notification.
async fn cancel(State(state): State<Arc<AppState>>) -> Json<Value> {
    if state.coordinator.cancel() {
        Json(json!({ "status": "cancelled" }))
    } else {
        Json(json!({ "status": "no_pending_notification" }))
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "pending": state.coordinator.is_pending(),
        "chatConnected": state.chat.is_connected(),
    }))
}

/// Slack Events API intake: URL verification challenge plus channel
/// message events.
async fn slack_events(State(state): State<Arc<AppState>>, Json(payload): Json<Value>) -> Json<Value> {
    match payload["type"].as_str() {
        Some("url_verification") => {
            return Json(json!({ "challenge": payload["challenge"] }));
        }
        Some("event_callback") => {
            let event = payload["event"].clone();
            tokio::spawn(async move {
                handle_message_event(state, event).await;
            });
        }
        other => {
            debug!(event_type = ?other, "Ignoring unknown event payload");
        }
    }
    Json(json!({ "ok": true }))
}

async fn handle_message_event(state: Arc<AppState>, event: Value) {
    if event["type"].as_str() != Some("message") {
        return;
    }
    // never relay our own (or any bot's) messages back into the terminal
    if event.get("bot_id").and_then(Value::as_str).is_some() {
        return;
    }
    if state.bot_user_id.is_some() && event["user"].as_str() == state.bot_user_id.as_deref() {
        return;
    }
    if event["channel_type"].as_str() != Some("channel") {
        return;
    }
    // a workspace-wide event subscription delivers every channel's
    // messages; only the configured channel talks to the agent
    if let Some(channel_id) = state.channel_id.as_deref() {
        if event["channel"].as_str() != Some(channel_id) {
            debug!("Message from another channel, ignoring");
            return;
        }
    }

    let Some(text) = event["text"].as_str().filter(|t| !t.is_empty()) else {
        return;
    };
    let Some(thread_ts) = event["ts"].as_str() else {
        return;
    };

    info!(text = %text, "Chat reply received");

    let relay = state.relay.clone();
    let reply = text.to_string();
    let outcome = tokio::task::spawn_blocking(move || relay.handle_text_reply(&reply)).await;

    match outcome {
        Ok(outcome) => {
            if let Err(e) = state.chat.post_thread_reply(thread_ts, &outcome.ack_text()).await {
                warn!(error = %e, "Failed to post reply acknowledgment");
            }
        }
        Err(e) => warn!(error = %e, "Reply relay task failed"),
    }
}

#[derive(Debug, Deserialize)]
struct InteractionForm {
    /// Slack sends interaction payloads form-encoded as a single JSON field.
    payload: String,
}

/// Quick-select button clicks.
async fn slack_interactions(
    State(state): State<Arc<AppState>>,
    Form(form): Form<InteractionForm>,
) -> Json<Value> {
    let payload: Value = match serde_json::from_str(&form.payload) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Unparseable interaction payload");
            return Json(json!({ "ok": false }));
        }
    };

    if payload["type"].as_str() == Some("block_actions") {
        tokio::spawn(async move {
            handle_block_action(state, payload).await;
        });
    }
    Json(json!({ "ok": true }))
}

async fn handle_block_action(state: Arc<AppState>, payload: Value) {
    let action = &payload["actions"][0];
    let Some(index) = action["action_id"]
        .as_str()
        .and_then(|id| id.strip_prefix("option_"))
        .and_then(|n| n.parse::<usize>().ok())
    else {
        debug!("Interaction without a quick-select action id, ignoring");
        return;
    };
    let label = action["value"].as_str().unwrap_or("").to_string();
    let Some(thread_ts) = payload["message"]["ts"].as_str().map(str::to_string) else {
        return;
    };

    info!(index = index, label = %label, "Quick-select click received");

    let relay = state.relay.clone();
    let outcome =
        tokio::task::spawn_blocking(move || relay.handle_option_click(index, &label)).await;

    match outcome {
        Ok(outcome) => {
            if let Err(e) = state
                .chat
                .post_thread_reply(&thread_ts, &outcome.ack_text())
                .await
            {
                warn!(error = %e, "Failed to post click acknowledgment");
            }
        }
        Err(e) => warn!(error = %e, "Click relay task failed"),
    }
}
