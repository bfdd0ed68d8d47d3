//! Slack Web API client
//!
//! Thin reqwest wrapper around the three calls the bridge needs:
//! `auth.test` at startup, `chat.postMessage` for notifications and for
//! threaded acknowledgments.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{ChatDelivery, PostedMessage};
use crate::notification::RenderedMessage;

const API_BASE: &str = "https://slack.com/api";

/// Slack client configuration.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`).
    pub bot_token: String,
    /// Channel name or id notifications are posted to.
    pub channel: String,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            channel: "#agent-notifications".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Generic Slack API envelope; every endpoint answers `ok` plus an
/// optional `error` string.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug)]
pub struct SlackClient {
    client: Client,
    config: SlackConfig,
    connected: AtomicBool,
}

impl SlackClient {
    pub fn new(config: SlackConfig) -> Result<Self> {
        if config.bot_token.is_empty() {
            return Err(anyhow!("SLACK_BOT_TOKEN is required"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            connected: AtomicBool::new(false),
        })
    }

    /// Verify the token against `auth.test` and mark the client connected.
    ///
    /// Returns the bot's own user id, which the event intake uses to skip
    /// messages this bridge posted itself.
    pub async fn connect(&self) -> Result<String> {
        let response = self.call("auth.test", json!({})).await?;
        let user_id = response
            .user_id
            .ok_or_else(|| anyhow!("auth.test returned no user_id"))?;

        self.connected.store(true, Ordering::SeqCst);
        info!(bot_user = %user_id, channel = %self.config.channel, "Slack connection verified");
        Ok(user_id)
    }

    async fn call(&self, method: &str, payload: serde_json::Value) -> Result<ApiResponse> {
        let url = format!("{}/{}", API_BASE, method);
        debug!(method = %method, "Calling Slack API");

        let response: ApiResponse = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.bot_token))
            .json(&payload)
            .send()
            .await?
            .json()
            .await?;

        if response.ok {
            Ok(response)
        } else {
            Err(anyhow!(
                "Slack API {} failed: {}",
                method,
                response.error.unwrap_or_else(|| "unknown error".to_string())
            ))
        }
    }
}

#[async_trait]
impl ChatDelivery for SlackClient {
    async fn post_message(&self, message: &RenderedMessage) -> Result<PostedMessage> {
        let response = self
            .call(
                "chat.postMessage",
                json!({
                    "channel": self.config.channel,
                    "text": message.text,
                    "blocks": message.blocks,
                }),
            )
            .await?;

        let ts = response
            .ts
            .ok_or_else(|| anyhow!("chat.postMessage returned no ts"))?;
        let channel = response
            .channel
            .unwrap_or_else(|| self.config.channel.clone());

        info!(ts = %ts, channel = %channel, "Notification posted to chat");
        Ok(PostedMessage { ts, channel })
    }

    async fn post_thread_reply(&self, thread_ts: &str, text: &str) -> Result<()> {
        self.call(
            "chat.postMessage",
            json!({
                "channel": self.config.channel,
                "text": text,
                "thread_ts": thread_ts,
            }),
        )
        .await?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
