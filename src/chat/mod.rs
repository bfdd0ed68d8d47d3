//! Chat delivery boundary
//!
//! The coordinator and relay only ever see the `ChatDelivery` trait, so the
//! core logic is testable with in-memory fakes while `slack.rs` talks to the
//! real platform.

pub mod slack;

use anyhow::Result;
use async_trait::async_trait;

use crate::notification::RenderedMessage;

pub use slack::{SlackClient, SlackConfig};

/// Identifier of a message that was posted to the channel; replies are
/// threaded under it.
#[derive(Debug, Clone, PartialEq)]
pub struct PostedMessage {
    /// Platform timestamp/id of the posted message (thread anchor).
    pub ts: String,
    /// Channel the message landed in.
    pub channel: String,
}

/// Posts messages to the configured chat channel.
#[async_trait]
pub trait ChatDelivery: Send + Sync {
    /// Post a rendered notification to the channel, returning the thread anchor.
    async fn post_message(&self, message: &RenderedMessage) -> Result<PostedMessage>;

    /// Post a short acknowledgment as a threaded reply.
    async fn post_thread_reply(&self, thread_ts: &str, text: &str) -> Result<()>;

    /// Whether the platform connection was verified (reported by `/health`).
    fn is_connected(&self) -> bool;
}
