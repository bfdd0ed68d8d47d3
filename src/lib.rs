//! Agent Chat Bridge - relay terminal-agent questions to chat and answers back
//!
//! An interactive CLI agent running inside tmux/byobu POSTs "I need input"
//! hooks to this bridge. After a debounce window (so the human can answer
//! in the terminal first) the question escalates to a chat channel; chat
//! replies and button clicks are injected back into the live session as
//! keystrokes.

pub mod chat;
pub mod config;
pub mod coordinator;
pub mod infra;
pub mod notification;
pub mod relay;
pub mod server;

pub use chat::{ChatDelivery, PostedMessage, SlackClient, SlackConfig};
pub use config::Config;
pub use coordinator::Coordinator;
pub use infra::{TerminalPort, TmuxBridge};
pub use notification::{fingerprint, normalize, MessageFormatter, Notification, RenderedMessage};
pub use relay::{ReplyOutcome, ReplyRelay};
pub use server::{router, AppState};
