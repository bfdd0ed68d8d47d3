//! Infrastructure layer - terminal multiplexer access

pub mod tmux;

pub use tmux::{TerminalPort, TmuxBridge};
