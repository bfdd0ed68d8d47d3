//! tmux/byobu bridge - session discovery and keystroke injection
//!
//! Stateless external-process calls. Sessions are re-resolved on every
//! injection because the attached session can change between calls.

use anyhow::{anyhow, Result};
use std::process::Command;
use tracing::{debug, error, info, warn};

/// Seam between the reply path and the real multiplexer, so the core can
/// be tested with fakes.
pub trait TerminalPort: Send + Sync {
    /// Discover the session to target, or `None` when no multiplexer is
    /// usable. Never errors.
    fn resolve_session(&self) -> Option<String>;

    /// Deliver `text` as literal characters followed by Enter.
    fn inject(&self, session: &str, text: &str) -> Result<()>;
}

const PRIMARY_BIN: &str = "tmux";
const SECONDARY_BIN: &str = "byobu";

/// Real tmux/byobu implementation.
pub struct TmuxBridge {
    /// Explicit session override; used verbatim when set, no discovery.
    session_override: Option<String>,
}

impl TmuxBridge {
    pub fn new(session_override: Option<String>) -> Self {
        Self { session_override }
    }

    /// Run `<bin> list-sessions -F <format>` and return trimmed non-empty
    /// lines. An absent binary or non-zero exit yields `None`.
    fn list_sessions(bin: &str, format: &str) -> Option<Vec<String>> {
        if which::which(bin).is_err() {
            debug!(bin = %bin, "Multiplexer binary not found");
            return None;
        }

        let output = Command::new(bin)
            .args(["list-sessions", "-F", format])
            .output()
            .ok()?;

        // list-sessions exits non-zero when no server is running
        if !output.status.success() {
            return None;
        }

        let lines: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(lines)
        }
    }
}

impl TerminalPort for TmuxBridge {
    fn resolve_session(&self) -> Option<String> {
        if let Some(session) = &self.session_override {
            debug!(session = %session, "Using configured session override");
            return Some(session.clone());
        }

        // Prefer the session a client is attached to
        if let Some(lines) =
            Self::list_sessions(PRIMARY_BIN, "#{session_name}:#{session_attached}")
        {
            if let Some(session) = pick_attached(&lines) {
                debug!(session = %session, "Resolved attached tmux session");
                return Some(session);
            }
            if let Some(first) = lines.first().and_then(|l| split_session_line(l)) {
                debug!(session = %first, "No attached session, using first tmux session");
                return Some(first.to_string());
            }
        }

        if let Some(lines) = Self::list_sessions(SECONDARY_BIN, "#{session_name}") {
            if let Some(first) = lines.first() {
                debug!(session = %first, "Falling back to first byobu session");
                return Some(first.clone());
            }
        }

        warn!("No tmux/byobu session found");
        None
    }

    fn inject(&self, session: &str, text: &str) -> Result<()> {
        info!(session = %session, text_len = text.len(), "Injecting reply into session");

        // -l sends the text literally so option numbers, "Enter", quotes
        // etc. are never interpreted as key names
        let status = Command::new(PRIMARY_BIN)
            .args(["send-keys", "-t", session, "-l", text])
            .status()?;

        if !status.success() {
            error!(session = %session, "Failed to send literal text");
            return Err(anyhow!("failed to send text to session: {}", session));
        }

        // Enter is sent as a separate key press; must not run if the
        // literal step failed
        let status = Command::new(PRIMARY_BIN)
            .args(["send-keys", "-t", session, "Enter"])
            .status()?;

        if status.success() {
            debug!(session = %session, "Reply delivered");
            Ok(())
        } else {
            error!(session = %session, "Failed to send Enter");
            Err(anyhow!("failed to send Enter to session: {}", session))
        }
    }
}

/// First session whose attached-client count is non-zero.
///
/// Lines are `<name>:<attached>`; tmux session names cannot contain `:`,
/// so splitting on the last colon is safe.
fn pick_attached(lines: &[String]) -> Option<String> {
    lines.iter().find_map(|line| {
        let (name, attached) = line.rsplit_once(':')?;
        if attached.trim() != "0" {
            Some(name.to_string())
        } else {
            None
        }
    })
}

/// Session name from a `<name>:<attached>` listing line.
fn split_session_line(line: &str) -> Option<&str> {
    line.rsplit_once(':').map(|(name, _)| name)
}
