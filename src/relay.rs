//! Reply relay - delivers chat answers back into the terminal session
//!
//! Invoked by the chat event intake for both typed replies and button
//! clicks. The session is re-resolved per reply; on a successful injection
//! the coordinator forgets the answered question's fingerprint.

use std::sync::Arc;

use tracing::{info, warn};

use crate::coordinator::Coordinator;
use crate::infra::TerminalPort;

/// What happened to a relayed answer; the server turns this into a
/// threaded acknowledgment.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    /// Injected into the session; `echoed` is the text that was typed.
    Sent { echoed: String },
    /// No usable multiplexer session was found.
    NoSession,
    /// A session was found but the keystrokes could not be delivered.
    InjectFailed,
}

impl ReplyOutcome {
    /// Acknowledgment text posted back to the chat thread.
    pub fn ack_text(&self) -> String {
        match self {
            ReplyOutcome::Sent { echoed } => format!("✅ Sent to agent: {}", echoed),
            ReplyOutcome::NoSession | ReplyOutcome::InjectFailed => {
                "❌ Could not reach the terminal. Is tmux/byobu running?".to_string()
            }
        }
    }
}

pub struct ReplyRelay {
    terminal: Arc<dyn TerminalPort>,
    coordinator: Arc<Coordinator>,
}

impl ReplyRelay {
    pub fn new(terminal: Arc<dyn TerminalPort>, coordinator: Arc<Coordinator>) -> Self {
        Self {
            terminal,
            coordinator,
        }
    }

    /// Relay a typed chat reply verbatim.
    pub fn handle_text_reply(&self, text: &str) -> ReplyOutcome {
        info!(text = %text, "Relaying chat reply to terminal");
        self.deliver(text, text)
    }

    /// Relay a quick-select click. The agent expects the 1-indexed ordinal
    /// of the option as literal text, not the option's label.
    pub fn handle_option_click(&self, option_index: usize, label: &str) -> ReplyOutcome {
        let ordinal = (option_index + 1).to_string();
        info!(option = %label, ordinal = %ordinal, "Relaying option click to terminal");
        let echoed = format!("{} ({})", ordinal, label);
        self.deliver(&ordinal, &echoed)
    }

    fn deliver(&self, text: &str, echoed: &str) -> ReplyOutcome {
        let Some(session) = self.terminal.resolve_session() else {
            warn!("Reply dropped: no terminal session available");
            return ReplyOutcome::NoSession;
        };

        match self.terminal.inject(&session, text) {
            Ok(()) => {
                // the question was answered; the next identical question
                // must notify again
                self.coordinator.human_replied();
                ReplyOutcome::Sent {
                    echoed: echoed.to_string(),
                }
            }
            Err(e) => {
                warn!(session = %session, error = %e, "Reply injection failed");
                ReplyOutcome::InjectFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;
    use std::time::Duration;

    struct FakeTerminal {
        session: Option<String>,
        fail_inject: bool,
        injected: Mutex<Vec<(String, String)>>,
    }

    impl FakeTerminal {
        fn with_session(name: &str) -> Arc<Self> {
            Arc::new(Self {
                session: Some(name.to_string()),
                fail_inject: false,
                injected: Mutex::new(Vec::new()),
            })
        }

        fn unavailable() -> Arc<Self> {
            Arc::new(Self {
                session: None,
                fail_inject: false,
                injected: Mutex::new(Vec::new()),
            })
        }
    }

    impl TerminalPort for FakeTerminal {
        fn resolve_session(&self) -> Option<String> {
            self.session.clone()
        }

        fn inject(&self, session: &str, text: &str) -> anyhow::Result<()> {
            if self.fail_inject {
                return Err(anyhow!("transport error"));
            }
            self.injected
                .lock()
                .unwrap()
                .push((session.to_string(), text.to_string()));
            Ok(())
        }
    }

    struct NullChat;

    #[async_trait::async_trait]
    impl crate::chat::ChatDelivery for NullChat {
        async fn post_message(
            &self,
            _message: &crate::notification::RenderedMessage,
        ) -> anyhow::Result<crate::chat::PostedMessage> {
            Ok(crate::chat::PostedMessage {
                ts: "1.0".to_string(),
                channel: "#test".to_string(),
            })
        }

        async fn post_thread_reply(&self, _thread_ts: &str, _text: &str) -> anyhow::Result<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    fn coordinator() -> Arc<Coordinator> {
        Arc::new(Coordinator::new(
            Duration::from_millis(50),
            Arc::new(NullChat),
        ))
    }

    #[tokio::test]
    async fn test_text_reply_injected_verbatim() {
        let terminal = FakeTerminal::with_session("agent");
        let relay = ReplyRelay::new(terminal.clone(), coordinator());

        let outcome = relay.handle_text_reply("use the second approach");
        assert_eq!(
            outcome,
            ReplyOutcome::Sent {
                echoed: "use the second approach".to_string()
            }
        );
        assert_eq!(
            terminal.injected.lock().unwrap()[0],
            ("agent".to_string(), "use the second approach".to_string())
        );
    }

    #[tokio::test]
    async fn test_option_click_injects_ordinal_not_label() {
        let terminal = FakeTerminal::with_session("agent");
        let relay = ReplyRelay::new(terminal.clone(), coordinator());

        // second button (index 1) -> literal "2"
        let outcome = relay.handle_option_click(1, "No");
        assert!(matches!(outcome, ReplyOutcome::Sent { .. }));
        assert_eq!(
            terminal.injected.lock().unwrap()[0],
            ("agent".to_string(), "2".to_string())
        );
    }

    #[tokio::test]
    async fn test_no_session_reports_failure_without_injecting() {
        let terminal = FakeTerminal::unavailable();
        let relay = ReplyRelay::new(terminal.clone(), coordinator());

        let outcome = relay.handle_text_reply("hello");
        assert_eq!(outcome, ReplyOutcome::NoSession);
        assert!(terminal.injected.lock().unwrap().is_empty());
        assert!(outcome.ack_text().contains("❌"));
    }

    #[tokio::test]
    async fn test_successful_reply_disarms_pending_notification() {
        let terminal = FakeTerminal::with_session("agent");
        let coordinator = coordinator();
        let relay = ReplyRelay::new(terminal, coordinator.clone());

        coordinator.hook_received(crate::notification::normalize(r#"{"message":"q"}"#));
        assert!(coordinator.is_pending());

        relay.handle_text_reply("answer");
        assert!(!coordinator.is_pending());
    }

    #[tokio::test]
    async fn test_failed_injection_keeps_coordinator_state() {
        let terminal = Arc::new(FakeTerminal {
            session: Some("agent".to_string()),
            fail_inject: true,
            injected: Mutex::new(Vec::new()),
        });
        let coordinator = coordinator();
        let relay = ReplyRelay::new(terminal, coordinator.clone());

        coordinator.hook_received(crate::notification::normalize(r#"{"message":"q"}"#));
        let outcome = relay.handle_text_reply("answer");
        assert_eq!(outcome, ReplyOutcome::InjectFailed);
        // the question is still unanswered
        assert!(coordinator.is_pending());
    }
}
