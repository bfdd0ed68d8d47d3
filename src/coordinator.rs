//! Notification coordinator - the debounce/cancel/dedup state machine
//!
//! Owns the single pending-notification timer and the last-sent
//! fingerprint. All transitions happen under one lock, which is never held
//! across an await; an epoch counter serializes a late timer fire against
//! a cancel, a replacement or a human reply that raced it.
//!
//! States:
//! - `Idle`: no pending timer
//! - `Pending`: timer armed, holding exactly one notification
//!
//! The debounce delay exists so a human at the terminal can answer before
//! the question escalates to chat. Rapid re-hooks replace the pending
//! notification (latest question wins); they never queue.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chat::ChatDelivery;
use crate::notification::{fingerprint, MessageFormatter, Notification};

pub struct Coordinator {
    delay: Duration,
    chat: Arc<dyn ChatDelivery>,
    formatter: MessageFormatter,
    state: Mutex<State>,
    /// Serializes deliveries: a fire that lands while another post is in
    /// flight waits for its outcome before consulting the dedup state.
    delivery: tokio::sync::Mutex<()>,
}

#[derive(Default)]
struct State {
    /// Bumped by every transition that invalidates an armed timer. A fire
    /// whose epoch no longer matches was superseded and must do nothing.
    epoch: u64,
    /// Bumped only by a human reply. A delivery that completes after a
    /// reply raced it must not re-record its fingerprint.
    reply_generation: u64,
    /// The armed timer, when in `Pending`.
    pending: Option<JoinHandle<()>>,
    /// Fingerprint of the last notification actually delivered to chat.
    last_sent: Option<String>,
}

impl Coordinator {
    pub fn new(delay: Duration, chat: Arc<dyn ChatDelivery>) -> Self {
        Self {
            delay,
            chat,
            formatter: MessageFormatter::new(),
            state: Mutex::new(State::default()),
            delivery: tokio::sync::Mutex::new(()),
        }
    }

    fn locked(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hook receipt: arm the timer, replacing (not merging with) any
    /// pending notification. Returns the debounce delay in milliseconds.
    pub fn hook_received(self: &Arc<Self>, notification: Notification) -> u64 {
        let mut state = self.locked();
        state.epoch += 1;
        let epoch = state.epoch;

        if let Some(handle) = state.pending.take() {
            handle.abort();
            debug!("Replacing pending notification");
        }

        let this = Arc::clone(self);
        state.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(this.delay).await;
            this.fire(epoch, notification).await;
        }));

        info!(delay_ms = self.delay.as_millis() as u64, "Notification queued");
        self.delay.as_millis() as u64
    }

    /// Cancel signal: disarm the timer without delivering. Returns whether
    /// a notification was actually pending.
    pub fn cancel(&self) -> bool {
        let mut state = self.locked();
        match state.pending.take() {
            Some(handle) => {
                handle.abort();
                state.epoch += 1;
                info!("Pending notification cancelled");
                true
            }
            None => false,
        }
    }

    /// A human answered in the terminal (via chat relay). Disarms any
    /// pending timer and clears the dedup memory: a repeat of the same
    /// question later is a new question.
    pub fn human_replied(&self) {
        let mut state = self.locked();
        state.epoch += 1;
        state.reply_generation += 1;
        if let Some(handle) = state.pending.take() {
            handle.abort();
            debug!("Pending notification dropped after human reply");
        }
        state.last_sent = None;
    }

    pub fn is_pending(&self) -> bool {
        self.locked().pending.is_some()
    }

    /// Timer expiry: suppress if the question is unchanged since the last
    /// delivery, otherwise post to chat. Delivery failure leaves the dedup
    /// state untouched so a later retry can go through.
    async fn fire(self: Arc<Self>, epoch: u64, notification: Notification) {
        // Wait out any post still in flight so the dedup check below sees
        // its outcome.
        let _delivery = self.delivery.lock().await;

        let key = fingerprint(&notification);
        let reply_generation = {
            let mut state = self.locked();
            if state.epoch != epoch {
                // superseded while sleeping
                return;
            }
            state.pending = None;
            if state.last_sent.as_deref() == Some(key.as_str()) {
                info!(fingerprint = %key, "Duplicate question, suppressing notification");
                return;
            }
            state.reply_generation
        };

        let rendered = self.formatter.render(&notification);
        match self.chat.post_message(&rendered).await {
            Ok(posted) => {
                let mut state = self.locked();
                // A human reply that raced the post already cleared the
                // dedup memory; that clear wins over this delivery. A
                // replacement hook, by contrast, must still see this
                // fingerprint as "already sent".
                if state.reply_generation == reply_generation {
                    state.last_sent = Some(key);
                }
                info!(ts = %posted.ts, "Notification delivered");
            }
            Err(e) => {
                warn!(error = %e, "Chat delivery failed, notification not sent");
            }
        }
    }
}
