//! Notification layer - payload normalization, rendering, dedup fingerprint

pub mod fingerprint;
pub mod formatter;
pub mod payload;

pub use fingerprint::fingerprint;
pub use formatter::{MessageFormatter, RenderedMessage};
pub use payload::{normalize, ChoiceEntry, Notification};
