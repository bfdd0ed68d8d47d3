//! Notification payload model - normalizes arbitrary hook payloads
//!
//! The agent's hook may POST anything: a JSON object with well-known fields,
//! a JSON value of some other shape, or plain text. Everything downstream
//! works on a `Notification`, never on untyped data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One selectable answer choice inside a notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ChoiceEntry {
    /// Bare label, e.g. `"Yes"`.
    Label(String),
    /// Structured entry carrying `label` or `name` plus an optional description.
    Detailed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    /// Anything else (numbers, arrays). Kept verbatim so it still renders.
    Other(Value),
}

impl ChoiceEntry {
    /// Human-readable label, if the entry carries one.
    pub fn label(&self) -> Option<&str> {
        match self {
            ChoiceEntry::Label(s) => Some(s),
            ChoiceEntry::Detailed { label, name, .. } => label.as_deref().or(name.as_deref()),
            ChoiceEntry::Other(_) => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            ChoiceEntry::Detailed { description, .. } => description.as_deref(),
            _ => None,
        }
    }

    /// Label for display, falling back to a dump of the raw entry.
    /// `ordinal` is the 1-indexed position, used when nothing else is usable.
    pub fn display_label(&self, ordinal: usize) -> String {
        if let Some(label) = self.label() {
            return label.to_string();
        }
        match self {
            ChoiceEntry::Other(v) => v.to_string(),
            _ => format!("Option {}", ordinal),
        }
    }
}

/// A normalized "the agent needs input" notification.
///
/// Invariant: a notification with no recognizable fields still renders -
/// the formatter falls back to showing `raw`, truncated.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ChoiceEntry>>,
    /// Opaque question metadata some hooks attach; participates in the
    /// dedup fingerprint but is never rendered field-by-field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_data: Option<Value>,
    /// The original payload as received, for the debug section.
    #[serde(skip)]
    pub raw: Value,
}

impl Notification {
    /// Build a notification from an already-parsed JSON value.
    ///
    /// Objects with recognizable fields populate them; everything else
    /// (arrays, scalars, objects with mismatched field types) is kept as
    /// an opaque raw payload.
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value::<Notification>(value.clone()) {
            Ok(mut notification) => {
                notification.raw = value;
                notification
            }
            Err(_) => Notification {
                raw: value,
                ..Default::default()
            },
        }
    }

    /// Wrap plain text as a message-only notification.
    pub fn from_text(text: &str) -> Self {
        Notification {
            message: Some(text.to_string()),
            raw: Value::String(text.to_string()),
            ..Default::default()
        }
    }
}

/// Parse an incoming hook body into a `Notification`.
///
/// Textual payloads are first tried as JSON; on parse failure the whole
/// body becomes the message. A malformed payload is never an error.
pub fn normalize(body: &str) -> Notification {
    match serde_json::from_str::<Value>(body.trim()) {
        Ok(value) => Notification::from_value(value),
        Err(_) => Notification::from_text(body),
    }
}
