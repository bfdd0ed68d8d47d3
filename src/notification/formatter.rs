//! Message formatting - renders a `Notification` into chat blocks
//!
//! Produces the block layout the chat platform displays: a header, the
//! optional title/message/body sections, an enumerated options list with
//! quick-select buttons, and a truncated raw-payload debug footer.

use serde_json::{json, Value};

use super::payload::Notification;

/// Quick-select buttons are capped regardless of how many options exist;
/// excess options stay listed but are answerable only by a typed reply.
pub const MAX_QUICK_SELECT: usize = 5;
/// Chat platforms reject button labels longer than this.
pub const BUTTON_LABEL_MAX: usize = 75;
/// Upper bound for the raw-payload debug dump.
pub const RAW_PREVIEW_MAX: usize = 500;
/// Raw dumps shorter than this are omitted entirely - the rendered
/// sections already show everything.
const RAW_PREVIEW_MIN: usize = 100;

const HEADER_TEXT: &str = "🤖 Agent is waiting for input";
const OPTIONS_HEADING: &str = "*Options:*";
const FOOTER_HINT: &str = "💬 Click a button or reply in the thread";

/// A rendered chat message: plain-text fallback plus structured blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    /// Fallback text shown in desktop/mobile notification banners.
    pub text: String,
    /// Block-kit style layout, serialized as JSON values.
    pub blocks: Vec<Value>,
}

/// Renders notifications into chat messages.
#[derive(Debug, Default)]
pub struct MessageFormatter;

impl MessageFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, notification: &Notification) -> RenderedMessage {
        let mut blocks = vec![json!({
            "type": "header",
            "text": { "type": "plain_text", "text": HEADER_TEXT, "emoji": true }
        })];

        if let Some(title) = &notification.title {
            blocks.push(section(&format!("*{}*", title)));
        }
        if let Some(message) = &notification.message {
            blocks.push(section(message));
        }
        if let Some(body) = &notification.body {
            blocks.push(section(body));
        }

        if let Some(options) = &notification.options {
            if !options.is_empty() {
                blocks.push(section(OPTIONS_HEADING));

                let listed: Vec<String> = options
                    .iter()
                    .enumerate()
                    .map(|(i, opt)| {
                        let label = opt.display_label(i + 1);
                        match opt.description() {
                            Some(desc) => format!("{}. {} - {}", i + 1, label, desc),
                            None => format!("{}. {}", i + 1, label),
                        }
                    })
                    .collect();
                blocks.push(section(&listed.join("\n")));

                let buttons: Vec<Value> = options
                    .iter()
                    .take(MAX_QUICK_SELECT)
                    .enumerate()
                    .map(|(i, opt)| {
                        let label = opt.display_label(i + 1);
                        json!({
                            "type": "button",
                            "text": {
                                "type": "plain_text",
                                "text": truncate(&label, BUTTON_LABEL_MAX),
                                "emoji": true
                            },
                            "value": label,
                            "action_id": format!("option_{}", i)
                        })
                    })
                    .collect();
                blocks.push(json!({ "type": "actions", "elements": buttons }));
            }
        }

        if let Some(preview) = raw_preview(notification) {
            blocks.push(json!({
                "type": "context",
                "elements": [{ "type": "mrkdwn", "text": format!("```{}```", preview) }]
            }));
        }

        blocks.push(json!({ "type": "divider" }));
        blocks.push(json!({
            "type": "context",
            "elements": [{ "type": "mrkdwn", "text": FOOTER_HINT }]
        }));

        RenderedMessage {
            text: fallback_text(notification),
            blocks,
        }
    }
}

/// One-line fallback for notification banners.
fn fallback_text(notification: &Notification) -> String {
    notification
        .title
        .clone()
        .or_else(|| notification.message.clone())
        .unwrap_or_else(|| "Agent is waiting for input".to_string())
}

/// Pretty-printed raw payload, truncated; `None` when too short to matter.
fn raw_preview(notification: &Notification) -> Option<String> {
    let dump = serde_json::to_string_pretty(&notification.raw).ok()?;
    if dump.len() <= RAW_PREVIEW_MIN {
        return None;
    }
    if dump.chars().count() > RAW_PREVIEW_MAX {
        Some(format!("{}...", truncate(&dump, RAW_PREVIEW_MAX)))
    } else {
        Some(dump)
    }
}

fn section(text: &str) -> Value {
    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": text }
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::payload::normalize;
    use serde_json::json;

    fn block_texts(rendered: &RenderedMessage) -> String {
        serde_json::to_string(&rendered.blocks).unwrap()
    }

    #[test]
    fn test_render_options_list_and_buttons() {
        let n = normalize(r#"{"message":"Pick one","options":["Yes","No"]}"#);
        let rendered = MessageFormatter::new().render(&n);

        let dump = block_texts(&rendered);
        assert!(dump.contains("Pick one"));
        assert!(dump.contains("1. Yes"));
        assert!(dump.contains("2. No"));

        let actions = rendered.blocks.iter().find(|b| b["type"] == "actions").unwrap();
        let buttons = actions["elements"].as_array().unwrap();
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[0]["action_id"], json!("option_0"));
        assert_eq!(buttons[1]["action_id"], json!("option_1"));
    }

    #[test]
    fn test_quick_select_capped_but_all_options_listed() {
        let n = normalize(r#"{"options":["a","b","c","d","e","f","g"]}"#);
        let rendered = MessageFormatter::new().render(&n);

        let actions = rendered.blocks.iter().find(|b| b["type"] == "actions").unwrap();
        assert_eq!(actions["elements"].as_array().unwrap().len(), MAX_QUICK_SELECT);

        // option 7 is still in the enumerated list
        assert!(block_texts(&rendered).contains("7. g"));
    }

    #[test]
    fn test_button_labels_are_truncated() {
        let long = "x".repeat(200);
        let n = normalize(&format!(r#"{{"options":["{}"]}}"#, long));
        let rendered = MessageFormatter::new().render(&n);

        let actions = rendered.blocks.iter().find(|b| b["type"] == "actions").unwrap();
        let text = actions["elements"][0]["text"]["text"].as_str().unwrap();
        assert_eq!(text.chars().count(), BUTTON_LABEL_MAX);
        // the injected value keeps the full label
        assert_eq!(
            actions["elements"][0]["value"].as_str().unwrap().len(),
            200
        );
    }

    #[test]
    fn test_unrecognized_payload_still_renders_raw_dump() {
        let raw = format!(r#"{{"mystery":"{}"}}"#, "y".repeat(150));
        let n = normalize(&raw);
        let rendered = MessageFormatter::new().render(&n);

        assert!(block_texts(&rendered).contains("mystery"));
        assert_eq!(rendered.text, "Agent is waiting for input");
    }

    #[test]
    fn test_raw_dump_is_bounded() {
        let raw = format!(r#"{{"filler":"{}"}}"#, "z".repeat(2000));
        let n = normalize(&raw);
        let rendered = MessageFormatter::new().render(&n);

        let context = rendered
            .blocks
            .iter()
            .find(|b| b["type"] == "context" && b["elements"][0]["text"].as_str().unwrap().starts_with("```"))
            .unwrap();
        let text = context["elements"][0]["text"].as_str().unwrap();
        // fenced preview plus ellipsis, never the full 2000 chars
        assert!(text.chars().count() <= RAW_PREVIEW_MAX + 10);
        assert!(text.ends_with("...```"));
    }

    #[test]
    fn test_short_raw_payload_omits_debug_section() {
        let n = normalize(r#"{"message":"hi"}"#);
        let rendered = MessageFormatter::new().render(&n);
        assert!(!block_texts(&rendered).contains("```"));
    }

    #[test]
    fn test_title_used_as_fallback_text() {
        let n = normalize(r#"{"title":"Build finished","message":"deploy?"}"#);
        let rendered = MessageFormatter::new().render(&n);
        assert_eq!(rendered.text, "Build finished");
        assert!(block_texts(&rendered).contains("*Build finished*"));
    }
}
