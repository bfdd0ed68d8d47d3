//! Dedup fingerprint - stable digest of a notification's question identity
//!
//! Only `message`, `options` and `question_data` participate: title, body
//! and the raw payload may vary stylistically without representing a new
//! question. Equal field sets always hash to the same key; the hash is not
//! cryptographic, collisions merely cause a skipped notification.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::payload::Notification;

/// Compute the duplicate-suppression fingerprint for a notification.
///
/// The selected fields are serialized to canonical JSON and hashed with
/// the std 64-bit hasher, formatted as 16 hex chars.
pub fn fingerprint(notification: &Notification) -> String {
    let canonical = serde_json::json!({
        "message": notification.message,
        "options": notification.options,
        "question_data": notification.question_data,
    });
    let mut hasher = DefaultHasher::new();
    canonical.to_string().hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::payload::normalize;

    #[test]
    fn test_same_question_same_fingerprint() {
        let a = normalize(r#"{"message":"Pick one","options":["Yes","No"]}"#);
        let b = normalize(r#"{"message":"Pick one","options":["Yes","No"]}"#);
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_different_message_different_fingerprint() {
        let a = normalize(r#"{"message":"Pick one"}"#);
        let b = normalize(r#"{"message":"Pick two"}"#);
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_different_options_different_fingerprint() {
        let a = normalize(r#"{"message":"m","options":["Yes","No"]}"#);
        let b = normalize(r#"{"message":"m","options":["Yes","No","Maybe"]}"#);
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_title_and_body_do_not_affect_fingerprint() {
        let a = normalize(r#"{"title":"T1","body":"B1","message":"m"}"#);
        let b = normalize(r#"{"title":"T2","body":"B2","message":"m"}"#);
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_extra_raw_fields_do_not_affect_fingerprint() {
        let a = normalize(r#"{"message":"m","session_id":"abc"}"#);
        let b = normalize(r#"{"message":"m","session_id":"def"}"#);
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_question_data_affects_fingerprint() {
        let a = normalize(r#"{"message":"m","question_data":{"id":1}}"#);
        let b = normalize(r#"{"message":"m","question_data":{"id":2}}"#);
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_format() {
        let n = normalize("plain text question");
        let key = fingerprint(&n);
        assert_eq!(key.len(), 16);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
