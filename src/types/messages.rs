//! Chat message model and boundary normalization
//!
//! Checkpoints written by earlier versions and external producers carry
//! messages in several shapes: `{role, content}` maps, `{type, content}`
//! maps and bare strings. `normalize_message` maps every known shape into
//! the canonical record; unknown shapes fall back to a user message
//! carrying the raw value as string content.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message author role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Wire name for the role
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A single conversation turn entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

fn role_from_label(label: &str) -> Option<MessageRole> {
    match label {
        "system" => Some(MessageRole::System),
        "user" | "human" => Some(MessageRole::User),
        "assistant" | "ai" => Some(MessageRole::Assistant),
        _ => None,
    }
}

/// Normalize an arbitrary JSON message payload into a canonical record.
///
/// Accepted shapes, in order of precedence:
/// - `{"role": ..., "content": ...}` (also accepts "human"/"ai" labels)
/// - `{"type": ..., "content": ...}` (checkpoint export shape)
/// - a bare JSON string (treated as user content)
///
/// Anything else becomes a user message with the raw value stringified.
pub fn normalize_message(value: &Value) -> ChatMessage {
    match value {
        Value::String(s) => ChatMessage::user(s.clone()),
        Value::Object(map) => {
            let content = map
                .get("content")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string());

            let label = map
                .get("role")
                .or_else(|| map.get("type"))
                .and_then(Value::as_str);

            match label.and_then(role_from_label) {
                Some(role) => ChatMessage { role, content },
                None => ChatMessage::user(content),
            }
        }
        other => ChatMessage::user(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_role_content_map() {
        let msg = normalize_message(&json!({"role": "assistant", "content": "hi"}));
        assert_eq!(msg.role, MessageRole::Assistant);
        assert_eq!(msg.content, "hi");
    }

    #[test]
    fn test_normalize_type_content_map() {
        let msg = normalize_message(&json!({"type": "human", "content": "question"}));
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, "question");

        let msg = normalize_message(&json!({"type": "ai", "content": "answer"}));
        assert_eq!(msg.role, MessageRole::Assistant);
    }

    #[test]
    fn test_normalize_bare_string() {
        let msg = normalize_message(&json!("hello"));
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn test_normalize_unknown_shape_falls_back() {
        let msg = normalize_message(&json!({"weird": true}));
        assert_eq!(msg.role, MessageRole::User);
        assert!(msg.content.contains("weird"));

        let msg = normalize_message(&json!(7));
        assert_eq!(msg.content, "7");
    }

    #[test]
    fn test_message_serde_roundtrip() {
        let msg = ChatMessage::assistant("ok");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        let back: ChatMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, msg);
    }
}
