//! Document model with metadata-based identity and isolation scoping
//!
//! A document's `uuid` metadata entry uniquely identifies it within an
//! accumulation scope; `thread_id` scopes retrieval visibility. Documents
//! carrying the shared sentinel are visible to every conversation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel thread id marking a document as visible to all conversations.
pub const SHARED_THREAD_ID: &str = "__SHARED__";

/// Metadata key holding the document's unique id.
pub const UUID_KEY: &str = "uuid";

/// Metadata key holding the isolation scope.
pub const THREAD_ID_KEY: &str = "thread_id";

/// Metadata key holding the visibility label ("private" or "shared").
pub const VISIBILITY_KEY: &str = "visibility";

/// Document metadata: arbitrary string-keyed JSON values.
pub type Metadata = Map<String, Value>;

/// A retrievable unit of document content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Extracted text content
    #[serde(rename = "pageContent", alias = "page_content", alias = "content")]
    pub content: String,

    /// Arbitrary metadata; `uuid` and `thread_id` carry identity and scope
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    /// Create a document with empty metadata
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    /// Create a document with the given metadata
    pub fn with_metadata(content: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// The document's uuid, if one has been assigned
    pub fn uuid(&self) -> Option<&str> {
        self.metadata.get(UUID_KEY).and_then(Value::as_str)
    }

    /// The document's isolation scope, if tagged
    pub fn thread_id(&self) -> Option<&str> {
        self.metadata.get(THREAD_ID_KEY).and_then(Value::as_str)
    }

    /// Whether this document is visible to every conversation
    pub fn is_shared(&self) -> bool {
        self.thread_id() == Some(SHARED_THREAD_ID)
    }

    /// Set a metadata entry, replacing any previous value
    pub fn set_meta(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.insert(key.to_string(), value.into());
    }
}

/// Incoming document payloads accepted at the reducer boundary.
///
/// Producers send several shapes: raw strings, JSON maps (document-shaped
/// when they carry a `pageContent` key, generic objects otherwise) and
/// fully-formed documents. The reducer normalizes all of them.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentInput {
    /// Raw text, wrapped into a document with a fresh uuid
    Text(String),
    /// JSON object, classified on the `pageContent` marker
    Map(Map<String, Value>),
    /// Already a document; uuid is defaulted if missing
    Document(Document),
}

impl DocumentInput {
    /// Build an input from an arbitrary JSON value.
    ///
    /// Strings and objects map to their natural variants; any other value
    /// is carried as text so no payload is silently dropped.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => DocumentInput::Text(s),
            Value::Object(map) => DocumentInput::Map(map),
            other => DocumentInput::Text(other.to_string()),
        }
    }
}

impl From<&str> for DocumentInput {
    fn from(s: &str) -> Self {
        DocumentInput::Text(s.to_string())
    }
}

impl From<String> for DocumentInput {
    fn from(s: String) -> Self {
        DocumentInput::Text(s)
    }
}

impl From<Document> for DocumentInput {
    fn from(doc: Document) -> Self {
        DocumentInput::Document(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_metadata_accessors() {
        let mut doc = Document::new("page one");
        assert!(doc.uuid().is_none());
        assert!(!doc.is_shared());

        doc.set_meta(UUID_KEY, "id-1");
        doc.set_meta(THREAD_ID_KEY, SHARED_THREAD_ID);
        assert_eq!(doc.uuid(), Some("id-1"));
        assert!(doc.is_shared());
    }

    #[test]
    fn test_document_serde_accepts_page_content() {
        let doc: Document =
            serde_json::from_value(json!({"pageContent": "hello", "metadata": {"uuid": "u1"}}))
                .unwrap();
        assert_eq!(doc.content, "hello");
        assert_eq!(doc.uuid(), Some("u1"));
    }

    #[test]
    fn test_input_from_value() {
        assert_eq!(
            DocumentInput::from_value(json!("plain")),
            DocumentInput::Text("plain".to_string())
        );

        match DocumentInput::from_value(json!({"pageContent": "x"})) {
            DocumentInput::Map(map) => assert!(map.contains_key("pageContent")),
            other => panic!("expected map input, got {:?}", other),
        }

        // Non-string scalars are preserved as text
        assert_eq!(
            DocumentInput::from_value(json!(42)),
            DocumentInput::Text("42".to_string())
        );
    }
}
