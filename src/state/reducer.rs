//! Document reducer for accumulated conversation state
//!
//! `reduce_docs` merges incoming documents into the accumulated list with
//! UUID-based deduplication and type normalization. It is deterministic
//! and side-effect free apart from fresh uuid generation for untagged
//! items, and it underlies both ingestion normalization and the
//! orchestrator's per-thread document channel.

use std::collections::HashSet;

use serde_json::Value;
use uuid::Uuid;

use crate::types::document::{Document, DocumentInput, UUID_KEY};

/// An update applied to the accumulated document list.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentUpdate {
    /// Clear all accumulated documents, regardless of existing state
    Delete,
    /// Keep the existing documents unchanged
    None,
    /// Wrap a single string into one document with a fresh uuid
    Text(String),
    /// Merge a batch of incoming items, deduplicated by uuid
    Merge(Vec<DocumentInput>),
}

impl From<Vec<Document>> for DocumentUpdate {
    fn from(docs: Vec<Document>) -> Self {
        DocumentUpdate::Merge(docs.into_iter().map(DocumentInput::Document).collect())
    }
}

impl From<Vec<DocumentInput>> for DocumentUpdate {
    fn from(inputs: Vec<DocumentInput>) -> Self {
        DocumentUpdate::Merge(inputs)
    }
}

/// Parse a JSON payload into an update. The literal string `"delete"` is
/// the clear signal; other strings wrap into a single document; arrays
/// merge element-wise; null keeps existing state.
pub fn update_from_value(value: Value) -> DocumentUpdate {
    match value {
        Value::Null => DocumentUpdate::None,
        Value::String(s) if s == "delete" => DocumentUpdate::Delete,
        Value::String(s) => DocumentUpdate::Text(s),
        Value::Array(items) => {
            DocumentUpdate::Merge(items.into_iter().map(DocumentInput::from_value).collect())
        }
        other => DocumentUpdate::Text(other.to_string()),
    }
}

/// Reduce the accumulated document list with an incoming update.
///
/// Semantics:
/// - `Delete` yields an empty list.
/// - `None` yields `existing` (or empty when absent).
/// - `Text` appends one document with a freshly generated uuid.
/// - `Merge` classifies each item: strings become documents with new
///   uuids; maps with a `pageContent` key become documents with that
///   content and merged metadata; maps without the marker become
///   documents with empty content and the whole map as metadata;
///   documents get a uuid defaulted if missing.
///
/// Deduplication is first-write-wins on uuid: an incoming item whose
/// resolved uuid is already present (in `existing` or earlier in the
/// batch) is dropped, never overwriting existing content. Order is
/// `existing` followed by accepted items in their original relative
/// order.
pub fn reduce_docs(existing: Option<&[Document]>, update: DocumentUpdate) -> Vec<Document> {
    if update == DocumentUpdate::Delete {
        return Vec::new();
    }

    let existing_list: Vec<Document> = existing.map(<[Document]>::to_vec).unwrap_or_default();

    let mut seen: HashSet<String> = existing_list
        .iter()
        .filter_map(|doc| doc.uuid().map(str::to_string))
        .collect();

    let incoming = match update {
        DocumentUpdate::None => return existing_list,
        DocumentUpdate::Text(text) => vec![DocumentInput::Text(text)],
        DocumentUpdate::Merge(items) => items,
        DocumentUpdate::Delete => unreachable!(),
    };

    let mut accepted: Vec<Document> = Vec::new();

    for item in incoming {
        match item {
            DocumentInput::Text(text) => {
                // Fresh uuid: raw strings are never deduplicated
                let id = Uuid::new_v4().to_string();
                let mut doc = Document::new(text);
                doc.set_meta(UUID_KEY, id.clone());
                seen.insert(id);
                accepted.push(doc);
            }
            DocumentInput::Map(map) => {
                let metadata = map
                    .get("metadata")
                    .and_then(Value::as_object)
                    .cloned()
                    .unwrap_or_default();

                let id = metadata
                    .get(UUID_KEY)
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| Uuid::new_v4().to_string());

                if seen.contains(&id) {
                    continue;
                }

                let mut doc = if let Some(content) = map.get("pageContent").and_then(Value::as_str)
                {
                    // Document-shaped map: marker key carries the content
                    Document::with_metadata(content, metadata)
                } else {
                    // Generic object: the whole map becomes metadata
                    Document::with_metadata("", map)
                };
                doc.set_meta(UUID_KEY, id.clone());
                seen.insert(id);
                accepted.push(doc);
            }
            DocumentInput::Document(mut doc) => {
                let id = match doc.uuid() {
                    Some(id) => id.to_string(),
                    None => {
                        let id = Uuid::new_v4().to_string();
                        doc.set_meta(UUID_KEY, id.clone());
                        id
                    }
                };

                if seen.contains(&id) {
                    continue;
                }
                seen.insert(id);
                accepted.push(doc);
            }
        }
    }

    let mut result = existing_list;
    result.extend(accepted);
    result
}
