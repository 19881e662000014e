//! In-process vector store
//!
//! Keyword-overlap scoring over an in-memory document list. Used by the
//! test suite and by offline runs; it honors the same filter semantics as
//! the qdrant provider, including shared-sentinel visibility.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::errors::Result;
use crate::retrieval::VectorStore;
use crate::types::document::{Document, SHARED_THREAD_ID, THREAD_ID_KEY};

/// In-memory store with keyword-overlap relevance
#[derive(Default)]
pub struct MemoryVectorStore {
    documents: RwLock<Vec<Document>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Drop all stored documents
    pub fn clear(&self) {
        self.documents.write().clear();
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// A document matches the filter when every entry matches its metadata.
/// The thread_id key has widened semantics: a document tagged with the
/// shared sentinel matches any requested thread.
fn matches_filter(doc: &Document, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(key, expected)| {
        let actual = doc.metadata.get(key);
        if key == THREAD_ID_KEY {
            let tag = actual.and_then(Value::as_str);
            return tag == expected.as_str() || tag == Some(SHARED_THREAD_ID);
        }
        actual == Some(expected)
    })
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn query(
        &self,
        text: &str,
        k: usize,
        filter: &Map<String, Value>,
    ) -> Result<Vec<Document>> {
        let query_tokens = tokenize(text);

        let mut scored: Vec<(usize, Document)> = self
            .documents
            .read()
            .iter()
            .filter(|doc| matches_filter(doc, filter))
            .filter_map(|doc| {
                let overlap = tokenize(&doc.content)
                    .intersection(&query_tokens)
                    .count();
                (overlap > 0).then(|| (overlap, doc.clone()))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored.into_iter().take(k).map(|(_, doc)| doc).collect())
    }

    async fn add_documents(&self, documents: &[Document]) -> Result<()> {
        self.documents.write().extend_from_slice(documents);
        Ok(())
    }
}
