//! Ingestion pipeline: validate, tag, normalize, store
//!
//! Incoming payloads (any shape the reducer accepts) are normalized
//! against an empty baseline, tagged with identity and visibility
//! metadata, and written to the request's vector store. An empty request
//! either falls back to the sample-docs file or is rejected.

pub mod loader;

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::config::RequestConfig;
use crate::errors::{ChatError, Result};
use crate::retrieval::RetrieverFactory;
use crate::state::{reduce_docs, DocumentUpdate};
use crate::types::document::{Document, THREAD_ID_KEY, VISIBILITY_KEY};
use crate::types::{DocumentInput, SHARED_THREAD_ID};

pub use loader::{load_path, load_sample_docs};

/// Result of one ingestion run
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    /// Number of documents written to the store
    pub indexed: usize,
    /// The visibility scope the batch was tagged with
    pub scope: String,
}

pub struct IngestionPipeline {
    retrievers: Arc<RetrieverFactory>,
}

impl IngestionPipeline {
    pub fn new(retrievers: Arc<RetrieverFactory>) -> Self {
        Self { retrievers }
    }

    /// Ingest a batch of document payloads under the request's scope.
    ///
    /// Empty input falls back to the sample-docs file when the request
    /// opts in, and is otherwise a validation error. Tagging: every
    /// document gets a `uuid` (normalization assigns one when missing),
    /// a `thread_id` scope and a `visibility` label. A batch with no
    /// thread and no shared flag is rejected rather than silently made
    /// visible everywhere.
    pub async fn ingest(
        &self,
        inputs: Vec<DocumentInput>,
        config: &RequestConfig,
    ) -> Result<IngestReport> {
        let index_config = config.index()?;

        let inputs = if inputs.is_empty() {
            if !index_config.use_sample_docs {
                return Err(ChatError::Validation(
                    "no documents provided for ingestion".to_string(),
                ));
            }
            let path = Path::new(&index_config.docs_file);
            info!(path = %path.display(), "falling back to sample documents");
            load_sample_docs(path)?
        } else {
            inputs
        };

        let scope = self.resolve_scope(config)?;

        // Normalize against an empty baseline: an ingestion batch never
        // deduplicates against previously stored state; resubmission
        // safety comes from stable uuids at the store level.
        let mut documents = reduce_docs(None, DocumentUpdate::Merge(inputs));
        for doc in &mut documents {
            tag_scope(doc, &scope);
        }

        let retriever = self.retrievers.make_retriever(config).await?;
        retriever.store().add_documents(&documents).await?;
        info!(indexed = documents.len(), scope = %scope, "ingestion complete");

        Ok(IngestReport {
            indexed: documents.len(),
            scope,
        })
    }

    fn resolve_scope(&self, config: &RequestConfig) -> Result<String> {
        if config.is_shared() {
            return Ok(SHARED_THREAD_ID.to_string());
        }
        config
            .thread_id()
            .map(str::to_string)
            .ok_or_else(|| {
                ChatError::Validation(
                    "ingestion requires a thread_id or the shared flag".to_string(),
                )
            })
    }
}

/// Tag a document with its isolation scope and visibility label.
/// Already-tagged documents are left alone so re-ingestion of shared
/// material under a private request does not narrow its visibility.
fn tag_scope(doc: &mut Document, scope: &str) {
    if doc.thread_id().is_none() {
        doc.set_meta(THREAD_ID_KEY, scope);
    }
    if !doc.metadata.contains_key(VISIBILITY_KEY) {
        let visibility = if doc.is_shared() { "shared" } else { "private" };
        doc.set_meta(VISIBILITY_KEY, Value::String(visibility.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn pipeline() -> (IngestionPipeline, Arc<RetrieverFactory>) {
        let factory = Arc::new(RetrieverFactory::new(Settings::default()));
        (IngestionPipeline::new(factory.clone()), factory)
    }

    fn memory_config() -> RequestConfig {
        RequestConfig::default().with_value("retriever_provider", "memory")
    }

    #[tokio::test]
    async fn test_empty_input_without_fallback_is_rejected() {
        let (pipeline, _) = pipeline();
        let config = memory_config().with_thread_id("t-1");

        let err = pipeline.ingest(Vec::new(), &config).await.unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[tokio::test]
    async fn test_no_scope_is_rejected() {
        let (pipeline, _) = pipeline();
        let err = pipeline
            .ingest(vec![DocumentInput::from("orphan")], &memory_config())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[tokio::test]
    async fn test_private_ingestion_tags_thread_scope() {
        let (pipeline, factory) = pipeline();
        let config = memory_config().with_thread_id("t-1");

        let report = pipeline
            .ingest(vec![DocumentInput::from("rust borrow checker notes")], &config)
            .await
            .unwrap();
        assert_eq!(report.indexed, 1);
        assert_eq!(report.scope, "t-1");

        // Visible to its own thread
        let own = factory.make_retriever(&config).await.unwrap();
        assert_eq!(own.query("borrow checker").await.unwrap().len(), 1);

        // Invisible to another thread
        let other_config = memory_config().with_thread_id("t-2");
        let other = factory.make_retriever(&other_config).await.unwrap();
        assert!(other.query("borrow checker").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shared_ingestion_is_visible_to_all_threads() {
        let (pipeline, factory) = pipeline();
        let config = memory_config().with_value("is_shared", true);

        let report = pipeline
            .ingest(vec![DocumentInput::from("company handbook")], &config)
            .await
            .unwrap();
        assert_eq!(report.scope, SHARED_THREAD_ID);

        let reader = factory
            .make_retriever(&memory_config().with_thread_id("any-thread"))
            .await
            .unwrap();
        assert_eq!(reader.query("handbook").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sample_docs_fallback() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::with_suffix(".json").unwrap();
        write!(file, r#"["sample one", "sample two"]"#).unwrap();

        let (pipeline, _) = pipeline();
        let config = memory_config()
            .with_thread_id("t-1")
            .with_value("use_sample_docs", true)
            .with_value("docs_file", file.path().to_str().unwrap());

        let report = pipeline.ingest(Vec::new(), &config).await.unwrap();
        assert_eq!(report.indexed, 2);
    }

    #[test]
    fn test_tag_scope_preserves_existing_tags() {
        let mut doc = Document::new("already shared");
        doc.set_meta(THREAD_ID_KEY, SHARED_THREAD_ID);
        tag_scope(&mut doc, "t-9");
        assert_eq!(doc.thread_id(), Some(SHARED_THREAD_ID));
        assert_eq!(
            doc.metadata.get(VISIBILITY_KEY).and_then(|v| v.as_str()),
            Some("shared")
        );
    }
}
