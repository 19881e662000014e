//! Retrieval: vector store capability, retriever factory and isolation
//!
//! The factory resolves per-request retrieval settings, merges the
//! conversation scope into the filter map (the sole isolation mechanism
//! between conversations' document sets) and binds a query interface to
//! the selected provider.

pub mod embedding;
pub mod memory;
pub mod qdrant;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::config::{RequestConfig, Settings};
use crate::errors::{ChatError, Result};
use crate::types::Document;

pub use embedding::EmbeddingClient;
pub use memory::MemoryVectorStore;
pub use qdrant::QdrantStore;

/// Vector-store capability consumed by retrieval and ingestion.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Query for the k most relevant documents matching the filter
    async fn query(
        &self,
        text: &str,
        k: usize,
        filter: &Map<String, Value>,
    ) -> Result<Vec<Document>>;

    /// Write documents to the store
    async fn add_documents(&self, documents: &[Document]) -> Result<()>;
}

/// A query interface bound to a provider, a top-k count and a filter map.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    k: usize,
    filter: Map<String, Value>,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("k", &self.k)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl Retriever {
    pub fn new(store: Arc<dyn VectorStore>, k: usize, filter: Map<String, Value>) -> Self {
        Self { store, k, filter }
    }

    /// Fetch documents relevant to the query, scoped by the bound filter
    pub async fn query(&self, text: &str) -> Result<Vec<Document>> {
        self.store.query(text, self.k, &self.filter).await
    }

    /// The underlying store, for ingestion writes
    pub fn store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }

    /// The bound filter map
    pub fn filter(&self) -> &Map<String, Value> {
        &self.filter
    }
}

/// Builds retrievers bound to a conversation's isolation scope.
///
/// Expensive provider resources (qdrant client, embedding client) are
/// constructed lazily on first use and cached for the life of the
/// factory; the factory itself is shared process-wide via `Arc`.
pub struct RetrieverFactory {
    settings: Settings,
    qdrant: OnceCell<Arc<QdrantStore>>,
    memory: Arc<MemoryVectorStore>,
}

impl RetrieverFactory {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            qdrant: OnceCell::new(),
            memory: Arc::new(MemoryVectorStore::new()),
        }
    }

    /// Build a retriever for the request's provider, top-k and filter,
    /// with the thread scope merged in when present and non-empty.
    pub async fn make_retriever(&self, config: &RequestConfig) -> Result<Retriever> {
        let base = config.base()?;

        let mut filter = base.filter_kwargs.clone();
        // Empty or absent thread_id must neither disable isolation
        // silently nor inject a filter that matches nothing; the
        // RequestConfig accessor already collapses both to None.
        if let Some(thread_id) = config.thread_id() {
            filter.insert("thread_id".to_string(), Value::String(thread_id.to_string()));
        }

        debug!(
            provider = %base.retriever_provider,
            k = base.k,
            "building retriever"
        );

        let store = self.store_for(&base.retriever_provider).await?;
        Ok(Retriever::new(store, base.k, filter))
    }

    /// Resolve the store for a provider id
    pub async fn store_for(&self, provider: &str) -> Result<Arc<dyn VectorStore>> {
        match provider {
            "qdrant" => {
                let store = self
                    .qdrant
                    .get_or_try_init(|| async {
                        QdrantStore::from_env(&self.settings).await.map(Arc::new)
                    })
                    .await?;
                Ok(store.clone() as Arc<dyn VectorStore>)
            }
            "memory" => Ok(self.memory.clone() as Arc<dyn VectorStore>),
            other => Err(ChatError::Configuration(format!(
                "Unsupported retriever provider: {}",
                other
            ))),
        }
    }
}
