//! Per-request configuration resolution
//!
//! Callers pass a JSON `configurable` map alongside each request. The
//! resolvers here apply defaults and accept both camelCase (frontend
//! JSON) and snake_case field names.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::Result;

/// Default number of documents to retrieve
pub const DEFAULT_K: usize = 5;

/// Default query model (format: provider/model-name)
pub const DEFAULT_QUERY_MODEL: &str = "ollama/qwen2.5:7b-instruct";

/// Default path to the sample documents fallback file
pub const DEFAULT_DOCS_FILE: &str = "./sample_docs.json";

/// The raw per-request configuration map.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    configurable: Map<String, Value>,
}

impl RequestConfig {
    pub fn new(configurable: Map<String, Value>) -> Self {
        Self { configurable }
    }

    /// Builder-style entry insertion
    pub fn with_value(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.configurable.insert(key.to_string(), value.into());
        self
    }

    /// Attach the conversation scope for retrieval isolation
    pub fn with_thread_id(self, thread_id: &str) -> Self {
        self.with_value("thread_id", thread_id)
    }

    /// The isolation scope, if present and non-empty.
    ///
    /// An empty string must not silently disable isolation, and must not
    /// inject a bogus filter either, so it resolves the same as absent.
    pub fn thread_id(&self) -> Option<&str> {
        self.configurable
            .get("thread_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Whether ingestion should tag documents as shared. Strict boolean
    /// check: anything but JSON `true` means private.
    pub fn is_shared(&self) -> bool {
        self.configurable.get("is_shared").or_else(|| self.configurable.get("isShared"))
            == Some(&Value::Bool(true))
    }

    /// Resolve base retrieval settings with defaults
    pub fn base(&self) -> Result<BaseConfig> {
        let config = BaseConfig::deserialize(Value::Object(self.configurable.clone()))?;
        Ok(config)
    }

    /// Resolve agent settings (base + query model)
    pub fn agent(&self) -> Result<AgentConfig> {
        let config = AgentConfig::deserialize(Value::Object(self.configurable.clone()))?;
        Ok(config)
    }

    /// Resolve ingestion settings (base + sample-docs fallback)
    pub fn index(&self) -> Result<IndexConfig> {
        let config = IndexConfig::deserialize(Value::Object(self.configurable.clone()))?;
        Ok(config)
    }
}

fn default_provider() -> String {
    "qdrant".to_string()
}

fn default_k() -> usize {
    DEFAULT_K
}

fn default_query_model() -> String {
    DEFAULT_QUERY_MODEL.to_string()
}

fn default_docs_file() -> String {
    DEFAULT_DOCS_FILE.to_string()
}

/// Base configuration for retrieval operations.
#[derive(Debug, Clone, Deserialize)]
pub struct BaseConfig {
    /// The vector store provider to use ("qdrant" or "memory")
    #[serde(default = "default_provider", alias = "retrieverProvider")]
    pub retriever_provider: String,

    /// Metadata key/value filter applied to every query
    #[serde(default, alias = "filterKwargs")]
    pub filter_kwargs: Map<String, Value>,

    /// Number of documents to retrieve
    #[serde(default = "default_k")]
    pub k: usize,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            retriever_provider: default_provider(),
            filter_kwargs: Map::new(),
            k: DEFAULT_K,
        }
    }
}

/// Configuration for the retrieval/agent graph.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(flatten)]
    pub base: BaseConfig,

    /// The language model used for classification and generation,
    /// in the form provider/model-name
    #[serde(default = "default_query_model", alias = "queryModel")]
    pub query_model: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            query_model: default_query_model(),
        }
    }
}

/// Configuration for the ingestion pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    #[serde(flatten)]
    pub base: BaseConfig,

    /// Path to a JSON file containing fallback documents to index
    #[serde(default = "default_docs_file", alias = "docsFile")]
    pub docs_file: String,

    /// Whether to fall back to the sample file when no docs are provided
    #[serde(default, alias = "useSampleDocs")]
    pub use_sample_docs: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            docs_file: default_docs_file(),
            use_sample_docs: false,
        }
    }
}
