//! Qdrant vector store provider
//!
//! Stores document content and metadata as point payloads in a single
//! collection. Credentials come from the environment at construction
//! time; a missing endpoint is a configuration failure, not a runtime
//! retry case.

use async_trait::async_trait;
use qdrant_client::{
    client::QdrantClient,
    qdrant::{
        condition::ConditionOneOf, r#match::MatchValue, vectors_config::Config,
        with_payload_selector::SelectorOptions, Condition, CreateCollection, Distance,
        FieldCondition, Filter, Match, PointStruct, SearchPoints, Value as QdrantValue,
        VectorParams, VectorsConfig, WithPayloadSelector,
    },
};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::config::Settings;
use crate::errors::{ChatError, Result};
use crate::retrieval::embedding::{EmbeddingClient, EMBEDDING_DIM};
use crate::retrieval::VectorStore;
use crate::types::document::{Document, SHARED_THREAD_ID, THREAD_ID_KEY, UUID_KEY};

/// Payload key holding the document text
const CONTENT_KEY: &str = "content";

/// Qdrant-backed vector store
pub struct QdrantStore {
    client: QdrantClient,
    embeddings: EmbeddingClient,
    collection: String,
}

impl QdrantStore {
    /// Connect using QDRANT_URL from the environment and ensure the
    /// collection exists. Missing URL fails immediately.
    pub async fn from_env(settings: &Settings) -> Result<Self> {
        let url = std::env::var("QDRANT_URL").map_err(|_| {
            ChatError::Configuration(
                "QDRANT_URL environment variable is not defined".to_string(),
            )
        })?;

        Self::connect(&url, &settings.endpoints.chat_url, settings).await
    }

    /// Connect to a specific endpoint and ensure the collection exists
    pub async fn connect(url: &str, embeddings_url: &str, settings: &Settings) -> Result<Self> {
        let client = QdrantClient::from_url(url)
            .build()
            .map_err(|e| ChatError::Configuration(format!("Failed to create qdrant client: {}", e)))?;

        let embeddings =
            EmbeddingClient::new(embeddings_url, &settings.endpoints.embedding_model)?;

        let store = Self {
            client,
            embeddings,
            collection: settings.storage.collection.clone(),
        };

        store.ensure_collection().await?;
        Ok(store)
    }

    /// Create the collection if it does not exist. Idempotent.
    async fn ensure_collection(&self) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| ChatError::Upstream(format!("Failed to list collections: {}", e)))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            info!(collection = %self.collection, "creating qdrant collection");
            self.client
                .create_collection(&CreateCollection {
                    collection_name: self.collection.clone(),
                    vectors_config: Some(VectorsConfig {
                        config: Some(Config::Params(VectorParams {
                            size: EMBEDDING_DIM,
                            distance: Distance::Cosine.into(),
                            ..Default::default()
                        })),
                    }),
                    ..Default::default()
                })
                .await
                .map_err(|e| {
                    ChatError::Upstream(format!(
                        "Failed to create collection {}: {}",
                        self.collection, e
                    ))
                })?;
        }

        Ok(())
    }

    fn build_filter(filter: &Map<String, JsonValue>) -> Option<Filter> {
        if filter.is_empty() {
            return None;
        }

        let must: Vec<Condition> = filter
            .iter()
            .map(|(key, value)| {
                let text = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
                if key == THREAD_ID_KEY {
                    // Shared-sentinel visibility: match the requested
                    // thread OR the shared tag
                    Condition {
                        condition_one_of: Some(ConditionOneOf::Filter(Filter {
                            should: vec![
                                keyword_condition(THREAD_ID_KEY, &text),
                                keyword_condition(THREAD_ID_KEY, SHARED_THREAD_ID),
                            ],
                            ..Default::default()
                        })),
                    }
                } else {
                    keyword_condition(key, &text)
                }
            })
            .collect();

        Some(Filter {
            must,
            ..Default::default()
        })
    }
}

fn keyword_condition(key: &str, value: &str) -> Condition {
    Condition {
        condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
            key: key.to_string(),
            r#match: Some(Match {
                match_value: Some(MatchValue::Keyword(value.to_string())),
            }),
            ..Default::default()
        })),
    }
}

fn json_to_qdrant_value(json: &JsonValue) -> QdrantValue {
    match json {
        JsonValue::String(s) => QdrantValue::from(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                QdrantValue::from(i)
            } else if let Some(f) = n.as_f64() {
                QdrantValue::from(f)
            } else {
                QdrantValue::from(0)
            }
        }
        JsonValue::Bool(b) => QdrantValue::from(*b),
        other => QdrantValue::from(other.to_string()),
    }
}

fn qdrant_to_json_value(value: &QdrantValue) -> Option<JsonValue> {
    use qdrant_client::qdrant::value::Kind;
    value.kind.as_ref().and_then(|kind| match kind {
        Kind::StringValue(s) => Some(JsonValue::String(s.clone())),
        Kind::IntegerValue(i) => Some(JsonValue::Number((*i).into())),
        Kind::DoubleValue(f) => serde_json::Number::from_f64(*f).map(JsonValue::Number),
        Kind::BoolValue(b) => Some(JsonValue::Bool(*b)),
        _ => None,
    })
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn query(
        &self,
        text: &str,
        k: usize,
        filter: &Map<String, JsonValue>,
    ) -> Result<Vec<Document>> {
        let vector = self.embeddings.embed(text).await?;

        let search_result = self
            .client
            .search_points(&SearchPoints {
                collection_name: self.collection.clone(),
                vector,
                limit: k as u64,
                with_payload: Some(WithPayloadSelector {
                    selector_options: Some(SelectorOptions::Enable(true)),
                }),
                filter: Self::build_filter(filter),
                ..Default::default()
            })
            .await
            .map_err(|e| ChatError::Upstream(format!("Failed to search points: {}", e)))?;

        let documents = search_result
            .result
            .into_iter()
            .map(|point| {
                let payload = point.payload;
                let content = payload
                    .get(CONTENT_KEY)
                    .and_then(|v| match v.kind.as_ref() {
                        Some(qdrant_client::qdrant::value::Kind::StringValue(s)) => {
                            Some(s.clone())
                        }
                        _ => None,
                    })
                    .unwrap_or_default();

                let mut metadata = Map::new();
                for (key, value) in payload {
                    if key != CONTENT_KEY {
                        if let Some(json_val) = qdrant_to_json_value(&value) {
                            metadata.insert(key, json_val);
                        }
                    }
                }

                Document::with_metadata(content, metadata)
            })
            .collect();

        Ok(documents)
    }

    async fn add_documents(&self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = documents.iter().map(|d| d.content.as_str()).collect();
        let vectors = self.embeddings.embed_batch(&texts).await?;

        let points: Vec<PointStruct> = documents
            .iter()
            .zip(vectors)
            .map(|(doc, vector)| {
                let id = doc
                    .uuid()
                    .map(str::to_string)
                    .unwrap_or_else(|| Uuid::new_v4().to_string());

                let mut payload: HashMap<String, QdrantValue> = HashMap::new();
                for (key, value) in &doc.metadata {
                    payload.insert(key.clone(), json_to_qdrant_value(value));
                }
                payload.insert(UUID_KEY.to_string(), QdrantValue::from(id.clone()));
                payload.insert(
                    CONTENT_KEY.to_string(),
                    QdrantValue::from(doc.content.clone()),
                );

                PointStruct::new(id, vector, payload)
            })
            .collect();

        self.client
            .upsert_points_blocking(&self.collection, None, points, None)
            .await
            .map_err(|e| ChatError::Upstream(format!("Failed to upsert points: {}", e)))?;

        Ok(())
    }
}
