//! The retrieval/generation state machine
//!
//! One `run` processes exactly one query: classification sets the route,
//! the retrieve path fetches thread-scoped documents and generates a
//! grounded answer (or the fixed refusal), the direct path handles
//! pleasantries. Exactly two messages (user + assistant) are appended
//! per turn. Upstream failures propagate; the checkpoint is written only
//! after the turn completed successfully.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::agent::format::format_docs;
use crate::agent::prompts::{greeting_prompt, response_prompt, NO_DOCUMENTS_REFUSAL};
use crate::checkpoint::CheckpointHandle;
use crate::config::RequestConfig;
use crate::errors::{ChatError, Result};
use crate::llm::ModelProvider;
use crate::retrieval::RetrieverFactory;
use crate::state::{reduce_docs, DocumentUpdate, Route, TurnState};
use crate::types::ChatMessage;

/// Routing decision step: total over the route enum, hard error for a
/// corrupted or unset route. Unreachable in practice because the
/// classifier's output is constrained.
pub fn route_query(state: &TurnState) -> Result<Route> {
    state.route()
}

/// The RAG orchestrator.
///
/// Dependencies are injected: a model factory, the retriever factory and
/// an optional checkpoint handle. Without a checkpointer the orchestrator
/// runs in non-persistent mode and every turn starts from empty state.
pub struct Orchestrator {
    models: Arc<dyn ModelProvider>,
    retrievers: Arc<RetrieverFactory>,
    checkpointer: Option<CheckpointHandle>,
}

impl Orchestrator {
    pub fn new(models: Arc<dyn ModelProvider>, retrievers: Arc<RetrieverFactory>) -> Self {
        Self {
            models,
            retrievers,
            checkpointer: None,
        }
    }

    /// Attach a checkpoint handle for durable per-thread state
    pub fn with_checkpointer(mut self, checkpointer: CheckpointHandle) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    /// Process one query for the thread carried in the request config.
    ///
    /// Loads the latest checkpoint (when persistence is attached),
    /// executes one pass through the state machine and persists the new
    /// state. Returns the full turn state; the answer is its last
    /// assistant message.
    pub async fn run(&self, query: &str, config: &RequestConfig) -> Result<TurnState> {
        let mut state = self.load_state(config).await?;
        state.begin_turn(query);

        // Classify
        let agent_config = config.agent()?;
        let model = self.models.load(&agent_config.query_model)?;
        let route = model.classify_route(query).await?;
        state.route = Some(route);
        debug!(route = route.as_str(), "query classified");

        // Branch
        match route_query(&state)? {
            Route::Retrieve => {
                self.retrieve_documents(&mut state, config).await?;
                self.generate_response(&mut state, config).await?;
            }
            Route::Direct => {
                self.answer_directly(&mut state, config).await?;
            }
        }

        self.persist(&state, config).await?;
        Ok(state)
    }

    async fn load_state(&self, config: &RequestConfig) -> Result<TurnState> {
        let (checkpointer, thread_id) = match (&self.checkpointer, config.thread_id()) {
            (Some(cp), Some(tid)) => (cp, tid),
            _ => return Ok(TurnState::default()),
        };

        let db = checkpointer.get().await?;
        Ok(db
            .latest(thread_id)?
            .map(|checkpoint| checkpoint.state)
            .unwrap_or_default())
    }

    /// Fetch documents scoped to the current thread. Zero hits arm the
    /// refusal gate instead of letting generation run on empty context.
    async fn retrieve_documents(&self, state: &mut TurnState, config: &RequestConfig) -> Result<()> {
        let retriever = self.retrievers.make_retriever(config).await?;
        let retrieved = retriever.query(&state.query).await?;

        if retrieved.is_empty() {
            info!("retrieval returned no documents; arming refusal gate");
            state.force_refusal = true;
            state.documents = reduce_docs(Some(&state.documents), DocumentUpdate::Delete);
            return Ok(());
        }

        state.force_refusal = false;
        state.documents = reduce_docs(Some(&state.documents), DocumentUpdate::from(retrieved));
        Ok(())
    }

    /// Generate a grounded answer, or the fixed refusal when the gate is
    /// armed or no context exists. The model is never invoked with empty
    /// context.
    async fn generate_response(&self, state: &mut TurnState, config: &RequestConfig) -> Result<()> {
        let user_message = ChatMessage::user(state.query.clone());

        if state.force_refusal || state.documents.is_empty() {
            state.messages.push(user_message);
            state
                .messages
                .push(ChatMessage::assistant(NO_DOCUMENTS_REFUSAL));
            return Ok(());
        }

        let agent_config = config.agent()?;
        let model = self.models.load(&agent_config.query_model)?;

        let context = format_docs(&state.documents);
        let prompt = ChatMessage::user(response_prompt(&state.query, &context));

        // The formatted prompt rides with the history for this call but
        // is not persisted; history keeps only the user/assistant pair.
        let mut history = state.messages.clone();
        history.push(prompt);

        let response = model.invoke(&history).await?;

        state.messages.push(user_message);
        state.messages.push(response);
        Ok(())
    }

    /// Greeting-only direct path; anything that is actually a question
    /// gets redirected to the document flow by the prompt itself.
    async fn answer_directly(&self, state: &mut TurnState, config: &RequestConfig) -> Result<()> {
        let agent_config = config.agent()?;
        let model = self.models.load(&agent_config.query_model)?;

        let response = model.invoke(&greeting_prompt(&state.query)).await?;

        state.messages.push(ChatMessage::user(state.query.clone()));
        state.messages.push(response);
        Ok(())
    }

    async fn persist(&self, state: &TurnState, config: &RequestConfig) -> Result<()> {
        let (checkpointer, thread_id) = match (&self.checkpointer, config.thread_id()) {
            (Some(cp), Some(tid)) => (cp, tid),
            _ => return Ok(()),
        };

        let mut metadata = Map::new();
        if let Some(route) = state.route {
            metadata.insert(
                "route".to_string(),
                Value::String(route.as_str().to_string()),
            );
        }
        metadata.insert("force_refusal".to_string(), Value::Bool(state.force_refusal));

        let db = checkpointer.get().await?;
        let seq = db.put(thread_id, state, &metadata)?;
        debug!(thread_id, seq, "checkpoint written");
        Ok(())
    }
}

/// Guard against misuse from the delivery layer: a chat request must
/// carry a non-empty thread when persistence is expected.
pub fn require_thread_id(config: &RequestConfig) -> Result<&str> {
    config.thread_id().ok_or_else(|| {
        warn!("chat request without thread_id");
        ChatError::Validation("thread_id must be a non-empty string".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Route;

    #[test]
    fn test_route_query_requires_route() {
        let state = TurnState::default();
        assert!(matches!(
            route_query(&state),
            Err(ChatError::InvalidRoute(_))
        ));

        let state = TurnState {
            route: Some(Route::Direct),
            ..Default::default()
        };
        assert_eq!(route_query(&state).unwrap(), Route::Direct);
    }

    #[test]
    fn test_require_thread_id() {
        assert!(require_thread_id(&RequestConfig::default()).is_err());
        let config = RequestConfig::default().with_thread_id("t-1");
        assert_eq!(require_thread_id(&config).unwrap(), "t-1");
    }
}
