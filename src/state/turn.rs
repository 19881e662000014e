//! Per-turn orchestration state
//!
//! `TurnState` is the unit the orchestrator operates on and the payload
//! persisted as a checkpoint after each successful turn. `Route` is the
//! classifier's constrained output; routing any other value through the
//! system is a hard error.

use serde::{Deserialize, Serialize};

use crate::errors::{ChatError, Result};
use crate::types::{ChatMessage, Document};

/// Routing decision made by the query classifier.
///
/// `Direct` is reserved for conversational pleasantries; every request
/// for facts or content resolves to `Retrieve`. On ambiguity the policy
/// is always prefer retrieve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    Retrieve,
    Direct,
}

impl Route {
    /// Wire name for the route
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Retrieve => "retrieve",
            Route::Direct => "direct",
        }
    }

    /// Parse a routing value; anything outside the enum is invalid
    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "retrieve" => Ok(Route::Retrieve),
            "direct" => Ok(Route::Direct),
            other => Err(ChatError::InvalidRoute(other.to_string())),
        }
    }
}

/// Accumulated state for one conversation thread.
///
/// Loaded from the latest checkpoint at the start of a turn and written
/// back only after the turn completes. `documents` accumulates through
/// the reducer across turns; `force_refusal` is the anti-hallucination
/// gate set by retrieval when nothing was found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurnState {
    /// Ordered conversation history (user/assistant pairs)
    #[serde(default)]
    pub messages: Vec<ChatMessage>,

    /// The query for the current turn
    #[serde(default)]
    pub query: String,

    /// Routing decision; must be set by classification before any
    /// downstream step reads it
    #[serde(default)]
    pub route: Option<Route>,

    /// Documents accumulated for this thread via the reducer
    #[serde(default)]
    pub documents: Vec<Document>,

    /// When true, generation is skipped and the fixed refusal is emitted
    #[serde(default)]
    pub force_refusal: bool,
}

impl TurnState {
    /// Start a turn for a new query, clearing per-turn flags but keeping
    /// the accumulated history and documents
    pub fn begin_turn(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.route = None;
        self.force_refusal = false;
    }

    /// The routing decision, or an error if classification has not run
    pub fn route(&self) -> Result<Route> {
        self.route
            .ok_or_else(|| ChatError::InvalidRoute("route is not set".to_string()))
    }

    /// The assistant's reply for the most recent turn, if any
    pub fn last_answer(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::types::MessageRole::Assistant)
            .map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_parse_totality() {
        assert_eq!(Route::parse("retrieve").unwrap(), Route::Retrieve);
        assert_eq!(Route::parse("direct").unwrap(), Route::Direct);
        assert!(matches!(
            Route::parse("summarize"),
            Err(ChatError::InvalidRoute(_))
        ));
        assert!(matches!(Route::parse(""), Err(ChatError::InvalidRoute(_))));
    }

    #[test]
    fn test_unset_route_is_an_error() {
        let state = TurnState::default();
        assert!(matches!(state.route(), Err(ChatError::InvalidRoute(_))));
    }

    #[test]
    fn test_begin_turn_resets_flags_only() {
        let mut state = TurnState {
            messages: vec![ChatMessage::user("q1"), ChatMessage::assistant("a1")],
            query: "q1".to_string(),
            route: Some(Route::Retrieve),
            documents: vec![Document::new("doc")],
            force_refusal: true,
        };

        state.begin_turn("q2");
        assert_eq!(state.query, "q2");
        assert!(state.route.is_none());
        assert!(!state.force_refusal);
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.documents.len(), 1);
    }

    #[test]
    fn test_last_answer() {
        let mut state = TurnState::default();
        assert!(state.last_answer().is_none());
        state.messages.push(ChatMessage::user("hi"));
        state.messages.push(ChatMessage::assistant("hello"));
        assert_eq!(state.last_answer(), Some("hello"));
    }

    #[test]
    fn test_state_serde_roundtrip() {
        let state = TurnState {
            messages: vec![ChatMessage::user("q")],
            query: "q".to_string(),
            route: Some(Route::Direct),
            documents: Vec::new(),
            force_refusal: false,
        };

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"direct\""));
        let back: TurnState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.route, Some(Route::Direct));
        assert_eq!(back.messages.len(), 1);
    }
}
