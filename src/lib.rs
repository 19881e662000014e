//! DocuChat - Conversational document QA
//!
//! A retrieval-augmented chat service over user-uploaded documents:
//! queries are classified, answered strictly from retrieved per-thread
//! context, and refused outright when nothing relevant exists. Each
//! conversation thread has isolated documents, durable checkpoints and a
//! registry entry.
//!
//! # Architecture
//!
//! - `types` / `state`: documents, messages, the reducer and turn state
//! - `config`: per-request resolution plus process-level settings
//! - `llm` / `retrieval`: generation and vector-store capabilities
//! - `agent`: the classify/retrieve/generate orchestrator
//! - `checkpoint` / `conversations`: persistence and thread lifecycle
//! - `ingestion`: document loading, tagging and indexing

pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod conversations;
pub mod errors;
pub mod ingestion;
pub mod llm;
pub mod retrieval;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use agent::Orchestrator;
pub use errors::{ChatError, Result};
pub use state::TurnState;
pub use types::Document;
