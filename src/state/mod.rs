//! Orchestration state: the document reducer and per-turn agent state

pub mod reducer;
pub mod turn;

pub use reducer::{reduce_docs, DocumentUpdate};
pub use turn::{Route, TurnState};
