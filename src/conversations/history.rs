//! Best-effort conversation history
//!
//! History reads are a display concern, so a checkpoint store failure
//! degrades to an empty transcript instead of failing the request. This
//! leniency applies ONLY here; chat turns still propagate their errors.

use tracing::warn;

use crate::checkpoint::CheckpointHandle;
use crate::types::ChatMessage;

/// Load the message history for a thread from its latest checkpoint.
///
/// Returns an empty list when the thread has no checkpoints or when the
/// store cannot be read.
pub async fn load_history(checkpointer: &CheckpointHandle, thread_id: &str) -> Vec<ChatMessage> {
    let db = match checkpointer.get().await {
        Ok(db) => db,
        Err(err) => {
            warn!(thread_id, error = %err, "checkpoint store unavailable; returning empty history");
            return Vec::new();
        }
    };

    match db.latest(thread_id) {
        Ok(Some(checkpoint)) => checkpoint.state.messages,
        Ok(None) => Vec::new(),
        Err(err) => {
            warn!(thread_id, error = %err, "checkpoint read failed; returning empty history");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CheckpointLocation;
    use crate::state::TurnState;
    use serde_json::Map;

    #[tokio::test]
    async fn test_history_of_unknown_thread_is_empty() {
        let handle = CheckpointHandle::new(CheckpointLocation::InMemory);
        assert!(load_history(&handle, "nobody").await.is_empty());
    }

    #[tokio::test]
    async fn test_history_reads_latest_checkpoint() {
        let handle = CheckpointHandle::new(CheckpointLocation::InMemory);
        let db = handle.get().await.unwrap();

        let state = TurnState {
            messages: vec![ChatMessage::user("q"), ChatMessage::assistant("a")],
            ..Default::default()
        };
        db.put("t-1", &state, &Map::new()).unwrap();

        let history = load_history(&handle, "t-1").await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "a");
    }
}
