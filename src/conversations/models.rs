//! Conversation records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation thread as stored and listed.
///
/// Both `id` and `thread_id` are always generated server-side; clients
/// never supply a thread id at creation time, which closes off thread
/// hijacking by id guessing. Deletion is a flag, never a row removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub thread_id: String,
    pub title: Option<String>,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl Conversation {
    /// Display title, falling back when no title was set
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => title,
            _ => "Untitled conversation",
        }
    }
}
