//! Conversation lifecycle: registry, soft deletion and history
//!
//! The registry owns thread ids (always server-generated) and activity
//! ordering; history is read from the checkpoint store and degrades to
//! empty on read failure. The two schemas are deliberately independent.

pub mod history;
pub mod models;
pub mod repository;

pub use history::load_history;
pub use models::Conversation;
pub use repository::ConversationDb;
