//! Core data types shared across the service
//!
//! - Documents with metadata-based identity and visibility scoping
//! - Canonical chat messages with boundary normalization

pub mod document;
pub mod messages;

pub use document::{Document, DocumentInput, Metadata, SHARED_THREAD_ID};
pub use messages::{normalize_message, ChatMessage, MessageRole};
