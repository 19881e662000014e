//! RAG orchestrator: classify, retrieve, generate
//!
//! The state machine at the heart of the service:
//!
//! START → Classify → [Retrieve → Generate | Direct] → END
//!
//! Classification constrains the model to `retrieve`/`direct`; retrieval
//! with zero hits arms the refusal gate; generation is skipped entirely
//! when the gate is armed, so the model is never invoked with empty
//! context.

pub mod format;
pub mod orchestrator;
pub mod prompts;

pub use format::{format_doc, format_docs};
pub use orchestrator::Orchestrator;
pub use prompts::NO_DOCUMENTS_REFUSAL;
