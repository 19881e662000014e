//! Configuration: per-request resolution and process-level settings
//!
//! Request-scoped settings (retrieval parameters, model identifier,
//! isolation scope) ride in a JSON `configurable` map supplied with each
//! request and resolve against defaults here. Process-level settings
//! (endpoints, database path) load once from a TOML file with environment
//! overrides.

pub mod request;
pub mod settings;

pub use request::{AgentConfig, BaseConfig, IndexConfig, RequestConfig};
pub use settings::Settings;
