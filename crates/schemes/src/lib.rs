//! Schemes - Government Scheme Assistant
//!
//! Retrieval-augmented question answering over a dataset of government
//! welfare schemes: a vector-indexed scheme store, a prompt composer, a
//! pluggable LLM client and the chat orchestrator that ties them together.

pub mod cli;
pub mod config;
pub mod errors;
pub mod scheme;
pub mod server;

pub use config::AssistantConfig;
pub use errors::{ChatError, ConfigError, IngestionError, LlmError, StoreError};
pub use scheme::SchemeRecord;
pub use server::services::assistant::{Reply, SchemeAssistant};
