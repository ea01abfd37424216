//! Chat orchestration: retrieve, compose, complete
//!
//! Each turn is independent. Nothing from earlier turns is kept.

use std::fmt;
use std::sync::Arc;

use crate::config::AssistantConfig;
use crate::errors::{ChatError, LlmError, SetupError};
use crate::server::services::llm::LlmClient;
use crate::server::services::prompt;
use crate::server::services::scheme_store::{SchemeStore, DEFAULT_RESULTS};

/// Marker that starts every reply rendered from a backend failure
pub const REPLY_ERROR_PREFIX: &str = "Error connecting to";

/// Result of one chat turn
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
  /// Text generated by the LLM
  Answer(String),
  /// The LLM backend could not produce an answer
  BackendFailure(LlmError),
}

impl Reply {
  /// Displayable reply text; failures render with [`REPLY_ERROR_PREFIX`]
  pub fn text(&self) -> String {
    match self {
      Reply::Answer(text) => text.clone(),
      Reply::BackendFailure(error) => format!("{REPLY_ERROR_PREFIX} {}: {error}", error.backend()),
    }
  }

  pub fn is_failure(&self) -> bool {
    matches!(self, Reply::BackendFailure(_))
  }
}

impl fmt::Display for Reply {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.text())
  }
}

/// Optional behaviours of [`SchemeAssistant`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssistantOptions {
  /// Schemes retrieved per turn
  pub results: usize,
  /// Answer with no context when the store fails instead of erroring
  pub empty_context_on_store_failure: bool,
}

impl Default for AssistantOptions {
  fn default() -> Self {
    Self { results: DEFAULT_RESULTS, empty_context_on_store_failure: false }
  }
}

pub struct SchemeAssistant {
  store: Arc<SchemeStore>,
  llm: LlmClient,
  options: AssistantOptions,
}

impl SchemeAssistant {
  pub fn new(store: Arc<SchemeStore>, llm: LlmClient, options: AssistantOptions) -> Self {
    Self { store, llm, options }
  }

  /// Wire store, embedder and LLM backend from a validated configuration
  pub async fn from_config(config: &AssistantConfig) -> Result<Self, SetupError> {
    let llm = LlmClient::from_config(config)?;
    let store = Arc::new(SchemeStore::from_config(config).await?);
    let options = AssistantOptions {
      results: config.chat.results,
      empty_context_on_store_failure: config.chat.empty_context_on_store_failure,
    };
    Ok(Self::new(store, llm, options))
  }

  pub fn store(&self) -> &Arc<SchemeStore> {
    &self.store
  }

  pub fn backend_name(&self) -> &'static str {
    self.llm.backend_name()
  }

  /// Answer one user message
  pub async fn respond(&self, message: &str) -> Result<Reply, ChatError> {
    if message.trim().is_empty() {
      return Err(ChatError::EmptyMessage);
    }

    let records = match self.store.search(message, self.options.results).await {
      Ok(records) => records,
      Err(e) if self.options.empty_context_on_store_failure => {
        bentley::warn!("Scheme store unavailable, answering without context: {e}");
        Vec::new()
      }
      Err(e) => return Err(e.into()),
    };
    bentley::verbose!("Retrieved {} schemes for context", records.len());

    let prompt = prompt::build(message, &records);
    match self.llm.send(&prompt).await {
      Ok(text) => Ok(Reply::Answer(text)),
      Err(e) => {
        bentley::warn!("{} request failed: {e}", e.backend());
        Ok(Reply::BackendFailure(e))
      }
    }
  }
}
