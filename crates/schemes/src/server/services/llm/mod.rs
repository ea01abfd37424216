//! LLM client with interchangeable local and hosted backends
//!
//! The backend is chosen once from configuration. Every call makes exactly
//! one HTTP attempt; failures come back as [`LlmError`] values and are never
//! retried here.

mod ollama;
mod openai;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

use crate::config::{AssistantConfig, LlmBackendKind};
use crate::errors::{ConfigError, LlmError};

pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;

/// A text-completion service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmBackend: Send + Sync {
  /// Human-readable backend name used in error replies
  fn name(&self) -> &'static str;

  /// Send one prompt and return the generated text
  async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// The configured backend behind a single `send` entry point
pub struct LlmClient {
  backend: Box<dyn LlmBackend>,
}

impl LlmClient {
  pub fn new(backend: Box<dyn LlmBackend>) -> Self {
    Self { backend }
  }

  /// Build the backend selected in `config`
  pub fn from_config(config: &AssistantConfig) -> Result<Self, ConfigError> {
    let client = http_client(config.llm.timeout_secs)?;
    let backend: Box<dyn LlmBackend> = match config.llm.backend {
      LlmBackendKind::Local => {
        Box::new(OllamaBackend::new(client, &config.llm.local.url, &config.llm.local.model))
      }
      LlmBackendKind::Hosted => {
        let api_key = config.hosted_api_key().ok_or(ConfigError::MissingCredential)?;
        Box::new(OpenAiBackend::new(client, &config.llm.hosted, api_key))
      }
    };
    Ok(Self::new(backend))
  }

  pub fn backend_name(&self) -> &'static str {
    self.backend.name()
  }

  pub async fn send(&self, prompt: &str) -> Result<String, LlmError> {
    self.backend.complete(prompt).await
  }
}

fn http_client(timeout_secs: Option<u64>) -> Result<Client, ConfigError> {
  let mut builder = Client::builder();
  if let Some(secs) = timeout_secs {
    builder = builder.timeout(Duration::from_secs(secs));
  }
  builder.build().map_err(|e| ConfigError::InvalidValue {
    key: "llm".to_string(),
    message: format!("cannot build HTTP client: {e}"),
  })
}

/// Send a prepared request and decode a JSON body from a 2xx response
async fn send_json(backend: &'static str, request: RequestBuilder) -> Result<Value, LlmError> {
  let response =
    request.send().await.map_err(|e| LlmError::Transport { backend, message: e.to_string() })?;

  let status = response.status();
  if !status.is_success() {
    let body = response.text().await.unwrap_or_default();
    return Err(LlmError::Status { backend, status: status.as_u16(), body });
  }

  response.json().await.map_err(|e| LlmError::MalformedResponse { backend, message: e.to_string() })
}
