//! Error types for the schemes assistant
//!
//! Library code returns these typed errors; binaries and CLI commands wrap
//! them in `anyhow` at the edge.

use thiserror::Error;

/// Fatal configuration problems detected once at startup
#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("The hosted LLM backend requires an API key (set SCHEMES_API_KEY or llm.hosted.api_key)")]
  MissingCredential,

  #[error("Failed to read config file {path}: {message}")]
  Read { path: String, message: String },

  #[error("Failed to parse config file {path}: {message}")]
  Parse { path: String, message: String },

  #[error("Invalid value for {key}: {message}")]
  InvalidValue { key: String, message: String },
}

/// A malformed record or dataset rejected during ingestion
#[derive(Error, Debug, PartialEq)]
pub enum IngestionError {
  #[error("Dataset is not valid JSON: {message}")]
  Json { message: String },

  #[error("Dataset must be a JSON array of schemes")]
  NotAnArray,

  #[error("Scheme #{index} is not a JSON object")]
  NotAnObject { index: usize },

  #[error("Scheme #{index} ({}) is missing required field '{field}'", .id.as_deref().unwrap_or("no id"))]
  MissingField { index: usize, id: Option<String>, field: &'static str },

  #[error("Scheme #{index} ({}) has a non-text value for '{field}'", .id.as_deref().unwrap_or("no id"))]
  InvalidField { index: usize, id: Option<String>, field: &'static str },

  #[error("Scheme #{index} has a blank id")]
  BlankId { index: usize },

  #[error("Failed to read dataset {path}: {message}")]
  Read { path: String, message: String },
}

/// Failures of the embedding model
#[derive(Error, Debug)]
pub enum EmbeddingError {
  #[error("Embedding request failed: {0}")]
  Request(String),

  #[error("Embedding service returned an unusable response: {0}")]
  Response(String),

  #[error("Embedding model error: {0}")]
  Model(String),
}

/// Failures of the scheme store and its vector database
#[derive(Error, Debug)]
pub enum StoreError {
  #[error(transparent)]
  Ingestion(#[from] IngestionError),

  #[error("Scheme store unavailable: {message}")]
  Unavailable { message: String },

  #[error("Failed to embed text: {0}")]
  Embedding(#[from] EmbeddingError),

  #[error("Scheme store data is corrupt: {message}")]
  Corrupt { message: String },
}

impl StoreError {
  pub fn unavailable(message: impl std::fmt::Display) -> Self {
    StoreError::Unavailable { message: message.to_string() }
  }

  pub fn corrupt(message: impl std::fmt::Display) -> Self {
    StoreError::Corrupt { message: message.to_string() }
  }
}

/// Failures talking to an LLM backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
  #[error("{message}")]
  Transport { backend: &'static str, message: String },

  #[error("HTTP {status}: {body}")]
  Status { backend: &'static str, status: u16, body: String },

  #[error("malformed response: {message}")]
  MalformedResponse { backend: &'static str, message: String },
}

impl LlmError {
  /// Human-readable name of the backend that failed
  pub fn backend(&self) -> &'static str {
    match self {
      LlmError::Transport { backend, .. }
      | LlmError::Status { backend, .. }
      | LlmError::MalformedResponse { backend, .. } => *backend,
    }
  }

  /// Stable key for API error payloads
  pub fn kind(&self) -> &'static str {
    match self {
      LlmError::Transport { .. } => "transport",
      LlmError::Status { .. } => "status",
      LlmError::MalformedResponse { .. } => "malformed_response",
    }
  }
}

/// Failures of a chat turn that the assistant cannot turn into a reply
#[derive(Error, Debug)]
pub enum ChatError {
  #[error("Message cannot be empty")]
  EmptyMessage,

  #[error(transparent)]
  Store(#[from] StoreError),
}

/// Failures while wiring the assistant from configuration
#[derive(Error, Debug)]
pub enum SetupError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Store(#[from] StoreError),
}
