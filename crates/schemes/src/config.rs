//! Configuration for the schemes assistant
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! `SCHEMES_*` environment variables. The result is validated once before
//! any component is constructed.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::ConfigError;

/// Config files looked up in the working directory when none is given
pub const CONFIG_SEARCH_PATHS: [&str; 2] = ["schemes.yaml", ".schemes/config.yaml"];

/// Top-level configuration passed to every component constructor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssistantConfig {
  #[serde(default)]
  pub store: StoreConfig,
  #[serde(default)]
  pub embedding: EmbeddingConfig,
  #[serde(default)]
  pub llm: LlmConfig,
  #[serde(default)]
  pub chat: ChatConfig,
  #[serde(default)]
  pub server: ServerConfig,
}

/// Which vector database holds the indexed schemes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
  /// Single JSON file with a linear scan, for offline use and tests
  Json,
  #[default]
  Lancedb,
}

/// Which embedding model turns text into vectors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
  /// Lexical feature hashing; no model download, no semantic matching
  Hashing,
  Ollama,
  /// all-MiniLM-L6-v2 sentence embeddings
  #[default]
  Onnx,
}

/// Which LLM backend answers prompts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackendKind {
  #[default]
  Local,
  Hosted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
  #[serde(default)]
  pub backend: StoreBackend,
  /// Directory holding the persisted index
  #[serde(default = "default_data_dir")]
  pub data_dir: PathBuf,
  /// Collection (file or table) name inside the data directory
  #[serde(default = "default_collection")]
  pub collection: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
  #[serde(default)]
  pub provider: EmbedderKind,
  /// Endpoint used by the Ollama embedder
  #[serde(default = "default_embedding_url")]
  pub url: String,
  #[serde(default = "default_embedding_model")]
  pub model: String,
  /// Vector size produced by the hashing embedder
  #[serde(default = "default_embedding_dimension")]
  pub dimension: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalLlmConfig {
  #[serde(default = "default_local_url")]
  pub url: String,
  #[serde(default = "default_local_model")]
  pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostedLlmConfig {
  #[serde(default = "default_hosted_url")]
  pub url: String,
  #[serde(default = "default_hosted_model")]
  pub model: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
  #[serde(default)]
  pub backend: LlmBackendKind,
  #[serde(default)]
  pub local: LocalLlmConfig,
  #[serde(default)]
  pub hosted: HostedLlmConfig,
  /// Whole-request timeout; unset means wait indefinitely
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
  /// How many schemes are retrieved as context per turn
  #[serde(default = "default_results")]
  pub results: usize,
  /// Answer without context instead of failing when the store is down
  #[serde(default)]
  pub empty_context_on_store_failure: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_bind")]
  pub bind: String,
}

fn default_data_dir() -> PathBuf {
  dirs::home_dir().unwrap_or_else(|| PathBuf::from("/tmp")).join(".schemes").join("data")
}
fn default_collection() -> String {
  "government_schemes".to_string()
}
fn default_embedding_url() -> String {
  "http://localhost:11434/api/embeddings".to_string()
}
fn default_embedding_model() -> String {
  "nomic-embed-text".to_string()
}
fn default_embedding_dimension() -> usize {
  384
}
fn default_local_url() -> String {
  "http://localhost:11434/api/generate".to_string()
}
fn default_local_model() -> String {
  "llama3.2".to_string()
}
fn default_hosted_url() -> String {
  "https://api.openai.com/v1/chat/completions".to_string()
}
fn default_hosted_model() -> String {
  "gpt-3.5-turbo".to_string()
}
fn default_results() -> usize {
  crate::server::services::scheme_store::DEFAULT_RESULTS
}
fn default_bind() -> String {
  "127.0.0.1:8000".to_string()
}

impl Default for StoreConfig {
  fn default() -> Self {
    Self {
      backend: StoreBackend::default(),
      data_dir: default_data_dir(),
      collection: default_collection(),
    }
  }
}

impl Default for EmbeddingConfig {
  fn default() -> Self {
    Self {
      provider: EmbedderKind::default(),
      url: default_embedding_url(),
      model: default_embedding_model(),
      dimension: default_embedding_dimension(),
    }
  }
}

impl Default for LocalLlmConfig {
  fn default() -> Self {
    Self { url: default_local_url(), model: default_local_model() }
  }
}

impl Default for HostedLlmConfig {
  fn default() -> Self {
    Self {
      url: default_hosted_url(),
      model: default_hosted_model(),
      api_key: None,
    }
  }
}

impl Default for ChatConfig {
  fn default() -> Self {
    Self { results: default_results(), empty_context_on_store_failure: false }
  }
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self { bind: default_bind() }
  }
}

impl FromStr for StoreBackend {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "json" => Ok(StoreBackend::Json),
      "lancedb" | "lance" => Ok(StoreBackend::Lancedb),
      other => Err(format!("expected 'json' or 'lancedb', got '{other}'")),
    }
  }
}

impl FromStr for EmbedderKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "hashing" | "hash" => Ok(EmbedderKind::Hashing),
      "ollama" => Ok(EmbedderKind::Ollama),
      "onnx" => Ok(EmbedderKind::Onnx),
      other => Err(format!("expected 'hashing', 'ollama' or 'onnx', got '{other}'")),
    }
  }
}

impl FromStr for LlmBackendKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "local" | "ollama" => Ok(LlmBackendKind::Local),
      "hosted" | "openai" => Ok(LlmBackendKind::Hosted),
      other => Err(format!("expected 'local' or 'hosted', got '{other}'")),
    }
  }
}

impl AssistantConfig {
  /// Load a configuration file, filling unset keys with defaults
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
      path: path.display().to_string(),
      message: e.to_string(),
    })?;
    if content.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(&content)
      .map_err(|e| ConfigError::Parse { path: path.display().to_string(), message: e.to_string() })
  }

  /// Resolve the full configuration: file, then environment, then validation.
  ///
  /// `explicit` must exist when given. Otherwise the first of
  /// [`CONFIG_SEARCH_PATHS`] that exists is used, falling back to defaults.
  pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
    let mut config = match explicit {
      Some(path) => Self::load_from_file(path)?,
      None => Self::discover()?,
    };
    config.apply_env(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
  }

  fn discover() -> Result<Self, ConfigError> {
    for path in CONFIG_SEARCH_PATHS {
      if Path::new(path).exists() {
        bentley::verbose!("Using config file {path}");
        return Self::load_from_file(path);
      }
    }
    Ok(Self::default())
  }

  /// Overlay `SCHEMES_*` variables read through `lookup`
  pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(value) = get("SCHEMES_DATA_DIR") {
      self.store.data_dir = PathBuf::from(value);
    }
    if let Some(value) = get("SCHEMES_COLLECTION") {
      self.store.collection = value;
    }
    if let Some(value) = get("SCHEMES_STORE") {
      self.store.backend = parse_env("SCHEMES_STORE", &value)?;
    }
    if let Some(value) = get("SCHEMES_EMBEDDER") {
      self.embedding.provider = parse_env("SCHEMES_EMBEDDER", &value)?;
    }
    if let Some(value) = get("SCHEMES_EMBEDDING_URL") {
      self.embedding.url = value;
    }
    if let Some(value) = get("SCHEMES_EMBEDDING_MODEL") {
      self.embedding.model = value;
    }
    if let Some(value) = get("SCHEMES_LLM_BACKEND") {
      self.llm.backend = parse_env("SCHEMES_LLM_BACKEND", &value)?;
    }
    if let Some(value) = get("SCHEMES_LOCAL_URL") {
      self.llm.local.url = value;
    }
    if let Some(value) = get("SCHEMES_LOCAL_MODEL") {
      self.llm.local.model = value;
    }
    if let Some(value) = get("SCHEMES_HOSTED_URL") {
      self.llm.hosted.url = value;
    }
    if let Some(value) = get("SCHEMES_HOSTED_MODEL") {
      self.llm.hosted.model = value;
    }
    if let Some(value) = get("SCHEMES_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
      self.llm.hosted.api_key = Some(value);
    }
    if let Some(value) = get("SCHEMES_LLM_TIMEOUT_SECS") {
      self.llm.timeout_secs = Some(parse_env("SCHEMES_LLM_TIMEOUT_SECS", &value)?);
    }
    if let Some(value) = get("SCHEMES_BIND") {
      self.server.bind = value;
    }
    Ok(())
  }

  /// Reject configurations that cannot work
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.llm.backend == LlmBackendKind::Hosted && self.hosted_api_key().is_none() {
      return Err(ConfigError::MissingCredential);
    }
    if self.store.collection.trim().is_empty() {
      return Err(invalid("store.collection", "must not be blank"));
    }
    if self.embedding.provider == EmbedderKind::Hashing && self.embedding.dimension == 0 {
      return Err(invalid("embedding.dimension", "must be greater than zero"));
    }
    if self.llm.timeout_secs == Some(0) {
      return Err(invalid("llm.timeout_secs", "must be greater than zero"));
    }
    let url = match self.llm.backend {
      LlmBackendKind::Local => ("llm.local.url", &self.llm.local.url),
      LlmBackendKind::Hosted => ("llm.hosted.url", &self.llm.hosted.url),
    };
    if !(url.1.starts_with("http://") || url.1.starts_with("https://")) {
      return Err(invalid(url.0, "must be an http(s) URL"));
    }
    Ok(())
  }

  /// Hosted API key, ignoring blank values
  pub fn hosted_api_key(&self) -> Option<&str> {
    self.llm.hosted.api_key.as_deref().filter(|key| !key.trim().is_empty())
  }

  /// Parsed server bind address
  pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
    self.server.bind.parse().map_err(|e| invalid("server.bind", &format!("{e}")))
  }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  value.trim().parse().map_err(|e: T::Err| invalid(key, &e.to_string()))
}

fn invalid(key: &str, message: &str) -> ConfigError {
  ConfigError::InvalidValue { key: key.to_string(), message: message.to_string() }
}
