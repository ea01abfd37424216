//! REST API types with schemars annotations for OpenAPI generation

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scheme::SchemeRecord;

// Base Response Structure
// ======================

/// Base response object for all API endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  /// Optional error information
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  /// Response data (generic for different endpoint types)
  #[serde(flatten)]
  pub data: T,
}

/// API versioning information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
  /// The latest version of the API
  pub latest: String,

  /// The version of the API requested by the client
  pub requested: String,

  /// The version of the API that was used in producing the response
  pub resolved: String,
}

/// API error information
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,

  /// Additional error context
  #[serde(default)]
  pub context: serde_json::Value,
}

// Health Endpoint
// ===============

/// Response for `GET /`
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
  pub status: String,
  pub message: String,
  pub version: String,
}

// Chat Endpoint
// =============

/// Request for `POST /chat`
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChatRequest {
  /// The user's question
  pub message: String,
}

/// Response for `POST /chat`
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChatResponse {
  /// The assistant's answer
  pub response: String,
}

// Scheme Endpoints
// ================

/// Response for `GET /schemes`
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListSchemesResponse {
  pub total: usize,
  pub schemes: Vec<SchemeRecord>,
}

/// Request for `POST /schemes/search`
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchRequest {
  /// Free-text query
  pub query: String,

  /// Maximum number of results (defaults to 3)
  #[serde(default)]
  pub k: Option<usize>,
}

/// One scored search hit
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchResultData {
  #[serde(flatten)]
  pub scheme: SchemeRecord,

  /// Similarity score between 0 and 1
  pub score: f32,
}

/// Response for `POST /schemes/search`
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchResponse {
  pub results: Vec<SearchResultData>,
  pub count: usize,
}

// Logs Endpoint
// =============

/// Query parameters for `GET /logs`
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct LogsQuery {
  /// Most recent entries to return (defaults to 100)
  pub limit: Option<usize>,

  /// Only entries at this level ("all" for every level)
  pub level: Option<String>,
}

/// Response for `GET /logs`
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LogsResponse {
  /// JSON log entries
  pub logs: Vec<LogEntry>,
}

/// Individual log entry (re-exported from bentley)
pub type LogEntry = bentley::daemon_logs::LogEntry;

/// Request context information for logs (re-exported from bentley)
pub type LogContext = bentley::daemon_logs::LogContext;

// Helper Functions
// ================

fn version_info() -> VersionInfo {
  let version = env!("CARGO_PKG_VERSION");
  VersionInfo {
    latest: version.to_string(),
    requested: version.to_string(),
    resolved: version.to_string(),
  }
}

impl<T> BaseResponse<T> {
  /// Create a successful response
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: version_info(), transaction_id, errors: Vec::new(), data }
  }

  /// Create an error response
  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { versioning: version_info(), transaction_id, errors, data: () }
  }
}

impl ApiError {
  /// Create a new API error
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string(), context: serde_json::Value::Null }
  }
}
