//! Request context and middleware for the schemes REST API
//!
//! Every request gets a [`RequestContext`] in its extensions carrying the
//! shared logger and request metadata, and its start and completion are
//! written to the daemon log.

use axum::{
  extract::{Request, State},
  http::{HeaderMap, Method, Uri},
  middleware::Next,
  response::Response,
};
use bentley::daemon_logs::{DaemonLogs, LogContext};
use bentley::Level;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::server::services::assistant::SchemeAssistant;

/// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
  pub assistant: Arc<SchemeAssistant>,
  pub logger: Arc<DaemonLogs>,
}

/// Request context containing logger and request metadata
#[derive(Clone)]
pub struct RequestContext {
  /// Unique ID for this request, also used as the response transaction id
  pub request_id: Uuid,
  pub method: Method,
  pub uri: Uri,
  pub headers: HeaderMap,
  pub logger: Arc<DaemonLogs>,
}

impl RequestContext {
  pub fn new(method: Method, uri: Uri, headers: HeaderMap, logger: Arc<DaemonLogs>) -> Self {
    Self { request_id: Uuid::new_v4(), method, uri, headers, logger }
  }

  pub async fn log_info(&self, message: &str, component: &str) {
    self.log(Level::Info, message, component, None, None).await;
  }

  pub async fn log_success(&self, message: &str, component: &str) {
    self.log(Level::Success, message, component, None, None).await;
  }

  pub async fn log_warn(&self, message: &str, component: &str) {
    self.log(Level::Warn, message, component, None, None).await;
  }

  pub async fn log_error(&self, message: &str, component: &str) {
    self.log(Level::Error, message, component, None, None).await;
  }

  /// Log with the request's method, path and id attached
  pub async fn log(
    &self,
    level: Level,
    message: &str,
    component: &str,
    status_code: Option<u16>,
    duration_ms: Option<f64>,
  ) {
    let context = LogContext {
      request_id: Some(self.request_id.to_string()),
      method: Some(self.method.to_string()),
      path: Some(self.uri.path().to_string()),
      status_code,
      duration_ms,
    };
    self.logger.log_with_context(level, message, component, context).await;
  }

  pub fn user_agent(&self) -> &str {
    self.headers.get("user-agent").and_then(|v| v.to_str().ok()).unwrap_or("none")
  }
}

/// Middleware to inject RequestContext into all requests
pub async fn request_context_middleware(
  State(state): State<AppState>,
  mut request: Request,
  next: Next,
) -> Response {
  let context = RequestContext::new(
    request.method().clone(),
    request.uri().clone(),
    request.headers().clone(),
    state.logger.clone(),
  );

  let start_time = Instant::now();
  context
    .log(
      Level::Info,
      &format!("Request started (User-Agent: {})", context.user_agent()),
      "http-request",
      None,
      None,
    )
    .await;

  request.extensions_mut().insert(context.clone());
  let response = next.run(request).await;

  let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
  let status = response.status().as_u16();
  let level = if status >= 500 { Level::Warn } else { Level::Info };
  context.log(level, "Request completed", "http-request", Some(status), Some(duration_ms)).await;

  response
}
