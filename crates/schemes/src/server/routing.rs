//! Axum router configuration for all endpoints

use axum::{
  middleware::from_fn_with_state,
  routing::{get, post},
  Router,
};

use crate::server::handlers::{chat, logs, schemes, status};
use crate::server::middleware::{request_context_middleware, AppState};

/// Create the application router over shared assistant state
pub fn create_router(state: AppState) -> Router {
  Router::new()
    .route("/", get(status::health))
    .route("/chat", post(chat::chat))
    .route("/schemes", get(schemes::list_schemes))
    .route("/schemes/search", post(schemes::search_schemes))
    .route("/logs", get(logs::get_logs))
    .layer(from_fn_with_state(state.clone(), request_context_middleware))
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::errors::{LlmError, StoreError};
  use crate::scheme::fixtures::{pm_kisan, scheme};
  use crate::server::services::assistant::{AssistantOptions, SchemeAssistant};
  use crate::server::services::embeddings::{HashingEmbedder, MockEmbedder};
  use crate::server::services::json_store::JsonFileDatabase;
  use crate::server::services::llm::{LlmClient, MockLlmBackend};
  use crate::server::services::scheme_store::SchemeStore;
  use crate::server::services::vector_database::MockVectorDatabase;
  use axum::body::{to_bytes, Body};
  use axum::http::{Request, StatusCode};
  use bentley::daemon_logs::DaemonLogs;
  use serde_json::{json, Value};
  use std::sync::Arc;
  use tempfile::TempDir;
  use tower::ServiceExt;

  struct TestApp {
    router: Router,
    _temp_dir: TempDir,
  }

  async fn app_with(backend: MockLlmBackend) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let database = JsonFileDatabase::new(temp_dir.path(), "government_schemes").unwrap();
    let store = SchemeStore::new(Arc::new(database), Arc::new(HashingEmbedder::new(256)));
    store
      .load(vec![
        pm_kisan(),
        scheme("pmay", "PMAY", "urban households without a pucca house"),
        scheme("mudra", "MUDRA", "small business owners"),
      ])
      .await
      .unwrap();
    let logger =
      DaemonLogs::new_with_silent(temp_dir.path().join("server.logs.jsonl"), true).unwrap();

    let assistant = SchemeAssistant::new(
      Arc::new(store),
      LlmClient::new(Box::new(backend)),
      AssistantOptions::default(),
    );
    let state = AppState { assistant: Arc::new(assistant), logger: Arc::new(logger) };
    TestApp { router: create_router(state), _temp_dir: temp_dir }
  }

  fn failing_store_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut embedder = MockEmbedder::new();
    embedder.expect_embed().returning(|_| Ok(vec![1.0]));
    let mut database = MockVectorDatabase::new();
    database.expect_search_similar().returning(|_, _| Err(StoreError::unavailable("disk gone")));
    database.expect_all().returning(|| Err(StoreError::unavailable("disk gone")));
    let store = SchemeStore::new(Arc::new(database), Arc::new(embedder));

    let mut backend = MockLlmBackend::new();
    backend.expect_complete().never();
    let assistant = SchemeAssistant::new(
      Arc::new(store),
      LlmClient::new(Box::new(backend)),
      AssistantOptions::default(),
    );
    let logger =
      DaemonLogs::new_with_silent(temp_dir.path().join("server.logs.jsonl"), true).unwrap();
    let state = AppState { assistant: Arc::new(assistant), logger: Arc::new(logger) };
    (create_router(state), temp_dir)
  }

  fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
      .method("POST")
      .uri(uri)
      .header("content-type", "application/json")
      .body(Body::from(body.to_string()))
      .unwrap()
  }

  fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
  }

  async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn test_health_reports_running() {
    let app = app_with(MockLlmBackend::new()).await;
    let (status, body) = send(app.router, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["message"], "Government Scheme Assistant API");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
  }

  #[tokio::test]
  async fn test_chat_returns_backend_text() {
    let mut backend = MockLlmBackend::new();
    backend.expect_complete().times(1).returning(|_| Ok("Try PM-KISAN".to_string()));
    let app = app_with(backend).await;

    let (status, body) = send(app.router, post_json("/chat", json!({"message": "I am a farmer"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Try PM-KISAN");
    assert!(body.get("errors").is_none());
  }

  #[tokio::test]
  async fn test_chat_blank_message_is_bad_request() {
    let mut backend = MockLlmBackend::new();
    backend.expect_complete().never();
    let app = app_with(backend).await;

    let (status, body) = send(app.router, post_json("/chat", json!({"message": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["key"], "empty_message");
  }

  #[tokio::test]
  async fn test_chat_backend_failure_is_bad_gateway() {
    let mut backend = MockLlmBackend::new();
    backend.expect_complete().times(1).returning(|_| {
      Err(LlmError::Transport { backend: "Ollama", message: "connection refused".to_string() })
    });
    let app = app_with(backend).await;

    let (status, body) = send(app.router, post_json("/chat", json!({"message": "hello"}))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["errors"][0]["key"], "llm_backend_failed");
    assert_eq!(body["errors"][0]["message"], "Error connecting to Ollama: connection refused");
  }

  #[tokio::test]
  async fn test_chat_store_failure_is_service_unavailable() {
    let (router, _temp_dir) = failing_store_app();
    let (status, body) = send(router, post_json("/chat", json!({"message": "farmer"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["errors"][0]["key"], "store_unavailable");
  }

  #[tokio::test]
  async fn test_list_schemes_reports_total() {
    let app = app_with(MockLlmBackend::new()).await;
    let (status, body) = send(app.router, get("/schemes")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["schemes"].as_array().unwrap().len(), 3);
  }

  #[tokio::test]
  async fn test_list_schemes_store_failure() {
    let (router, _temp_dir) = failing_store_app();
    let (status, _) = send(router, get("/schemes")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
  }

  #[tokio::test]
  async fn test_search_respects_k() {
    let app = app_with(MockLlmBackend::new()).await;
    let (status, body) =
      send(app.router, post_json("/schemes/search", json!({"query": "farmers", "k": 2}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["id"], "pmkisan");
    assert!(body["results"][0]["score"].as_f64().unwrap() > 0.0);
  }

  #[tokio::test]
  async fn test_search_rejects_blank_query() {
    let app = app_with(MockLlmBackend::new()).await;
    let (status, body) =
      send(app.router, post_json("/schemes/search", json!({"query": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["key"], "empty_query");
  }

  #[tokio::test]
  async fn test_requests_are_logged_with_context() {
    let app = app_with(MockLlmBackend::new()).await;
    let router = app.router;
    let (status, _) = send(router.clone(), get("/")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(router, get("/logs?limit=10")).await;
    assert_eq!(status, StatusCode::OK);
    let logs = body["logs"].as_array().unwrap();
    let completed = logs
      .iter()
      .find(|entry| entry["message"] == "Request completed" && entry["context"]["path"] == "/")
      .unwrap();
    assert_eq!(completed["context"]["status_code"], 200);
    assert_eq!(completed["context"]["method"], "GET");
  }
}
