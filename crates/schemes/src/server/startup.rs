//! REST server startup and configuration

use anyhow::Result;
use axum::serve;
use bentley::daemon_logs::DaemonLogs;
use std::path::PathBuf;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::server::middleware::AppState;
use crate::server::routing::create_router;
use crate::server::services::assistant::SchemeAssistant;

/// Start the REST server and serve until Ctrl-C
pub async fn start_server(addr: SocketAddr, assistant: Arc<SchemeAssistant>) -> Result<()> {
  let logs_path = get_server_logs_path();
  let daemon_logs = Arc::new(DaemonLogs::new(&logs_path)?);

  daemon_logs
    .info(
      &format!("Starting scheme assistant on {addr} ({} backend)", assistant.backend_name()),
      "schemes-server",
    )
    .await;

  let state = AppState { assistant, logger: daemon_logs.clone() };
  let app = create_router(state).layer(
    ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()),
  );

  let listener = TcpListener::bind(addr).await?;
  daemon_logs.success(&format!("Server listening on {addr}"), "schemes-server").await;

  match serve(listener, app).with_graceful_shutdown(shutdown_signal()).await {
    Ok(()) => {
      daemon_logs.info("Server shutdown gracefully", "schemes-server").await;
      Ok(())
    }
    Err(e) => {
      daemon_logs.error(&format!("Server error: {e}"), "schemes-server").await;
      Err(anyhow::anyhow!("Server error: {e}"))
    }
  }
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    bentley::warn!("Failed to listen for shutdown signal: {e}");
    std::future::pending::<()>().await;
  }
}

/// Path of the persistent server log
pub fn get_server_logs_path() -> PathBuf {
  dirs::home_dir()
    .unwrap_or_else(|| PathBuf::from("/tmp"))
    .join(".schemes")
    .join("server.logs.jsonl")
}
