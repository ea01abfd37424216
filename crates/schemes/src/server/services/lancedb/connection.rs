//! Database connection management for LanceDB

use lancedb::{connect, Connection};
use std::path::Path;

use crate::errors::StoreError;

/// Connect to the LanceDB directory, creating it if needed
pub async fn create_connection(data_dir: &Path) -> Result<Connection, StoreError> {
  std::fs::create_dir_all(data_dir).map_err(|e| {
    StoreError::unavailable(format!("cannot create data directory {}: {e}", data_dir.display()))
  })?;

  connect(&data_dir.to_string_lossy())
    .execute()
    .await
    .map_err(|e| StoreError::unavailable(format!("failed to connect to LanceDB: {e}")))
}
