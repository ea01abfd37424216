//! LanceDB implementation of the VectorDatabase trait
//!
//! Schemes live in one table named after the collection. The table is
//! created lazily from the first upsert, so its embedding width follows
//! whatever embedder produced that batch.

pub mod connection;
pub mod records;
pub mod search;
pub mod table_manager;

use async_trait::async_trait;
use std::path::Path;

use crate::errors::StoreError;
use crate::scheme::SchemeRecord;
use crate::server::services::vector_database::{
  IndexedDocument, VectorDatabase, VectorSearchResult,
};
use connection::create_connection;
use search::{scan_records, search_similar_documents};
use table_manager::TableManager;

pub struct LanceDbVectorDatabase {
  table_manager: TableManager,
}

impl LanceDbVectorDatabase {
  pub async fn new(data_dir: &Path, table_name: &str) -> Result<Self, StoreError> {
    let connection = create_connection(data_dir).await?;
    Ok(Self { table_manager: TableManager::new(connection, table_name.to_string()) })
  }
}

#[async_trait]
impl VectorDatabase for LanceDbVectorDatabase {
  async fn upsert(&self, documents: &[IndexedDocument]) -> Result<(), StoreError> {
    if documents.is_empty() {
      return Ok(());
    }
    match self.table_manager.existing_table().await? {
      Some(table) => self.table_manager.replace_documents(&table, documents).await,
      None => self.table_manager.create_table(documents).await,
    }
  }

  async fn search_similar(
    &self,
    query_embedding: &[f32],
    limit: usize,
  ) -> Result<Vec<VectorSearchResult>, StoreError> {
    if limit == 0 {
      return Ok(Vec::new());
    }
    match self.table_manager.existing_table().await? {
      Some(table) => search_similar_documents(&table, query_embedding, limit).await,
      None => Ok(Vec::new()),
    }
  }

  async fn all(&self) -> Result<Vec<SchemeRecord>, StoreError> {
    match self.table_manager.existing_table().await? {
      Some(table) => scan_records(&table).await,
      None => Ok(Vec::new()),
    }
  }

  async fn count(&self) -> Result<usize, StoreError> {
    match self.table_manager.existing_table().await? {
      Some(table) => table
        .count_rows(None)
        .await
        .map_err(|e| StoreError::unavailable(format!("failed to count rows: {e}"))),
      None => Ok(0),
    }
  }

  async fn clear(&self) -> Result<(), StoreError> {
    if let Some(table) = self.table_manager.existing_table().await? {
      table
        .delete("id IS NOT NULL")
        .await
        .map_err(|e| StoreError::unavailable(format!("failed to clear table: {e}")))?;
      bentley::verbose!("Cleared all schemes from LanceDB table");
    }
    Ok(())
  }

  async fn replace_all(&self, documents: &[IndexedDocument]) -> Result<(), StoreError> {
    if documents.is_empty() {
      return self.clear().await;
    }
    match self.table_manager.existing_table().await? {
      Some(table) => self.table_manager.overwrite_documents(&table, documents).await,
      None => self.table_manager.create_table(documents).await,
    }
  }
}
