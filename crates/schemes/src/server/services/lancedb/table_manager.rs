//! Table management operations for LanceDB

use arrow::record_batch::RecordBatchIterator;
use lancedb::{Connection, Table};

use super::records::documents_to_arrow_batch;
use crate::errors::StoreError;
use crate::server::services::vector_database::IndexedDocument;

/// Owns the connection and the name of the schemes table
pub struct TableManager {
  connection: Connection,
  table_name: String,
}

impl TableManager {
  pub fn new(connection: Connection, table_name: String) -> Self {
    Self { connection, table_name }
  }

  pub async fn table_exists(&self) -> Result<bool, StoreError> {
    let tables = self
      .connection
      .table_names()
      .execute()
      .await
      .map_err(|e| StoreError::unavailable(format!("failed to list tables: {e}")))?;
    Ok(tables.contains(&self.table_name))
  }

  pub async fn get_table(&self) -> Result<Table, StoreError> {
    self.connection.open_table(&self.table_name).execute().await.map_err(|e| {
      StoreError::unavailable(format!("failed to open table '{}': {e}", self.table_name))
    })
  }

  /// The table if it has been created yet
  pub async fn existing_table(&self) -> Result<Option<Table>, StoreError> {
    if self.table_exists().await? {
      Ok(Some(self.get_table().await?))
    } else {
      Ok(None)
    }
  }

  /// Create the table from its first batch of documents
  pub async fn create_table(&self, documents: &[IndexedDocument]) -> Result<(), StoreError> {
    let batch = documents_to_arrow_batch(documents)?;
    let schema = batch.schema();
    let batch_iter = RecordBatchIterator::new(vec![Ok(batch)], schema);

    self
      .connection
      .create_table(&self.table_name, batch_iter)
      .execute()
      .await
      .map_err(|e| StoreError::unavailable(format!("failed to create table: {e}")))?;

    bentley::verbose!("Created table '{}' with {} schemes", self.table_name, documents.len());
    Ok(())
  }

  /// Replace documents that share an id, then append the new rows
  pub async fn replace_documents(
    &self,
    table: &Table,
    documents: &[IndexedDocument],
  ) -> Result<(), StoreError> {
    table
      .delete(&id_filter(documents))
      .await
      .map_err(|e| StoreError::unavailable(format!("failed to delete stale rows: {e}")))?;

    let batch = documents_to_arrow_batch(documents)?;
    let schema = batch.schema();
    let batch_iter = RecordBatchIterator::new(vec![Ok(batch)], schema);
    table
      .add(batch_iter)
      .execute()
      .await
      .map_err(|e| StoreError::unavailable(format!("failed to store schemes: {e}")))?;

    bentley::verbose!("Stored {} schemes in '{}'", documents.len(), self.table_name);
    Ok(())
  }

  /// Swap every row for `documents`
  ///
  /// The Arrow batch is built before anything is deleted, so a batch that
  /// cannot be encoded leaves the table untouched.
  pub async fn overwrite_documents(
    &self,
    table: &Table,
    documents: &[IndexedDocument],
  ) -> Result<(), StoreError> {
    let batch = documents_to_arrow_batch(documents)?;
    let schema = batch.schema();

    table
      .delete("id IS NOT NULL")
      .await
      .map_err(|e| StoreError::unavailable(format!("failed to clear table: {e}")))?;
    table
      .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
      .execute()
      .await
      .map_err(|e| StoreError::unavailable(format!("failed to store schemes: {e}")))?;

    bentley::verbose!("Replaced '{}' with {} schemes", self.table_name, documents.len());
    Ok(())
  }
}

/// `id IN (...)` predicate with quotes escaped
fn id_filter(documents: &[IndexedDocument]) -> String {
  let ids: Vec<String> =
    documents.iter().map(|d| format!("'{}'", d.id().replace('\'', "''"))).collect();
  format!("id IN ({})", ids.join(", "))
}
