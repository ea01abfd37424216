//! Vector search and table scans for LanceDB

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use futures::stream::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;

use super::records::{batch_to_records, distance_column, EMBEDDING_COLUMN};
use crate::errors::StoreError;
use crate::scheme::SchemeRecord;
use crate::server::services::vector_database::VectorSearchResult;

/// Nearest rows to `query_embedding`, closest first
pub async fn search_similar_documents(
  table: &Table,
  query_embedding: &[f32],
  limit: usize,
) -> Result<Vec<VectorSearchResult>, StoreError> {
  let batches: Vec<RecordBatch> = table
    .vector_search(query_embedding)
    .map_err(search_failed)?
    .column(EMBEDDING_COLUMN)
    .limit(limit)
    .execute()
    .await
    .map_err(search_failed)?
    .try_collect()
    .await
    .map_err(search_failed)?;

  let mut results = Vec::new();
  for batch in &batches {
    let distances = distance_column(batch);
    for (row, record) in batch_to_records(batch)?.into_iter().enumerate() {
      let distance = distances.filter(|d| row < d.len() && !d.is_null(row)).map(|d| d.value(row));
      results.push(VectorSearchResult { record, similarity: distance_to_similarity(distance) });
    }
  }

  if results.is_empty() {
    bentley::verbose!("No similar schemes found");
  }
  Ok(results)
}

/// Every record in the table
pub async fn scan_records(table: &Table) -> Result<Vec<SchemeRecord>, StoreError> {
  let batches: Vec<RecordBatch> = table
    .query()
    .execute()
    .await
    .map_err(search_failed)?
    .try_collect()
    .await
    .map_err(search_failed)?;

  let mut records = Vec::new();
  for batch in &batches {
    records.extend(batch_to_records(batch)?);
  }
  Ok(records)
}

/// Map squared L2 distance between unit vectors onto a 0-1 similarity
fn distance_to_similarity(distance: Option<f32>) -> f32 {
  match distance {
    Some(distance) => (2.0 - distance.clamp(0.0, 2.0)) / 2.0,
    None => 0.0,
  }
}

fn search_failed(e: lancedb::Error) -> StoreError {
  StoreError::unavailable(format!("vector search failed: {e}"))
}
