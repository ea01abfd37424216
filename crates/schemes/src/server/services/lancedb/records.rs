//! Arrow RecordBatch conversion for indexed schemes

use arrow::array::{Array, ArrayRef, FixedSizeListBuilder, Float32Array, Float32Builder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;

use crate::errors::StoreError;
use crate::scheme::{SchemeRecord, REQUIRED_FIELDS};
use crate::server::services::vector_database::IndexedDocument;

pub const TEXT_COLUMN: &str = "text";
pub const EMBEDDING_COLUMN: &str = "embedding";

/// Schema for a table whose embeddings have `dimension` entries
pub fn scheme_schema(dimension: usize) -> Arc<Schema> {
  let mut fields: Vec<Field> =
    REQUIRED_FIELDS.iter().map(|name| Field::new(*name, DataType::Utf8, false)).collect();
  fields.push(Field::new(TEXT_COLUMN, DataType::Utf8, false));
  fields.push(Field::new(
    EMBEDDING_COLUMN,
    DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dimension as i32),
    false,
  ));
  Arc::new(Schema::new(fields))
}

/// Convert documents into one RecordBatch; all embeddings must share a size
pub fn documents_to_arrow_batch(documents: &[IndexedDocument]) -> Result<RecordBatch, StoreError> {
  let first = documents
    .first()
    .ok_or_else(|| StoreError::unavailable("cannot create a RecordBatch from no documents"))?;
  let dimension = first.embedding.len();
  if let Some(odd) = documents.iter().find(|d| d.embedding.len() != dimension) {
    return Err(StoreError::corrupt(format!(
      "embedding for '{}' has {} dimensions, expected {dimension}",
      odd.id(),
      odd.embedding.len()
    )));
  }

  let mut columns: Vec<ArrayRef> = REQUIRED_FIELDS
    .iter()
    .map(|name| {
      let values: Vec<&str> =
        documents.iter().map(|d| d.record.field(name).unwrap_or_default()).collect();
      Arc::new(StringArray::from(values)) as ArrayRef
    })
    .collect();
  columns.push(Arc::new(StringArray::from(
    documents.iter().map(|d| d.text.as_str()).collect::<Vec<_>>(),
  )));
  columns.push(Arc::new(embedding_array(documents, dimension)));

  RecordBatch::try_new(scheme_schema(dimension), columns)
    .map_err(|e| StoreError::unavailable(format!("failed to create RecordBatch: {e}")))
}

fn embedding_array(
  documents: &[IndexedDocument],
  dimension: usize,
) -> arrow::array::FixedSizeListArray {
  let mut builder: FixedSizeListBuilder<Float32Builder> = FixedSizeListBuilder::new(
    Float32Array::builder(dimension * documents.len()),
    dimension as i32,
  );
  for document in documents {
    builder.values().append_slice(&document.embedding);
    builder.append(true);
  }
  builder.finish()
}

/// Read scheme records back out of a result batch
pub fn batch_to_records(batch: &RecordBatch) -> Result<Vec<SchemeRecord>, StoreError> {
  let columns = REQUIRED_FIELDS
    .iter()
    .map(|name| string_column(batch, name))
    .collect::<Result<Vec<_>, _>>()?;

  let records = (0..batch.num_rows())
    .map(|row| {
      let value = |index: usize| columns[index].value(row).to_string();
      SchemeRecord {
        id: value(0),
        name: value(1),
        full_name: value(2),
        ministry: value(3),
        description: value(4),
        eligibility: value(5),
        benefits: value(6),
        documents_required: value(7),
        how_to_apply: value(8),
        website: value(9),
      }
    })
    .collect();
  Ok(records)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray, StoreError> {
  batch
    .column_by_name(name)
    .ok_or_else(|| StoreError::corrupt(format!("missing '{name}' column")))?
    .as_any()
    .downcast_ref::<StringArray>()
    .ok_or_else(|| StoreError::corrupt(format!("'{name}' column is not a string column")))
}

/// The `_distance` column LanceDB adds to vector search results
pub fn distance_column(batch: &RecordBatch) -> Option<&Float32Array> {
  batch.column_by_name("_distance").and_then(|col| col.as_any().downcast_ref::<Float32Array>())
}
