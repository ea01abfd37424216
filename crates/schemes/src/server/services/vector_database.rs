//! Vector database abstraction for indexed schemes
//!
//! The scheme store only talks to this trait, so the JSON file store and
//! LanceDB can be swapped through configuration without touching retrieval.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;
use crate::scheme::SchemeRecord;

/// A scheme together with the text and vector it was indexed under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
  pub record: SchemeRecord,
  /// Concatenated searchable text that produced `embedding`
  pub text: String,
  pub embedding: Vec<f32>,
}

impl IndexedDocument {
  pub fn id(&self) -> &str {
    &self.record.id
  }
}

/// Generic search result from vector similarity operations
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchResult {
  pub record: SchemeRecord,
  /// Similarity score (0.0-1.0, higher is more similar)
  pub similarity: f32,
}

/// Storage and nearest-neighbour search over indexed schemes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorDatabase: Send + Sync {
  /// Insert documents, replacing any stored document with the same id
  async fn upsert(&self, documents: &[IndexedDocument]) -> Result<(), StoreError>;

  /// Up to `limit` documents, most similar first
  async fn search_similar(
    &self,
    query_embedding: &[f32],
    limit: usize,
  ) -> Result<Vec<VectorSearchResult>, StoreError>;

  /// Every stored record
  async fn all(&self) -> Result<Vec<SchemeRecord>, StoreError>;

  /// Number of stored documents
  async fn count(&self) -> Result<usize, StoreError>;

  /// Remove every stored document
  async fn clear(&self) -> Result<(), StoreError>;

  /// Make `documents` the entire collection in a single write
  async fn replace_all(&self, documents: &[IndexedDocument]) -> Result<(), StoreError>;
}

/// Cosine similarity mapped from [-1, 1] onto [0, 1]
///
/// Mismatched or empty vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
  if a.len() != b.len() || a.is_empty() {
    return 0.0;
  }

  let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
  let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
  let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

  if norm_a == 0.0 || norm_b == 0.0 {
    return 0.0;
  }

  let similarity = dot_product / (norm_a * norm_b);
  ((similarity + 1.0) / 2.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cosine_similarity_range() {
    assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
    assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]) - 0.5).abs() < 1e-6);
    assert!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]).abs() < 1e-6);
  }

  #[test]
  fn test_cosine_similarity_degenerate_inputs() {
    assert_eq!(cosine_similarity(&[], &[]), 0.0);
    assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
  }
}
