//! Offline feature-hashing embedder
//!
//! Opt-in with `embedding.provider: hashing`. It only matches shared words
//! and word fragments, so it is a stand-in for environments without the
//! ONNX model and a deterministic embedder for tests.
//!
//! Lowercased word tokens and their character trigrams are hashed with
//! FNV-1a into a fixed number of signed buckets. The result is stable across
//! builds and platforms, so a persisted index stays valid.

use async_trait::async_trait;

use super::{normalize_embedding, Embedder};
use crate::errors::EmbeddingError;

const TRIGRAM_WEIGHT: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
  dimension: usize,
}

impl HashingEmbedder {
  pub fn new(dimension: usize) -> Self {
    Self { dimension: dimension.max(1) }
  }

  fn embed_text(&self, text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; self.dimension];
    for token in tokenize(text) {
      self.add_feature(&mut vector, &token, 1.0);

      let padded: Vec<char> = format!("#{token}#").chars().collect();
      for window in padded.windows(3) {
        let trigram: String = window.iter().collect();
        self.add_feature(&mut vector, &trigram, TRIGRAM_WEIGHT);
      }
    }
    normalize_embedding(vector)
  }

  fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
    let hash = fnv1a64(feature);
    let index = (hash % self.dimension as u64) as usize;
    let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
    vector[index] += sign * weight;
  }
}

#[async_trait]
impl Embedder for HashingEmbedder {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    Ok(self.embed_text(text))
  }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
  text.split(|c: char| !c.is_alphanumeric()).filter(|token| !token.is_empty()).map(str::to_lowercase)
}

fn fnv1a64(s: &str) -> u64 {
  let mut hash: u64 = 14695981039346656037;
  for byte in s.as_bytes() {
    hash ^= *byte as u64;
    hash = hash.wrapping_mul(1099511628211);
  }
  hash
}
