//! Text embedding models
//!
//! The store only depends on [`Embedder`]. Which implementation backs it is
//! picked once from configuration by [`create_embedder`].

mod hashing;
mod ollama;
#[cfg(feature = "ml-features")]
mod onnx;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{EmbedderKind, EmbeddingConfig};
use crate::errors::EmbeddingError;

pub use hashing::HashingEmbedder;
pub use ollama::OllamaEmbedder;
#[cfg(feature = "ml-features")]
pub use onnx::OnnxEmbedder;

/// Opaque text-to-vector function
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Build the configured embedder
pub async fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
  match config.provider {
    EmbedderKind::Hashing => Ok(Arc::new(HashingEmbedder::new(config.dimension))),
    EmbedderKind::Ollama => Ok(Arc::new(OllamaEmbedder::new(&config.url, &config.model))),
    EmbedderKind::Onnx => create_onnx_embedder().await,
  }
}

#[cfg(feature = "ml-features")]
async fn create_onnx_embedder() -> Result<Arc<dyn Embedder>, EmbeddingError> {
  Ok(Arc::new(OnnxEmbedder::load().await?))
}

#[cfg(not(feature = "ml-features"))]
async fn create_onnx_embedder() -> Result<Arc<dyn Embedder>, EmbeddingError> {
  Err(EmbeddingError::Model(
    "ONNX embeddings require building with the ml-features feature".to_string(),
  ))
}

/// Scale a vector to unit length, leaving zero vectors untouched
pub fn normalize_embedding(mut embedding: Vec<f32>) -> Vec<f32> {
  let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
  if magnitude < f32::EPSILON {
    return embedding;
  }
  for value in embedding.iter_mut() {
    *value /= magnitude;
  }
  embedding
}
