//! Embeddings from a local Ollama server

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{normalize_embedding, Embedder};
use crate::errors::EmbeddingError;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
  model: &'a str,
  prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
  embedding: Vec<f32>,
}

pub struct OllamaEmbedder {
  client: Client,
  url: String,
  model: String,
}

impl OllamaEmbedder {
  pub fn new(url: &str, model: &str) -> Self {
    Self { client: Client::new(), url: url.to_string(), model: model.to_string() }
  }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    let request = EmbeddingRequest { model: &self.model, prompt: text };
    let response = self
      .client
      .post(&self.url)
      .json(&request)
      .send()
      .await
      .map_err(|e| EmbeddingError::Request(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(EmbeddingError::Request(format!("HTTP {}: {body}", status.as_u16())));
    }

    let body: EmbeddingResponse =
      response.json().await.map_err(|e| EmbeddingError::Response(e.to_string()))?;
    if body.embedding.is_empty() {
      return Err(EmbeddingError::Response("empty embedding".to_string()));
    }
    Ok(normalize_embedding(body.embedding))
  }
}
