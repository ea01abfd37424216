//! Local LLM backend speaking the Ollama `/api/generate` protocol

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{send_json, LlmBackend};
use crate::errors::LlmError;

const NAME: &str = "Ollama";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
  model: &'a str,
  prompt: &'a str,
  stream: bool,
}

pub struct OllamaBackend {
  client: Client,
  url: String,
  model: String,
}

impl OllamaBackend {
  pub fn new(client: Client, url: &str, model: &str) -> Self {
    Self { client, url: url.to_string(), model: model.to_string() }
  }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
  fn name(&self) -> &'static str {
    NAME
  }

  async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
    let request = GenerateRequest { model: &self.model, prompt, stream: false };
    bentley::verbose!("POST {} (model {})", self.url, self.model);

    let body = send_json(NAME, self.client.post(&self.url).json(&request)).await?;
    body["response"].as_str().map(str::to_string).ok_or_else(|| LlmError::MalformedResponse {
      backend: NAME,
      message: "missing 'response' field".to_string(),
    })
  }
}
