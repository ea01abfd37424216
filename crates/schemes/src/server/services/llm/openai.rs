//! Hosted LLM backend speaking the OpenAI chat completions protocol

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{send_json, LlmBackend};
use crate::config::HostedLlmConfig;
use crate::errors::LlmError;

const NAME: &str = "OpenAI";
/// Sampling settings sent with every completion request
pub const TEMPERATURE: f32 = 0.7;
pub const MAX_TOKENS: u32 = 1000;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
  role: &'static str,
  content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
  model: &'a str,
  messages: Vec<ChatMessage<'a>>,
  temperature: f32,
  max_tokens: u32,
}

pub struct OpenAiBackend {
  client: Client,
  url: String,
  model: String,
  api_key: String,
}

impl OpenAiBackend {
  pub fn new(client: Client, config: &HostedLlmConfig, api_key: &str) -> Self {
    Self {
      client,
      url: config.url.clone(),
      model: config.model.clone(),
      api_key: api_key.to_string(),
    }
  }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
  fn name(&self) -> &'static str {
    NAME
  }

  async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
    let request = ChatCompletionRequest {
      model: &self.model,
      messages: vec![ChatMessage { role: "user", content: prompt }],
      temperature: TEMPERATURE,
      max_tokens: MAX_TOKENS,
    };
    bentley::verbose!("POST {} (model {})", self.url, self.model);

    let body = send_json(
      NAME,
      self.client.post(&self.url).bearer_auth(&self.api_key).json(&request),
    )
    .await?;
    body["choices"][0]["message"]["content"].as_str().map(str::to_string).ok_or_else(|| {
      LlmError::MalformedResponse {
        backend: NAME,
        message: "missing choices[0].message.content".to_string(),
      }
    })
  }
}
