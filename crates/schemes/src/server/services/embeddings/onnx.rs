//! Sentence embeddings from all-MiniLM-L6-v2 running on ONNX Runtime
//!
//! The model and tokenizer are fetched from the Hugging Face hub on first
//! load and cached by `hf-hub`.

use async_trait::async_trait;
use hf_hub::api::tokio::Api;
use ndarray::Array2;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;

#[cfg(target_os = "linux")]
use ort::execution_providers::CUDAExecutionProvider;
#[cfg(target_os = "macos")]
use ort::execution_providers::CoreMLExecutionProvider;
use ort::{
  execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch},
  session::Session,
  value::Value,
};

use super::{normalize_embedding, Embedder};
use crate::errors::EmbeddingError;

const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";
const TOKENIZER_FILE: &str = "tokenizer.json";
const MODEL_FILE: &str = "onnx/model.onnx";

struct Model {
  session: Session,
  tokenizer: Tokenizer,
}

pub struct OnnxEmbedder {
  model: Arc<Mutex<Model>>,
}

#[cfg(not(tarpaulin_include))]
impl OnnxEmbedder {
  /// Download (or reuse the cached) model and open an inference session
  pub async fn load() -> Result<Self, EmbeddingError> {
    bentley::info!("Loading embedding model {MODEL_NAME}...");
    let (tokenizer_file, model_file) = download_model().await?;

    let tokenizer = Tokenizer::from_file(tokenizer_file)
      .map_err(|e| model_error(format!("failed to load tokenizer: {e}")))?;
    let session = Session::builder()
      .and_then(|builder| builder.with_execution_providers(execution_providers()))
      .and_then(|mut builder| builder.commit_from_file(model_file))
      .map_err(|e| model_error(format!("failed to load ONNX model: {e}")))?;

    Ok(Self { model: Arc::new(Mutex::new(Model { session, tokenizer })) })
  }
}

#[cfg(not(tarpaulin_include))]
#[async_trait]
impl Embedder for OnnxEmbedder {
  async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    let model = Arc::clone(&self.model);
    let text = text.to_string();
    tokio::task::spawn_blocking(move || {
      let mut model = model.lock().map_err(|_| model_error("model lock poisoned"))?;
      model.embed(&text)
    })
    .await
    .map_err(|e| model_error(format!("embedding task failed: {e}")))?
  }
}

#[cfg(not(tarpaulin_include))]
impl Model {
  fn embed(&mut self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
    let encoding = self
      .tokenizer
      .encode(text, true)
      .map_err(|e| model_error(format!("tokenization failed: {e}")))?;
    let mask = encoding.get_attention_mask().to_vec();

    let mut input = HashMap::new();
    input.insert("input_ids".to_string(), to_tensor(encoding.get_ids())?);
    input.insert("attention_mask".to_string(), to_tensor(&mask)?);
    input.insert("token_type_ids".to_string(), to_tensor(encoding.get_type_ids())?);

    let output =
      self.session.run(input).map_err(|e| model_error(format!("inference failed: {e}")))?;
    let tensor = output
      .get("last_hidden_state")
      .ok_or_else(|| model_error("model produced no 'last_hidden_state' output"))?;
    let (shape, data) = tensor
      .try_extract_tensor::<f32>()
      .map_err(|e| model_error(format!("unexpected output tensor: {e}")))?;

    let pooled = mean_pool(shape.as_ref(), data, &mask)?;
    Ok(normalize_embedding(pooled))
  }
}

#[cfg(not(tarpaulin_include))]
async fn download_model() -> Result<(PathBuf, PathBuf), EmbeddingError> {
  let api = Api::new().map_err(|e| model_error(format!("HF API initialization failed: {e}")))?;
  let repo = api.model(MODEL_NAME.to_string());

  let tokenizer_file = repo
    .get(TOKENIZER_FILE)
    .await
    .map_err(|e| model_error(format!("failed to download tokenizer: {e}")))?;
  let model_file = repo
    .get(MODEL_FILE)
    .await
    .map_err(|e| model_error(format!("failed to download ONNX model: {e}")))?;
  Ok((tokenizer_file, model_file))
}

#[cfg(not(tarpaulin_include))]
fn execution_providers() -> Vec<ExecutionProviderDispatch> {
  let mut providers = Vec::new();

  #[cfg(target_os = "macos")]
  {
    providers.push(CoreMLExecutionProvider::default().into());
  }

  #[cfg(target_os = "linux")]
  {
    if is_cuda_available() {
      providers.push(CUDAExecutionProvider::default().build());
    }
  }

  providers.push(CPUExecutionProvider::default().into());
  providers
}

#[cfg(target_os = "linux")]
fn is_cuda_available() -> bool {
  std::process::Command::new("nvidia-smi").output().map(|output| output.status.success()).unwrap_or(false)
}

fn to_tensor(values: &[u32]) -> Result<Value, EmbeddingError> {
  let ids: Vec<i64> = values.iter().map(|&x| x as i64).collect();
  let array = Array2::from_shape_vec((1, ids.len()), ids).map_err(|e| model_error(e.to_string()))?;
  Ok(Value::from_array(array).map_err(|e| model_error(e.to_string()))?.into())
}

/// Average the token vectors of a `[1, seq, hidden]` output, skipping padding
fn mean_pool(shape: &[i64], data: &[f32], mask: &[u32]) -> Result<Vec<f32>, EmbeddingError> {
  let [_, seq_length, hidden_size] = shape else {
    return Err(model_error(format!("expected a 3-dimensional output, got shape {shape:?}")));
  };
  let (seq_length, hidden_size) = (*seq_length as usize, *hidden_size as usize);
  if data.len() < seq_length * hidden_size || mask.len() < seq_length {
    return Err(model_error("output tensor is smaller than its shape"));
  }

  let mut pooled = vec![0.0f32; hidden_size];
  let mut counted = 0usize;
  for token_idx in (0..seq_length).filter(|&i| mask[i] != 0) {
    let start = token_idx * hidden_size;
    for (i, &value) in data[start..start + hidden_size].iter().enumerate() {
      pooled[i] += value;
    }
    counted += 1;
  }

  if counted > 0 {
    for value in pooled.iter_mut() {
      *value /= counted as f32;
    }
  }
  Ok(pooled)
}

fn model_error(message: impl Into<String>) -> EmbeddingError {
  EmbeddingError::Model(message.into())
}
