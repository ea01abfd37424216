//! JSON file implementation of the VectorDatabase trait
//!
//! Opt-in with `store.backend: json`. The whole collection lives in
//! `<data_dir>/<collection>.json`. Every write goes to a uniquely named
//! temporary file in the same directory that is then persisted over the old
//! one, so readers never see a half-written index. Search is a brute-force
//! cosine scan.
//!
//! Writes are serialized within one process only. Two processes loading into
//! the same collection at once each persist their own read-modify-write
//! result, and the last one to finish wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

use crate::errors::StoreError;
use crate::scheme::SchemeRecord;
use crate::server::services::vector_database::{
  cosine_similarity, IndexedDocument, VectorDatabase, VectorSearchResult,
};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
  version: u32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  updated_at: Option<DateTime<Utc>>,
  documents: Vec<IndexedDocument>,
}

/// File-backed vector database
pub struct JsonFileDatabase {
  path: PathBuf,
  write_lock: Mutex<()>,
}

impl JsonFileDatabase {
  /// Open the collection file, creating the data directory if needed
  pub fn new(data_dir: &Path, collection: &str) -> Result<Self, StoreError> {
    std::fs::create_dir_all(data_dir).map_err(|e| {
      StoreError::unavailable(format!("cannot create data directory {}: {e}", data_dir.display()))
    })?;
    Ok(Self { path: data_dir.join(format!("{collection}.json")), write_lock: Mutex::new(()) })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  async fn read(&self) -> Result<Collection, StoreError> {
    let content = match tokio::fs::read_to_string(&self.path).await {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Collection::default()),
      Err(e) => {
        return Err(StoreError::unavailable(format!("cannot read {}: {e}", self.path.display())))
      }
    };

    let collection: Collection = serde_json::from_str(&content)
      .map_err(|e| StoreError::corrupt(format!("{}: {e}", self.path.display())))?;
    if collection.version != FORMAT_VERSION {
      return Err(StoreError::corrupt(format!(
        "{} has format version {}, expected {FORMAT_VERSION}",
        self.path.display(),
        collection.version
      )));
    }
    Ok(collection)
  }

  async fn write(&self, documents: Vec<IndexedDocument>) -> Result<(), StoreError> {
    let collection = Collection { version: FORMAT_VERSION, updated_at: Some(Utc::now()), documents };
    let content = serde_json::to_vec(&collection)
      .map_err(|e| StoreError::unavailable(format!("cannot serialize index: {e}")))?;

    let path = self.path.clone();
    tokio::task::spawn_blocking(move || persist(&path, &content))
      .await
      .map_err(|e| StoreError::unavailable(format!("index write task failed: {e}")))?
  }
}

fn persist(path: &Path, content: &[u8]) -> Result<(), StoreError> {
  let unavailable =
    |e: std::io::Error| StoreError::unavailable(format!("cannot write {}: {e}", path.display()));
  let dir = path.parent().unwrap_or_else(|| Path::new("."));

  let mut file = NamedTempFile::new_in(dir).map_err(unavailable)?;
  file.write_all(content).map_err(unavailable)?;
  file.as_file().sync_all().map_err(unavailable)?;
  file.persist(path).map_err(|e| unavailable(e.error))?;
  Ok(())
}

#[async_trait]
impl VectorDatabase for JsonFileDatabase {
  async fn upsert(&self, documents: &[IndexedDocument]) -> Result<(), StoreError> {
    let _guard = self.write_lock.lock().await;
    let mut stored = self.read().await?.documents;

    for document in documents {
      match stored.iter_mut().find(|existing| existing.id() == document.id()) {
        Some(existing) => *existing = document.clone(),
        None => stored.push(document.clone()),
      }
    }

    self.write(stored).await?;
    bentley::verbose!("Wrote {} documents to {}", documents.len(), self.path.display());
    Ok(())
  }

  async fn replace_all(&self, documents: &[IndexedDocument]) -> Result<(), StoreError> {
    let _guard = self.write_lock.lock().await;
    self.write(documents.to_vec()).await?;
    bentley::verbose!("Replaced {} with {} documents", self.path.display(), documents.len());
    Ok(())
  }

  async fn search_similar(
    &self,
    query_embedding: &[f32],
    limit: usize,
  ) -> Result<Vec<VectorSearchResult>, StoreError> {
    let documents = self.read().await?.documents;
    if let Some(document) = documents.iter().find(|d| d.embedding.len() != query_embedding.len()) {
      return Err(StoreError::corrupt(format!(
        "stored embedding for '{}' has {} dimensions but the query has {}; reload the dataset",
        document.id(),
        document.embedding.len(),
        query_embedding.len()
      )));
    }

    let mut results: Vec<VectorSearchResult> = documents
      .into_iter()
      .map(|document| VectorSearchResult {
        similarity: cosine_similarity(query_embedding, &document.embedding),
        record: document.record,
      })
      .collect();
    results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    results.truncate(limit);
    Ok(results)
  }

  async fn all(&self) -> Result<Vec<SchemeRecord>, StoreError> {
    Ok(self.read().await?.documents.into_iter().map(|document| document.record).collect())
  }

  async fn count(&self) -> Result<usize, StoreError> {
    Ok(self.read().await?.documents.len())
  }

  async fn clear(&self) -> Result<(), StoreError> {
    let _guard = self.write_lock.lock().await;
    self.write(Vec::new()).await
  }
}
