//! Scheme store: ingestion, indexing and semantic retrieval
//!
//! Each scheme is indexed under its searchable text so conversational
//! questions ("I am a farmer") can match records that share no keywords
//! with them.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{AssistantConfig, StoreBackend};
use crate::errors::StoreError;
use crate::scheme::{self, SchemeRecord};
use crate::server::services::embeddings::{create_embedder, Embedder};
use crate::server::services::json_store::JsonFileDatabase;
use crate::server::services::vector_database::{
  IndexedDocument, VectorDatabase, VectorSearchResult,
};

/// Number of schemes retrieved per chat turn
pub const DEFAULT_RESULTS: usize = 3;

/// Outcome of a successful load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadReport {
  /// Records in the submitted batch
  pub submitted: usize,
  /// Distinct ids written
  pub indexed: usize,
  /// Documents in the store afterwards
  pub total: usize,
}

pub struct SchemeStore {
  database: Arc<dyn VectorDatabase>,
  embedder: Arc<dyn Embedder>,
}

impl SchemeStore {
  pub fn new(database: Arc<dyn VectorDatabase>, embedder: Arc<dyn Embedder>) -> Self {
    Self { database, embedder }
  }

  /// Open the configured vector database and embedder
  pub async fn from_config(config: &AssistantConfig) -> Result<Self, StoreError> {
    let embedder = create_embedder(&config.embedding).await?;
    let database = open_database(config).await?;
    Ok(Self::new(database, embedder))
  }

  /// Validate, embed and upsert a batch of schemes.
  ///
  /// Every record is checked before anything is written, so a single bad
  /// record aborts the whole batch. Repeated ids keep the last occurrence.
  pub async fn load(&self, records: Vec<SchemeRecord>) -> Result<LoadReport, StoreError> {
    let submitted = records.len();
    let documents = self.index(records).await?;
    if documents.is_empty() {
      return Ok(LoadReport { submitted, indexed: 0, total: self.database.count().await? });
    }

    self.database.upsert(&documents).await?;
    let total = self.database.count().await?;
    bentley::verbose!("Indexed {} schemes ({total} total)", documents.len());
    Ok(LoadReport { submitted, indexed: documents.len(), total })
  }

  /// Make `records` the entire contents of the store.
  ///
  /// Validation and embedding finish for the whole batch before the stored
  /// collection is touched, so a failure leaves the previous index intact.
  pub async fn replace(&self, records: Vec<SchemeRecord>) -> Result<LoadReport, StoreError> {
    let submitted = records.len();
    let documents = self.index(records).await?;

    self.database.replace_all(&documents).await?;
    let total = self.database.count().await?;
    bentley::verbose!("Replaced store contents with {} schemes", documents.len());
    Ok(LoadReport { submitted, indexed: documents.len(), total })
  }

  /// The `k` schemes most relevant to `query`, most similar first
  pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SchemeRecord>, StoreError> {
    Ok(self.search_scored(query, k).await?.into_iter().map(|result| result.record).collect())
  }

  /// Like [`SchemeStore::search`] but keeps the similarity scores
  pub async fn search_scored(
    &self,
    query: &str,
    k: usize,
  ) -> Result<Vec<VectorSearchResult>, StoreError> {
    if k == 0 {
      return Ok(Vec::new());
    }
    let embedding = self.embedder.embed(query).await?;
    let mut results = self.database.search_similar(&embedding, k).await?;
    results.truncate(k);
    Ok(results)
  }

  /// Every indexed scheme
  pub async fn list_all(&self) -> Result<Vec<SchemeRecord>, StoreError> {
    self.database.all().await
  }

  pub async fn count(&self) -> Result<usize, StoreError> {
    self.database.count().await
  }

  /// Validated, deduplicated and embedded documents for a batch
  async fn index(&self, records: Vec<SchemeRecord>) -> Result<Vec<IndexedDocument>, StoreError> {
    for (index, record) in records.iter().enumerate() {
      scheme::validate(record, index)?;
    }

    let records = dedupe_last_wins(records);
    let mut documents = Vec::with_capacity(records.len());
    for record in records {
      let text = record.searchable_text();
      let embedding = self.embedder.embed(&text).await?;
      documents.push(IndexedDocument { record, text, embedding });
    }
    Ok(documents)
  }
}

/// Keep one record per id: first position, last value
fn dedupe_last_wins(records: Vec<SchemeRecord>) -> Vec<SchemeRecord> {
  let mut positions: HashMap<String, usize> = HashMap::new();
  let mut unique: Vec<SchemeRecord> = Vec::with_capacity(records.len());
  for record in records {
    match positions.get(&record.id) {
      Some(&position) => unique[position] = record,
      None => {
        positions.insert(record.id.clone(), unique.len());
        unique.push(record);
      }
    }
  }
  unique
}

async fn open_database(config: &AssistantConfig) -> Result<Arc<dyn VectorDatabase>, StoreError> {
  match config.store.backend {
    StoreBackend::Json => {
      let database = JsonFileDatabase::new(&config.store.data_dir, &config.store.collection)?;
      bentley::verbose!("Using JSON store at {}", database.path().display());
      Ok(Arc::new(database))
    }
    StoreBackend::Lancedb => open_lancedb(config).await,
  }
}

#[cfg(feature = "ml-features")]
async fn open_lancedb(config: &AssistantConfig) -> Result<Arc<dyn VectorDatabase>, StoreError> {
  use crate::server::services::lancedb::LanceDbVectorDatabase;

  let database =
    LanceDbVectorDatabase::new(&config.store.data_dir.join("lancedb"), &config.store.collection)
      .await?;
  Ok(Arc::new(database))
}

#[cfg(not(feature = "ml-features"))]
async fn open_lancedb(_config: &AssistantConfig) -> Result<Arc<dyn VectorDatabase>, StoreError> {
  Err(StoreError::unavailable("LanceDB support requires building with the ml-features feature"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::errors::{EmbeddingError, IngestionError};
  use crate::scheme::fixtures::{pm_kisan, scheme};
  use crate::server::services::embeddings::{HashingEmbedder, MockEmbedder, OllamaEmbedder};
  use crate::server::services::vector_database::MockVectorDatabase;
  use tempfile::TempDir;

  fn json_store() -> (TempDir, SchemeStore) {
    let temp_dir = TempDir::new().unwrap();
    let database = JsonFileDatabase::new(temp_dir.path(), "government_schemes").unwrap();
    let store = SchemeStore::new(Arc::new(database), Arc::new(HashingEmbedder::new(256)));
    (temp_dir, store)
  }

  fn sample_schemes() -> Vec<SchemeRecord> {
    vec![
      pm_kisan(),
      scheme("pmay", "PMAY", "urban households without a pucca house"),
      scheme("ayushman", "Ayushman Bharat", "poor and vulnerable families needing hospital care"),
      scheme("mudra", "MUDRA", "small business owners needing loans"),
    ]
  }

  #[tokio::test]
  async fn test_load_then_list_returns_same_ids() {
    for n in [0usize, 1, 4] {
      let (_temp_dir, store) = json_store();
      let records: Vec<_> = sample_schemes().into_iter().take(n).collect();
      let report = store.load(records.clone()).await.unwrap();
      assert_eq!(report, LoadReport { submitted: n, indexed: n, total: n });

      let mut listed: Vec<_> = store.list_all().await.unwrap().into_iter().map(|r| r.id).collect();
      let mut expected: Vec<_> = records.into_iter().map(|r| r.id).collect();
      listed.sort();
      expected.sort();
      assert_eq!(listed, expected);
    }
  }

  #[tokio::test]
  async fn test_reload_replaces_instead_of_duplicating() {
    let (_temp_dir, store) = json_store();
    store.load(vec![pm_kisan()]).await.unwrap();

    let mut updated = pm_kisan();
    updated.benefits = "Rs 9000 per year".to_string();
    let report = store.load(vec![updated.clone()]).await.unwrap();

    assert_eq!(report.total, 1);
    assert_eq!(store.list_all().await.unwrap(), vec![updated]);
  }

  #[tokio::test]
  async fn test_duplicate_ids_in_one_batch_keep_last() {
    let (_temp_dir, store) = json_store();
    let mut second = pm_kisan();
    second.name = "PM-KISAN (revised)".to_string();
    let report = store.load(vec![pm_kisan(), scheme("pmay", "PMAY", "x"), second]).await.unwrap();

    assert_eq!(report, LoadReport { submitted: 3, indexed: 2, total: 2 });
    let listed = store.list_all().await.unwrap();
    assert_eq!(listed[0].name, "PM-KISAN (revised)");
  }

  #[tokio::test]
  async fn test_invalid_record_aborts_whole_batch() {
    let (_temp_dir, store) = json_store();
    let mut broken = scheme("broken", "Broken", "anyone");
    broken.website = "   ".to_string();

    let error = store.load(vec![pm_kisan(), broken]).await.unwrap_err();
    assert!(matches!(
      error,
      StoreError::Ingestion(IngestionError::MissingField { index: 1, field: "website", .. })
    ));
    assert_eq!(store.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_search_bounds() {
    let (_temp_dir, store) = json_store();
    assert!(store.search("farmer", 3).await.unwrap().is_empty());

    store.load(sample_schemes()).await.unwrap();
    assert_eq!(store.search("farmer", 3).await.unwrap().len(), 3);
    assert_eq!(store.search("farmer", 10).await.unwrap().len(), 4);
    assert!(store.search("farmer", 0).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_search_ranks_relevant_scheme_first() {
    let (_temp_dir, store) = json_store();
    store.load(sample_schemes()).await.unwrap();

    let results = store.search("support for small and marginal farmers", 3).await.unwrap();
    assert_eq!(results[0].id, "pmkisan");
  }

  #[tokio::test]
  async fn test_replace_swaps_whole_collection() {
    let (_temp_dir, store) = json_store();
    store.load(sample_schemes()).await.unwrap();

    let report = store.replace(vec![pm_kisan()]).await.unwrap();
    assert_eq!(report, LoadReport { submitted: 1, indexed: 1, total: 1 });
    assert_eq!(store.list_all().await.unwrap(), vec![pm_kisan()]);

    store.replace(Vec::new()).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_replace_with_unreachable_embedder_keeps_existing_index() {
    let (temp_dir, store) = json_store();
    store.load(vec![pm_kisan()]).await.unwrap();

    let database = JsonFileDatabase::new(temp_dir.path(), "government_schemes").unwrap();
    let offline = SchemeStore::new(
      Arc::new(database),
      Arc::new(OllamaEmbedder::new("http://127.0.0.1:9/api/embeddings", "nomic-embed-text")),
    );
    let error = offline.replace(sample_schemes()).await.unwrap_err();

    assert!(matches!(error, StoreError::Embedding(_)));
    assert_eq!(store.list_all().await.unwrap(), vec![pm_kisan()]);
  }

  #[tokio::test]
  async fn test_replace_with_invalid_record_keeps_existing_index() {
    let (_temp_dir, store) = json_store();
    store.load(vec![pm_kisan()]).await.unwrap();
    let mut broken = scheme("broken", "Broken", "anyone");
    broken.name = String::new();

    assert!(store.replace(vec![broken]).await.is_err());
    assert_eq!(store.count().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_zero_k_skips_embedding_and_database() {
    let store = SchemeStore::new(
      Arc::new(MockVectorDatabase::new()),
      Arc::new(MockEmbedder::new()),
    );
    assert!(store.search("anything", 0).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_database_failure_surfaces_as_unavailable() {
    let mut embedder = MockEmbedder::new();
    embedder.expect_embed().returning(|_| Ok(vec![1.0, 0.0]));
    let mut database = MockVectorDatabase::new();
    database
      .expect_search_similar()
      .times(1)
      .returning(|_, _| Err(StoreError::unavailable("connection refused")));

    let store = SchemeStore::new(Arc::new(database), Arc::new(embedder));
    let error = store.search("farmer", 3).await.unwrap_err();
    assert!(matches!(error, StoreError::Unavailable { .. }));
  }

  #[tokio::test]
  async fn test_embedding_failure_writes_nothing() {
    let mut embedder = MockEmbedder::new();
    embedder
      .expect_embed()
      .returning(|_| Err(EmbeddingError::Request("connection refused".to_string())));
    let mut database = MockVectorDatabase::new();
    database.expect_upsert().never();

    let store = SchemeStore::new(Arc::new(database), Arc::new(embedder));
    let error = store.load(vec![pm_kisan()]).await.unwrap_err();
    assert!(matches!(error, StoreError::Embedding(_)));
  }

  #[tokio::test]
  async fn test_embedding_failure_never_replaces() {
    let mut embedder = MockEmbedder::new();
    embedder
      .expect_embed()
      .returning(|_| Err(EmbeddingError::Request("connection refused".to_string())));
    let mut database = MockVectorDatabase::new();
    database.expect_replace_all().never();
    database.expect_clear().never();

    let store = SchemeStore::new(Arc::new(database), Arc::new(embedder));
    assert!(store.replace(vec![pm_kisan()]).await.is_err());
  }

  #[tokio::test]
  async fn test_load_indexes_searchable_text() {
    let mut embedder = MockEmbedder::new();
    embedder
      .expect_embed()
      .withf(|text| text.starts_with("Scheme: PM-KISAN (Pradhan Mantri Kisan Samman Nidhi)"))
      .times(1)
      .returning(|_| Ok(vec![1.0]));
    let mut database = MockVectorDatabase::new();
    database
      .expect_upsert()
      .withf(|documents| {
        documents.len() == 1 && documents[0].text == documents[0].record.searchable_text()
      })
      .times(1)
      .returning(|_| Ok(()));
    database.expect_count().returning(|| Ok(1));

    let store = SchemeStore::new(Arc::new(database), Arc::new(embedder));
    assert_eq!(store.load(vec![pm_kisan()]).await.unwrap().total, 1);
  }

  #[cfg(not(feature = "ml-features"))]
  #[tokio::test]
  async fn test_lancedb_requires_feature() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = AssistantConfig::default();
    config.store.backend = StoreBackend::Lancedb;
    config.store.data_dir = temp_dir.path().to_path_buf();
    assert!(matches!(
      SchemeStore::from_config(&config).await,
      Err(StoreError::Unavailable { .. })
    ));
  }
}
