//! End-to-end pipeline tests against a stubbed local LLM

use mockito::Matcher;
use schemes::config::{AssistantConfig, EmbedderKind, StoreBackend};
use schemes::scheme::{parse_dataset, SchemeRecord};
use schemes::server::services::assistant::{Reply, SchemeAssistant};
use schemes::server::services::scheme_store::SchemeStore;
use serde_json::json;
use tempfile::TempDir;

const DATASET: &str = r#"[
  {
    "id": "pmkisan",
    "name": "PM-KISAN",
    "full_name": "Pradhan Mantri Kisan Samman Nidhi",
    "ministry": "Ministry of Agriculture and Farmers Welfare",
    "description": "Income support of Rs 6000 per year to farmer families",
    "eligibility": "Small and marginal farmers with cultivable land",
    "benefits": "Rs 6000 per year in three instalments",
    "documents_required": "Aadhaar, land records, bank account",
    "how_to_apply": "Register on the PM-KISAN portal or at a Common Service Centre",
    "website": "https://pmkisan.gov.in"
  },
  {
    "id": "pmay",
    "name": "PMAY",
    "full_name": "Pradhan Mantri Awas Yojana",
    "ministry": "Ministry of Housing and Urban Affairs",
    "description": "Affordable housing for the urban poor",
    "eligibility": "Urban households without a pucca house",
    "benefits": "Interest subsidy on home loans",
    "documents_required": "Aadhaar, income certificate",
    "how_to_apply": "Apply through the PMAY portal",
    "website": "https://pmaymis.gov.in"
  },
  {
    "id": "nsp",
    "name": "NSP",
    "full_name": "National Scholarship Portal",
    "ministry": "Ministry of Electronics and IT",
    "description": "Single window for central and state scholarships",
    "eligibility": "Students from minority communities and economically weaker sections",
    "benefits": "Tuition fee and maintenance allowance",
    "documents_required": "Marksheets, income certificate, bank account",
    "how_to_apply": "Register on scholarships.gov.in",
    "website": "https://scholarships.gov.in"
  },
  {
    "id": "mudra",
    "name": "MUDRA",
    "full_name": "Pradhan Mantri Mudra Yojana",
    "ministry": "Ministry of Finance",
    "description": "Collateral-free loans for micro enterprises",
    "eligibility": "Small business owners and self-employed individuals",
    "benefits": "Loans up to Rs 10 lakh",
    "documents_required": "Business plan, identity proof",
    "how_to_apply": "Apply at any bank branch",
    "website": "https://www.mudra.org.in"
  }
]"#;

/// Default configuration pointed at a temporary data dir and a stubbed LLM
fn default_config_for(temp_dir: &TempDir, llm_url: String) -> AssistantConfig {
  let mut config = AssistantConfig::default();
  config.store.data_dir = temp_dir.path().to_path_buf();
  config.llm.local.url = llm_url;
  config.llm.timeout_secs = Some(10);
  config
}

/// JSON store with the hashing embedder, so no model has to be downloaded
fn config_for(temp_dir: &TempDir, llm_url: String) -> AssistantConfig {
  let mut config = default_config_for(temp_dir, llm_url);
  config.store.backend = StoreBackend::Json;
  config.embedding.provider = EmbedderKind::Hashing;
  config
}

fn dataset() -> Vec<SchemeRecord> {
  parse_dataset(DATASET).unwrap()
}

#[tokio::test]
async fn test_farmer_question_reaches_llm_with_pm_kisan_context() {
  let temp_dir = TempDir::new().unwrap();
  let mut server = mockito::Server::new_async().await;
  let mock = server
    .mock("POST", "/api/generate")
    .match_body(Matcher::AllOf(vec![
      Matcher::PartialJson(json!({"model": "llama3.2", "stream": false})),
      Matcher::Regex("Scheme: PM-KISAN".to_string()),
      Matcher::Regex(r"Website: https://pmkisan\.gov\.in".to_string()),
      Matcher::Regex("User Question: I am a small farmer, what schemes can I get".to_string()),
    ]))
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(r#"{"response": "You may be eligible for PM-KISAN. Apply at https://pmkisan.gov.in"}"#)
    .expect(1)
    .create_async()
    .await;

  let config = config_for(&temp_dir, format!("{}/api/generate", server.url()));
  let assistant = SchemeAssistant::from_config(&config).await.unwrap();
  assistant.store().load(dataset()).await.unwrap();

  let reply = assistant.respond("I am a small farmer, what schemes can I get?").await.unwrap();
  assert_eq!(
    reply,
    Reply::Answer("You may be eligible for PM-KISAN. Apply at https://pmkisan.gov.in".to_string())
  );
  mock.assert_async().await;
}

#[tokio::test]
async fn test_backend_error_is_one_attempt_and_marked() {
  let temp_dir = TempDir::new().unwrap();
  let mut server = mockito::Server::new_async().await;
  let mock = server
    .mock("POST", "/api/generate")
    .with_status(500)
    .with_body("model not loaded")
    .expect(1)
    .create_async()
    .await;

  let config = config_for(&temp_dir, format!("{}/api/generate", server.url()));
  let assistant = SchemeAssistant::from_config(&config).await.unwrap();
  assistant.store().load(dataset()).await.unwrap();

  let reply = assistant.respond("housing help").await.unwrap();
  assert!(reply.is_failure());
  assert!(reply.text().starts_with("Error connecting to Ollama"));
  assert!(reply.text().contains("500"));
  mock.assert_async().await;
}

#[tokio::test]
async fn test_index_survives_reopening() {
  let temp_dir = TempDir::new().unwrap();
  let config = config_for(&temp_dir, "http://127.0.0.1:9/api/generate".to_string());

  let store = SchemeStore::from_config(&config).await.unwrap();
  store.load(dataset()).await.unwrap();
  drop(store);

  let reopened = SchemeStore::from_config(&config).await.unwrap();
  assert_eq!(reopened.count().await.unwrap(), 4);
  let top = reopened.search("scholarship for students", 1).await.unwrap();
  assert_eq!(top.len(), 1);
  assert_eq!(top[0].id, "nsp");
}

#[tokio::test]
async fn test_load_list_round_trip_for_various_sizes() {
  for size in [0usize, 1, 4] {
    let temp_dir = TempDir::new().unwrap();
    let config = config_for(&temp_dir, "http://127.0.0.1:9/api/generate".to_string());
    let store = SchemeStore::from_config(&config).await.unwrap();

    let records: Vec<SchemeRecord> = dataset().into_iter().take(size).collect();
    let report = store.load(records.clone()).await.unwrap();
    assert_eq!(report.total, size);

    let mut listed: Vec<String> = store.list_all().await.unwrap().into_iter().map(|r| r.id).collect();
    let mut expected: Vec<String> = records.into_iter().map(|r| r.id).collect();
    listed.sort();
    expected.sort();
    assert_eq!(listed, expected);
  }
}

#[tokio::test]
async fn test_reingest_replaces_and_search_is_bounded() {
  let temp_dir = TempDir::new().unwrap();
  let config = config_for(&temp_dir, "http://127.0.0.1:9/api/generate".to_string());
  let store = SchemeStore::from_config(&config).await.unwrap();

  assert!(store.search("anything", 3).await.unwrap().is_empty());

  store.load(dataset()).await.unwrap();
  let mut updated = dataset().remove(0);
  updated.benefits = "Rs 9000 per year".to_string();
  store.load(vec![updated]).await.unwrap();

  let all = store.list_all().await.unwrap();
  assert_eq!(all.len(), 4);
  let kisan = all.iter().find(|r| r.id == "pmkisan").unwrap();
  assert_eq!(kisan.benefits, "Rs 9000 per year");

  for k in [0usize, 1, 3, 10] {
    assert!(store.search("farmer", k).await.unwrap().len() <= k);
  }
  assert_eq!(store.search("farmer", 10).await.unwrap().len(), 4);
}

#[cfg(feature = "ml-features")]
#[tokio::test]
async fn test_farmer_financial_help_answers_from_pm_kisan() {
  let query = "I am a farmer looking for financial help";
  let temp_dir = TempDir::new().unwrap();
  let mut server = mockito::Server::new_async().await;
  let mock = server
    .mock("POST", "/api/generate")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body_from_request(|request| {
      let body: serde_json::Value = serde_json::from_slice(request.body().unwrap()).unwrap();
      serde_json::to_vec(&json!({"response": body["prompt"]})).unwrap()
    })
    .expect(1)
    .create_async()
    .await;

  let mut config = default_config_for(&temp_dir, format!("{}/api/generate", server.url()));
  config.chat.results = 1;
  let assistant = SchemeAssistant::from_config(&config).await.unwrap();
  assistant.store().load(dataset()).await.unwrap();

  let top = assistant.store().search(query, 1).await.unwrap();
  assert_eq!(top.len(), 1);
  assert_eq!(top[0].id, "pmkisan");

  let reply = assistant.respond(query).await.unwrap();
  assert!(!reply.is_failure());
  let text = reply.text();
  assert!(text.contains("PM-KISAN"));
  assert!(text.contains(&format!("User Question: {query}")));
  assert!(!text.contains("Scheme: MUDRA"));
  mock.assert_async().await;
}
