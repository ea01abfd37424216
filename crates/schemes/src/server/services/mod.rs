pub mod assistant;
pub mod embeddings;
pub mod json_store;
pub mod llm;
pub mod prompt;
pub mod scheme_store;
pub mod vector_database;

#[cfg(feature = "ml-features")]
pub mod lancedb;
