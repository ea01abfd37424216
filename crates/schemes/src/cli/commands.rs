//! CLI command implementations
//!
//! Each command opens the pipeline pieces it needs straight from the
//! configuration. No server is involved.

use anyhow::{anyhow, Result};
use colored::*;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::display::{display_scheme_summary, display_search_result};
use crate::config::AssistantConfig;
use crate::errors::ChatError;
use crate::scheme::read_dataset;
use crate::server::services::assistant::{Reply, SchemeAssistant};
use crate::server::services::scheme_store::SchemeStore;

/// Words that end an interactive chat session
pub const EXIT_WORDS: [&str; 3] = ["quit", "exit", "bye"];

/// Ingest a dataset file into the store
///
/// With `replace` the file becomes the whole index; otherwise its records
/// are merged in by id.
pub async fn load(config: &AssistantConfig, file: &Path, replace: bool) -> Result<()> {
  let records = read_dataset(file)?;
  let store = SchemeStore::from_config(config).await?;

  let report = if replace { store.replace(records).await? } else { store.load(records).await? };
  println!(
    "{} Indexed {} schemes from {} ({} in store)",
    "✓".green(),
    report.indexed.to_string().cyan(),
    file.display().to_string().yellow(),
    report.total
  );
  if report.indexed < report.submitted {
    bentley::warn!(
      "{} duplicate ids collapsed (last record wins)",
      report.submitted - report.indexed
    );
  }
  Ok(())
}

/// Print the schemes nearest to the search terms
pub async fn search(config: &AssistantConfig, terms: &[String], k: usize) -> Result<()> {
  let query = terms.join(" ");
  if query.trim().is_empty() {
    return Err(anyhow!("Search terms cannot be empty"));
  }

  let store = SchemeStore::from_config(config).await?;
  let results = store.search_scored(&query, k).await?;

  if results.is_empty() {
    println!("No schemes found for: {}", query.yellow());
    return Ok(());
  }

  println!("{} {} results for {}\n", "🔍".cyan(), results.len(), query.bold());
  for (index, result) in results.iter().enumerate() {
    display_search_result(index + 1, &result.record, result.similarity, terms);
  }
  Ok(())
}

/// One turn through the full pipeline
pub async fn ask(config: &AssistantConfig, message: &str) -> Result<()> {
  let assistant = SchemeAssistant::from_config(config).await?;
  let reply = assistant.respond(message).await?;
  print_reply(&reply);

  if reply.is_failure() {
    return Err(anyhow!("{} backend did not answer", assistant.backend_name()));
  }
  Ok(())
}

/// Interactive chat loop over stdin
pub async fn chat(config: &AssistantConfig) -> Result<()> {
  let assistant = SchemeAssistant::from_config(config).await?;
  let total = assistant.store().count().await?;

  println!("{}", "Government Scheme Assistant".bold());
  println!(
    "{} schemes indexed, answering with {}. Type {} to leave.\n",
    total,
    assistant.backend_name().cyan(),
    EXIT_WORDS.join("/").yellow()
  );

  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  loop {
    print!("{} ", "You:".green().bold());
    std::io::stdout().flush()?;

    let Some(line) = lines.next_line().await? else {
      println!();
      break;
    };
    if is_exit_word(&line) {
      println!("Goodbye!");
      break;
    }

    match assistant.respond(&line).await {
      Ok(reply) => print_reply(&reply),
      Err(ChatError::EmptyMessage) => continue,
      Err(e) => bentley::error!("{e}"),
    }
    println!();
  }
  Ok(())
}

/// Administrative listing of every indexed scheme
pub async fn list(config: &AssistantConfig, verbose: bool) -> Result<()> {
  let store = SchemeStore::from_config(config).await?;
  let mut schemes = store.list_all().await?;

  if schemes.is_empty() {
    println!("No schemes indexed. Load a dataset with `schemes load <file>`.");
    return Ok(());
  }

  schemes.sort_by(|a, b| a.name.cmp(&b.name));
  println!("{} {} schemes", "📂".cyan(), schemes.len().to_string().bold());
  for scheme in &schemes {
    display_scheme_summary(scheme, verbose);
  }
  Ok(())
}

fn print_reply(reply: &Reply) {
  match reply {
    Reply::Answer(text) => println!("{} {text}", "Assistant:".blue().bold()),
    Reply::BackendFailure(_) => println!("{} {}", "Assistant:".blue().bold(), reply.text().red()),
  }
}

/// Whether a chat line should end the session
pub fn is_exit_word(line: &str) -> bool {
  let word = line.trim().to_lowercase();
  EXIT_WORDS.contains(&word.as_str())
}
