use anyhow::Result;
use clap::{Parser, Subcommand};
use schemes::cli::commands;
use schemes::config::AssistantConfig;
use schemes::server::services::scheme_store::DEFAULT_RESULTS;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "schemes")]
#[command(
  about = "Schemes - Government Scheme Assistant\nFind welfare schemes you may be eligible for and ask questions about them"
)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
  /// Configuration file (defaults to schemes.yaml or .schemes/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Ingest a JSON dataset of schemes
  Load {
    /// Path to the dataset (a JSON array of scheme records)
    file: PathBuf,
    /// Remove every indexed scheme before loading
    #[arg(long)]
    replace: bool,
  },
  /// Find the schemes closest to a query
  Search {
    /// Maximum number of results
    #[arg(short, default_value_t = DEFAULT_RESULTS)]
    k: usize,
    /// Search terms (space-separated)
    #[arg(required = true)]
    terms: Vec<String>,
  },
  /// Ask a single question
  Ask {
    /// The question (space-separated)
    #[arg(required = true)]
    message: Vec<String>,
  },
  /// Start an interactive chat session
  Chat,
  /// List every indexed scheme
  List {
    /// Show full names and descriptions
    #[arg(short, long)]
    verbose: bool,
  },
}

async fn handle(command: Command, config: &AssistantConfig) -> Result<()> {
  match command {
    Command::Load { file, replace } => commands::load(config, &file, replace).await,
    Command::Search { k, terms } => commands::search(config, &terms, k).await,
    Command::Ask { message } => commands::ask(config, &message.join(" ")).await,
    Command::Chat => commands::chat(config).await,
    Command::List { verbose } => commands::list(config, verbose).await,
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  dotenvy::dotenv().ok();
  let cli = Cli::parse();

  let config = AssistantConfig::load(cli.config.as_deref())?;
  handle(cli.command, &config).await
}
