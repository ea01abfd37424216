//! Schemes REST Server
//!
//! HTTP API over the scheme assistant: chat, scheme listing and search,
//! health and server logs.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use schemes::config::AssistantConfig;
use schemes::server::services::assistant::SchemeAssistant;
use schemes::server::startup::start_server;

#[derive(Parser)]
#[command(name = "schemes_server")]
#[command(about = "Government Scheme Assistant REST API Server")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
  /// Server bind address (overrides the configured one)
  #[arg(long)]
  bind: Option<SocketAddr>,

  /// Configuration file
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  dotenvy::dotenv().ok();
  let args = Args::parse();

  // Keep Lance and DataFusion quiet unless asked
  let filter = if args.verbose {
    EnvFilter::new("info,lance=warn,lance_datafusion=warn,datafusion=warn")
  } else {
    EnvFilter::new("schemes=info,lance=error,lance_datafusion=error,datafusion=error,warn")
  };
  tracing_subscriber::registry().with(fmt::layer()).with(filter).init();
  bentley::set_verbose(args.verbose);

  let config = AssistantConfig::load(args.config.as_deref())?;
  let bind = match args.bind {
    Some(bind) => bind,
    None => config.bind_addr()?,
  };

  bentley::info!("Starting Government Scheme Assistant v{}", env!("CARGO_PKG_VERSION"));
  bentley::info!("Binding to address: {bind}");

  let assistant = Arc::new(SchemeAssistant::from_config(&config).await?);
  let total = assistant.store().count().await?;
  if total == 0 {
    bentley::warn!("No schemes indexed yet. Run `schemes load <file>` first.");
  } else {
    bentley::success!("{total} schemes indexed");
  }

  start_server(bind, assistant).await
}
