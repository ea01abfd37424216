//! Persistent log store for long-running services
//!
//! Entries are appended to a JSONL file so they survive restarts and can be
//! served back over an API. Each write is also echoed to the console through
//! the regular bentley logger unless the store was created silent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

#[cfg(feature = "schemars")]
use schemars::JsonSchema;

use crate::Level;

/// Request context attached to log entries written by HTTP handlers
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct LogContext {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub request_id: Option<String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub method: Option<String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub status_code: Option<u16>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub duration_ms: Option<f64>,
}

/// A single persisted log line
#[derive(Debug, Serialize, Deserialize, Clone)]
#[cfg_attr(feature = "schemars", derive(JsonSchema))]
pub struct LogEntry {
  pub timestamp: DateTime<Utc>,
  pub level: String,
  pub message: String,
  pub component: String,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub context: Option<LogContext>,
}

struct Inner {
  path: PathBuf,
  silent: bool,
}

/// Thread-safe JSONL log store
#[derive(Clone)]
pub struct DaemonLogs {
  inner: Arc<Mutex<Inner>>,
}

impl DaemonLogs {
  /// Open (or create) the log file at `path`
  pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
    Self::new_with_silent(path, false)
  }

  /// Open the log file without echoing entries to the console
  pub fn new_with_silent<P: AsRef<Path>>(path: P, silent: bool) -> std::io::Result<Self> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(&path)?;

    Ok(Self { inner: Arc::new(Mutex::new(Inner { path, silent })) })
  }

  /// Append an entry, returning any I/O error
  pub async fn append(
    &self,
    level: Level,
    message: &str,
    component: &str,
    context: Option<LogContext>,
  ) -> std::io::Result<()> {
    let entry = LogEntry {
      timestamp: Utc::now(),
      level: level.as_str().to_string(),
      message: message.to_string(),
      component: component.to_string(),
      context,
    };
    let line = serde_json::to_string(&entry)
      .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let guard = self.inner.lock().await;
    let mut file = OpenOptions::new().create(true).append(true).open(&guard.path)?;
    writeln!(file, "{line}")?;
    file.flush()?;

    if !guard.silent {
      crate::log(level, message);
    }
    Ok(())
  }

  /// Append an entry, ignoring I/O errors
  pub async fn log(&self, level: Level, message: &str, component: &str) {
    let _ = self.append(level, message, component, None).await;
  }

  /// Append an entry with request context, ignoring I/O errors
  pub async fn log_with_context(
    &self,
    level: Level,
    message: &str,
    component: &str,
    context: LogContext,
  ) {
    let _ = self.append(level, message, component, Some(context)).await;
  }

  pub async fn info(&self, message: &str, component: &str) {
    self.log(Level::Info, message, component).await;
  }

  pub async fn success(&self, message: &str, component: &str) {
    self.log(Level::Success, message, component).await;
  }

  pub async fn warn(&self, message: &str, component: &str) {
    self.log(Level::Warn, message, component).await;
  }

  pub async fn error(&self, message: &str, component: &str) {
    self.log(Level::Error, message, component).await;
  }

  /// Read back the most recent entries, oldest first.
  ///
  /// `level_filter` of `None` or `"all"` keeps every entry. Malformed lines
  /// are skipped.
  pub async fn get_logs(
    &self,
    limit: Option<usize>,
    level_filter: Option<&str>,
  ) -> std::io::Result<Vec<LogEntry>> {
    let guard = self.inner.lock().await;
    let file = match std::fs::File::open(&guard.path) {
      Ok(file) => file,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(e),
    };

    let mut logs = Vec::new();
    for line in BufReader::new(file).lines() {
      let line = line?;
      if line.trim().is_empty() {
        continue;
      }
      let Ok(entry) = serde_json::from_str::<LogEntry>(&line) else {
        continue;
      };
      if level_filter.is_none_or(|filter| filter == "all" || entry.level == filter) {
        logs.push(entry);
      }
    }

    logs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    if let Some(limit) = limit {
      let skip = logs.len().saturating_sub(limit);
      logs.drain(..skip);
    }
    Ok(logs)
  }

  /// Path of the backing JSONL file
  pub async fn log_file_path(&self) -> PathBuf {
    self.inner.lock().await.path.clone()
  }
}
