//! Bentley - console logging for the schemes workspace
//!
//! All output goes to stderr with a colored, fixed-width level prefix so it
//! never mixes with command output on stdout. Multi-line messages keep the
//! prefix on every line.
//!
//! The macros accept `format!` arguments:
//!
//! ```ignore
//! bentley::info!("loaded {} schemes", count);
//! bentley::verbose!("embedding dimension: {dimension}");
//! ```

use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "daemon-logs")]
pub mod daemon_logs;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Log severity understood by the console logger and the daemon log store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
  Verbose,
  Debug,
  Info,
  Success,
  Warn,
  Error,
}

impl Level {
  /// Short label printed inside the prefix brackets
  pub fn label(self) -> &'static str {
    match self {
      Level::Verbose => "verb",
      Level::Debug => "debug",
      Level::Info => "info",
      Level::Success => "sccs",
      Level::Warn => "warn",
      Level::Error => "error",
    }
  }

  /// Name used when the level is persisted
  pub fn as_str(self) -> &'static str {
    match self {
      Level::Verbose => "verbose",
      Level::Debug => "debug",
      Level::Info => "info",
      Level::Success => "success",
      Level::Warn => "warn",
      Level::Error => "error",
    }
  }

  fn color(self) -> Color {
    match self {
      Level::Verbose => Color::Cyan,
      Level::Debug => Color::Magenta,
      Level::Info => Color::Blue,
      Level::Success => Color::Green,
      Level::Warn => Color::Yellow,
      Level::Error => Color::Red,
    }
  }
}

impl std::str::FromStr for Level {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "verbose" | "verb" => Ok(Level::Verbose),
      "debug" => Ok(Level::Debug),
      "info" => Ok(Level::Info),
      "success" | "sccs" => Ok(Level::Success),
      "warn" | "warning" => Ok(Level::Warn),
      "error" => Ok(Level::Error),
      other => Err(format!("unknown log level '{other}'")),
    }
  }
}

/// Enable or disable verbose/debug output
pub fn set_verbose(enabled: bool) {
  VERBOSE.store(enabled, Ordering::Relaxed);
}

/// Whether verbose output is enabled, either explicitly or via `BENTLEY_VERBOSE`
pub fn is_verbose() -> bool {
  VERBOSE.load(Ordering::Relaxed) || std::env::var("BENTLEY_VERBOSE").is_ok_and(|v| v != "0")
}

/// Whether a message at `level` would be printed right now
pub fn enabled(level: Level) -> bool {
  match level {
    Level::Verbose | Level::Debug => is_verbose(),
    _ => true,
  }
}

/// Build the prefixed lines for a message without printing them
pub fn format_lines(level: Level, message: &str) -> Vec<String> {
  let label = level.label();
  let pad = 7usize.saturating_sub(label.len() + 2);
  let prefix = format!("[{}]{:<pad$}", label.color(level.color()).bold(), "");
  message.lines().map(|line| format!("{prefix} {line}")).collect()
}

/// Print a message at the given level
pub fn log(level: Level, message: &str) {
  if !enabled(level) {
    return;
  }
  for line in format_lines(level, message) {
    eprintln!("{line}");
  }
}

pub fn verbose(message: &str) {
  log(Level::Verbose, message);
}

pub fn debug(message: &str) {
  log(Level::Debug, message);
}

pub fn info(message: &str) {
  log(Level::Info, message);
}

pub fn success(message: &str) {
  log(Level::Success, message);
}

pub fn warn(message: &str) {
  log(Level::Warn, message);
}

pub fn error(message: &str) {
  log(Level::Error, message);
}

/// Macros for coverage-excluded logging - these expand with LCOV_EXCL_LINE at call sites
#[macro_export]
macro_rules! info {
  ($($arg:tt)+) => {
    $crate::info(&format!($($arg)+)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! warn {
  ($($arg:tt)+) => {
    $crate::warn(&format!($($arg)+)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! error {
  ($($arg:tt)+) => {
    $crate::error(&format!($($arg)+)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! verbose {
  ($($arg:tt)+) => {
    $crate::verbose(&format!($($arg)+)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! debug {
  ($($arg:tt)+) => {
    $crate::debug(&format!($($arg)+)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! success {
  ($($arg:tt)+) => {
    $crate::success(&format!($($arg)+)) // LCOV_EXCL_LINE
  };
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_level_round_trips_through_str() {
    for level in [Level::Verbose, Level::Debug, Level::Info, Level::Success, Level::Warn, Level::Error]
    {
      assert_eq!(level.as_str().parse::<Level>().unwrap(), level);
    }
    assert!("loud".parse::<Level>().is_err());
  }

  #[test]
  fn test_format_lines_prefixes_every_line() {
    colored::control::set_override(false);
    let lines = format_lines(Level::Warn, "first\nsecond");
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("[warn]"));
    assert!(lines[0].ends_with("first"));
    assert!(lines[1].starts_with("[warn]"));
    assert!(lines[1].ends_with("second"));
  }

  #[test]
  fn test_prefix_width_is_aligned() {
    colored::control::set_override(false);
    let info = &format_lines(Level::Info, "x")[0];
    let error = &format_lines(Level::Error, "x")[0];
    assert_eq!(info.find('x'), Some(8));
    assert_eq!(error.find('x'), Some(8));
  }
}
