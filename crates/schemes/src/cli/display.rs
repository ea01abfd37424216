//! Display formatting utilities for CLI output

use colored::*;

use crate::scheme::SchemeRecord;

/// Highlight search terms in text, ignoring case
pub fn highlight_keywords(text: &str, terms: &[String]) -> String {
  let mut result = text.to_string();

  let mut sorted = terms.to_vec();
  sorted.sort_by_key(|term| std::cmp::Reverse(term.len()));

  for term in sorted {
    if term.is_empty() {
      continue;
    }

    let term_lower = term.to_lowercase();
    let result_lower = result.to_lowercase();
    // Byte offsets only line up when lowercasing kept the length
    if result_lower.len() != result.len() || term_lower.len() != term.len() {
      continue;
    }

    let mut highlighted = String::new();
    let mut end = 0;
    let mut start = 0;
    while let Some(pos) = result_lower[start..].find(&term_lower) {
      let abs_pos = start + pos;
      highlighted.push_str(&result[end..abs_pos]);
      let match_text = &result[abs_pos..abs_pos + term.len()];
      highlighted.push_str(&match_text.yellow().bold().to_string());
      end = abs_pos + term.len();
      start = end;
    }

    highlighted.push_str(&result[end..]);
    result = highlighted;
  }

  result
}

/// Wrap text to fit within a specified width
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();

  for paragraph in text.split('\n') {
    if paragraph.trim().is_empty() {
      lines.push(String::new());
      continue;
    }

    let mut current_line = String::new();
    for word in paragraph.split_whitespace() {
      if current_line.is_empty() {
        current_line = word.to_string();
      } else if current_line.len() + 1 + word.len() <= width {
        current_line.push(' ');
        current_line.push_str(word);
      } else {
        lines.push(current_line);
        current_line = word.to_string();
      }
    }

    if !current_line.is_empty() {
      lines.push(current_line);
    }
  }

  lines
}

/// Print one ranked search hit
pub fn display_search_result(rank: usize, record: &SchemeRecord, score: f32, terms: &[String]) {
  println!(
    "{} {} {} {}",
    format!("{rank}.").dimmed(),
    highlight_keywords(&record.name, terms).bold(),
    format!("({})", record.full_name).dimmed(),
    format!("[{score:.3}]").cyan()
  );
  println!("   {} {}", "Ministry:".dimmed(), record.ministry);
  for line in wrap_text(&record.eligibility, 76) {
    println!("   {}", highlight_keywords(&line, terms));
  }
  println!("   {}", record.website.blue().underline());
  println!();
}

/// Print one scheme in the administrative listing
pub fn display_scheme_summary(record: &SchemeRecord, verbose: bool) {
  println!("  {} {} {}", "•".green(), record.name.bold(), format!("[{}]", record.id).dimmed());
  if verbose {
    println!("    {}", record.full_name);
    for line in wrap_text(&record.description, 74) {
      println!("    {}", line.dimmed());
    }
  }
}
