//! Prompt composition for the scheme assistant

use crate::scheme::SchemeRecord;

/// Stand-in for blank record fields
pub const MISSING_FIELD: &str = "Not specified";

/// Rendered in place of scheme blocks when retrieval found nothing
pub const NO_SCHEMES_FOUND: &str = "No matching schemes were found.";

const SYSTEM_PROMPT: &str = "You are a helpful government scheme assistant for India. \
Your job is to help people find and understand government schemes they're eligible for. \
Be friendly, clear, and concise. Use simple language. \
Always mention the scheme website so users can apply. \
If someone asks about eligibility, explain clearly what they need.";

/// Build the full prompt for one chat turn
pub fn build(user_message: &str, records: &[SchemeRecord]) -> String {
  let context = if records.is_empty() {
    NO_SCHEMES_FOUND.to_string()
  } else {
    records.iter().map(scheme_block).collect::<Vec<_>>().join("\n\n")
  };

  format!(
    "{SYSTEM_PROMPT}\n\n\
     Based on these government schemes:\n\n\
     {context}\n\n\
     User Question: {user_message}\n\n\
     Provide a helpful response about the most relevant scheme(s). Include:\n\
     1. Which scheme(s) match their needs\n\
     2. Key benefits\n\
     3. Basic eligibility\n\
     4. How to apply\n\
     5. Website link\n\n\
     Response:"
  )
}

/// One scheme as a labelled block
pub fn scheme_block(record: &SchemeRecord) -> String {
  format!(
    "Scheme: {}\nDescription: {}\nEligibility: {}\nBenefits: {}\nDocuments: {}\nHow to Apply: {}\nWebsite: {}",
    or_missing(&record.name),
    or_missing(&record.description),
    or_missing(&record.eligibility),
    or_missing(&record.benefits),
    or_missing(&record.documents_required),
    or_missing(&record.how_to_apply),
    or_missing(&record.website),
  )
}

fn or_missing(value: &str) -> &str {
  if value.trim().is_empty() {
    MISSING_FIELD
  } else {
    value
  }
}
