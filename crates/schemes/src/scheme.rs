//! Government scheme records and dataset parsing

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::errors::IngestionError;

/// Every key a scheme object must carry, in dataset order
pub const REQUIRED_FIELDS: [&str; 10] = [
  "id",
  "name",
  "full_name",
  "ministry",
  "description",
  "eligibility",
  "benefits",
  "documents_required",
  "how_to_apply",
  "website",
];

/// One government support program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SchemeRecord {
  /// Unique identifier across the store
  pub id: String,
  /// Short name, e.g. "PM-KISAN"
  pub name: String,
  /// Expanded official name
  pub full_name: String,
  /// Responsible ministry
  pub ministry: String,
  pub description: String,
  pub eligibility: String,
  pub benefits: String,
  pub documents_required: String,
  pub how_to_apply: String,
  pub website: String,
}

impl SchemeRecord {
  /// Text that gets embedded for similarity search
  pub fn searchable_text(&self) -> String {
    format!(
      "Scheme: {} ({})\nMinistry: {}\nDescription: {}\nEligibility: {}\nBenefits: {}\nDocuments: {}\nHow to Apply: {}",
      self.name,
      self.full_name,
      self.ministry,
      self.description,
      self.eligibility,
      self.benefits,
      self.documents_required,
      self.how_to_apply,
    )
  }

  /// Field value by dataset key
  pub fn field(&self, key: &str) -> Option<&str> {
    let value = match key {
      "id" => &self.id,
      "name" => &self.name,
      "full_name" => &self.full_name,
      "ministry" => &self.ministry,
      "description" => &self.description,
      "eligibility" => &self.eligibility,
      "benefits" => &self.benefits,
      "documents_required" => &self.documents_required,
      "how_to_apply" => &self.how_to_apply,
      "website" => &self.website,
      _ => return None,
    };
    Some(value.as_str())
  }
}

/// Check a typed record before it is indexed.
///
/// `index` is the record's position in its batch and only feeds the error.
pub fn validate(record: &SchemeRecord, index: usize) -> Result<(), IngestionError> {
  if record.id.trim().is_empty() {
    return Err(IngestionError::BlankId { index });
  }
  for field in REQUIRED_FIELDS.iter().skip(1) {
    if record.field(field).is_none_or(|value| value.trim().is_empty()) {
      return Err(IngestionError::MissingField { index, id: Some(record.id.clone()), field });
    }
  }
  Ok(())
}

/// Parse a JSON array of schemes, naming the first malformed record
pub fn parse_dataset(json: &str) -> Result<Vec<SchemeRecord>, IngestionError> {
  let value: Value =
    serde_json::from_str(json).map_err(|e| IngestionError::Json { message: e.to_string() })?;
  let Value::Array(items) = value else {
    return Err(IngestionError::NotAnArray);
  };

  items.into_iter().enumerate().map(|(index, item)| parse_record(index, item)).collect()
}

/// Read and parse a dataset file
pub fn read_dataset(path: &Path) -> Result<Vec<SchemeRecord>, IngestionError> {
  let content = std::fs::read_to_string(path).map_err(|e| IngestionError::Read {
    path: path.display().to_string(),
    message: e.to_string(),
  })?;
  parse_dataset(&content)
}

fn parse_record(index: usize, item: Value) -> Result<SchemeRecord, IngestionError> {
  let Value::Object(object) = &item else {
    return Err(IngestionError::NotAnObject { index });
  };
  let id = object.get("id").and_then(Value::as_str).map(str::to_string);

  for field in REQUIRED_FIELDS {
    match object.get(field) {
      None | Some(Value::Null) => {
        return Err(IngestionError::MissingField { index, id: id.clone(), field });
      }
      Some(Value::String(_)) => {}
      Some(_) => return Err(IngestionError::InvalidField { index, id: id.clone(), field }),
    }
  }

  let record: SchemeRecord = serde_json::from_value(item)
    .map_err(|e| IngestionError::Json { message: format!("scheme #{index}: {e}") })?;
  validate(&record, index)?;
  Ok(record)
}
