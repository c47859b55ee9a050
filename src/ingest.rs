//! Reading raw ticket exports.
//!
//! JSON and YAML inputs may be a list of records, an object with an `items`
//! list, or a map of id to record. CSV inputs need a header row; columns
//! other than the known ticket fields are carried along as source metadata.

use crate::config::IngestSettings;
use crate::error::{GroomError, Result};
use crate::model::RawRecord;
use serde_json::{Map, Value};
use std::path::Path;

const KNOWN_FIELDS: &[&str] = &["id", "title", "description", "status", "reporter"];

const ID_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
    Csv,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(InputFormat::Json),
            "yaml" | "yml" => Ok(InputFormat::Yaml),
            "csv" => Ok(InputFormat::Csv),
            _ => Err(GroomError::Parse(format!(
                "Unsupported input format for {} (expected .json, .yaml, .yml or .csv)",
                path.display()
            ))),
        }
    }
}

/// Read all records from a file, picking the parser by extension.
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let format = InputFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    let records = parse_records(&content, format)?;
    tracing::info!(path = %path.display(), count = records.len(), "Read raw records");
    Ok(records)
}

pub fn parse_records(content: &str, format: InputFormat) -> Result<Vec<RawRecord>> {
    match format {
        InputFormat::Json => {
            let value: Value =
                serde_json::from_str(content).map_err(|e| GroomError::Parse(e.to_string()))?;
            records_from_value(value)
        }
        InputFormat::Yaml => {
            let value: Value =
                serde_yaml::from_str(content).map_err(|e| GroomError::Parse(e.to_string()))?;
            records_from_value(value)
        }
        InputFormat::Csv => parse_csv(content),
    }
}

/// Give id-less records a generated id. Returns how many were assigned.
pub fn assign_missing_ids(records: &mut [RawRecord], settings: &IngestSettings) -> usize {
    let mut assigned = 0;
    for record in records.iter_mut() {
        let missing = record.id.as_deref().is_none_or(|id| id.trim().is_empty());
        if missing {
            let suffix = nanoid::format(nanoid::rngs::default, &ID_ALPHABET, settings.id_length);
            let id = format!("{}{}", settings.id_prefix, suffix);
            tracing::debug!(id = %id, "Generated id for record");
            record.id = Some(id);
            assigned += 1;
        }
    }
    assigned
}

fn records_from_value(value: Value) -> Result<Vec<RawRecord>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.into_iter().map(record_from_value).collect(),
        Value::Object(mut map) => {
            if matches!(map.get("items"), Some(Value::Array(_))) {
                return records_from_value(map.remove("items").unwrap_or_default());
            }
            map.into_iter()
                .map(|(key, value)| {
                    let mut record = record_from_value(value)?;
                    if record.id.is_none() {
                        record.id = Some(key);
                    }
                    Ok(record)
                })
                .collect()
        }
        other => Err(GroomError::Parse(format!(
            "expected a list of records or a map of id to record, found {}",
            value_kind(&other)
        ))),
    }
}

fn record_from_value(value: Value) -> Result<RawRecord> {
    let mut map = match value {
        Value::Object(map) => map,
        other => {
            return Err(GroomError::Parse(format!(
                "expected a record object, found {}",
                value_kind(&other)
            )));
        }
    };
    // ids like 42 and other scalar ticket fields are read as text
    for field in KNOWN_FIELDS {
        if let Some(v) = map.get_mut(*field) {
            match v {
                Value::Number(n) => *v = Value::String(n.to_string()),
                Value::Bool(b) => *v = Value::String(b.to_string()),
                _ => {}
            }
        }
    }
    serde_json::from_value(Value::Object(map)).map_err(|e| GroomError::Parse(e.to_string()))
}

fn parse_csv(content: &str) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| {
            let lower = h.to_lowercase();
            if KNOWN_FIELDS.contains(&lower.as_str()) {
                lower
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row.map_err(|e| GroomError::Parse(format!("CSV row {}: {}", idx + 1, e)))?;
        let mut map = Map::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if !cell.is_empty() {
                map.insert(header.clone(), Value::String(cell.to_string()));
            }
        }
        records.push(record_from_value(Value::Object(map))?);
    }
    Ok(records)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
