use crate::error::{GroomError, Result};
use crate::model::{Issue, RawItem, RawRecord};
use crate::validation::{validate_content, validate_id};
use std::collections::HashMap;

/// Normalizer output: usable items in input order plus per-record issues.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub items: Vec<RawItem>,
    pub issues: Vec<Issue>,
}

/// Turn raw records into uniform [`RawItem`]s.
///
/// Malformed records are excluded and reported. A repeated id replaces the
/// earlier record in place and is reported as a warning.
pub fn normalize(records: &[RawRecord]) -> Normalized {
    let mut out = Normalized::default();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        let item = match normalize_record(index, record) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(record = index + 1, error = %e, "Skipping malformed record");
                out.issues.extend(Issue::from_error(&e));
                continue;
            }
        };

        match slots.get(&item.id) {
            Some(&slot) => {
                let warning = GroomError::DuplicateId(item.id.clone());
                tracing::warn!(id = %item.id, "Duplicate id, later record wins");
                out.issues.extend(Issue::from_error(&warning));
                out.items[slot] = item;
            }
            None => {
                slots.insert(item.id.clone(), out.items.len());
                out.items.push(item);
            }
        }
    }

    tracing::debug!(
        records = records.len(),
        items = out.items.len(),
        issues = out.issues.len(),
        "Normalized records"
    );
    out
}

/// Normalize a single record. `index` is only used to label id-less records.
pub fn normalize_record(index: usize, record: &RawRecord) -> Result<RawItem> {
    let label = format!("#{}", index + 1);

    let id = match record.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            return Err(GroomError::MalformedInput {
                record: label,
                reason: "missing id".to_string(),
            });
        }
    };
    validate_id(&id)?;

    let title = collapse(record.title.as_deref().unwrap_or_default());
    let description = collapse_lines(record.description.as_deref().unwrap_or_default());
    validate_content(&id, &title, &description)?;

    Ok(RawItem {
        id,
        title,
        description,
        status: collapse(record.status.as_deref().unwrap_or_default()),
        reporter: collapse(record.reporter.as_deref().unwrap_or_default()),
        source_meta: record.extra.clone(),
    })
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse whitespace per line, dropping blank lines. Line breaks survive so
/// bullet lists can still be split during rewriting.
fn collapse_lines(text: &str) -> String {
    text.lines()
        .map(collapse)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
