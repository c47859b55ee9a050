//! Export renderers and tracker sinks over the final item list.

use crate::config::GroomConfig;
use crate::error::{GroomError, Result};
use crate::model::ProcessedItem;
use crate::pipeline::RunReport;
use crate::sprint::recommend;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const CSV_HEADER: [&str; 9] = [
    "ID",
    "Title",
    "Type",
    "Epic",
    "Priority",
    "Effort",
    "ROI",
    "Risk",
    "Dependencies",
];

const DIGEST_TITLE_WIDTH: usize = 60;

/// Render items as CSV ready for a tracker import.
pub fn to_csv(items: &[ProcessedItem]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for item in items {
        writer.write_record([
            item.id.clone(),
            item.title.clone(),
            item.item_type.to_string(),
            item.epic.clone(),
            item.priority.to_string(),
            item.effort.to_string(),
            item.roi.to_string(),
            item.risk.to_string(),
            item.dependencies.join("; "),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| GroomError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| GroomError::Export(e.to_string()))
}

/// Chat-friendly digest of the top `top` items.
pub fn digest(report: &RunReport, config: &GroomConfig, top: usize) -> String {
    let summary = &report.summary;
    let mut out = String::new();
    out.push_str("**Daily Grooming Digest**\n\n");
    out.push_str(&format!(
        "**Backlog Health**: {} items processed\n",
        summary.total_items
    ));
    out.push_str(&format!(
        "**Sprint-Ready**: {} items\n",
        summary.sprint_ready_count
    ));
    out.push_str(&format!(
        "**High Priority**: {} items\n",
        summary.high_priority_count
    ));
    if !summary.issues.is_empty() {
        out.push_str(&format!(
            "**Needs Attention**: {} input issues\n",
            summary.issues.len()
        ));
    }

    let shown: Vec<&ProcessedItem> = report.items.iter().take(top).collect();
    out.push_str(&format!(
        "\n**Top {} Items for Grooming Discussion:**\n",
        shown.len()
    ));
    for (i, item) in shown.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. **{}**\n   - Type: {} | Priority: {}\n   - Effort: {} pts | ROI: {}%\n   - Epic: {}\n",
            i + 1,
            truncate(&item.title, DIGEST_TITLE_WIDTH),
            item.item_type,
            item.priority,
            item.effort,
            item.roi,
            item.epic
        ));
    }

    let plan = recommend(&report.items, &config.team, &config.sprint);
    let focus: Vec<&str> = plan.picks.iter().take(2).map(|p| p.id.as_str()).collect();
    if !focus.is_empty() {
        out.push_str(&format!(
            "\n**Recommendation**: Focus on {} for immediate sprint inclusion.\n",
            focus.join(" and ")
        ));
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let cut: String = text.chars().take(width).collect();
    format!("{}...", cut.trim_end())
}

/// Idempotency key a tracker uses to recognize an item across pushes.
///
/// Keyed on the item id only; epic names can change between runs.
pub fn idempotency_key(item: &ProcessedItem) -> String {
    format!("groom-{}", item.id)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushReceipt {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub keys: Vec<String>,
    pub pushed_at: DateTime<Utc>,
}

/// A ticket tracker that accepts processed items.
///
/// Pushing the same items twice must not create duplicates.
pub trait ExportSink {
    fn name(&self) -> &str;
    fn push(&self, items: &[ProcessedItem]) -> Result<PushReceipt>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackerRecord<'a> {
    key: String,
    #[serde(flatten)]
    item: &'a ProcessedItem,
}

/// Tracker stand-in that keeps one JSON file per item, named by key.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl ExportSink for DirectorySink {
    fn name(&self) -> &str {
        "directory"
    }

    fn push(&self, items: &[ProcessedItem]) -> Result<PushReceipt> {
        std::fs::create_dir_all(&self.dir)?;
        let mut receipt = PushReceipt {
            created: 0,
            updated: 0,
            unchanged: 0,
            keys: Vec::with_capacity(items.len()),
            pushed_at: Utc::now(),
        };

        for item in items {
            let key = idempotency_key(item);
            let path = self.path_for(&key);
            let content = serde_json::to_string_pretty(&TrackerRecord {
                key: key.clone(),
                item,
            })?;

            if path.exists() {
                if std::fs::read_to_string(&path)? == content {
                    receipt.unchanged += 1;
                } else {
                    atomic_write(&path, &content)?;
                    receipt.updated += 1;
                }
            } else {
                atomic_write(&path, &content)?;
                receipt.created += 1;
            }
            receipt.keys.push(key);
        }

        tracing::info!(
            sink = self.name(),
            dir = %self.dir.display(),
            created = receipt.created,
            updated = receipt.updated,
            unchanged = receipt.unchanged,
            "Pushed items"
        );
        Ok(receipt)
    }
}

/// Write through a temp file in the target directory, then rename over the target.
fn atomic_write(target_path: &Path, content: &str) -> Result<()> {
    let target_dir = target_path
        .parent()
        .ok_or_else(|| GroomError::Export("Target path has no parent directory".to_string()))?;

    let mut temp_file = NamedTempFile::new_in(target_dir)
        .map_err(|e| GroomError::Export(format!("Failed to create temp file: {}", e)))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| GroomError::Export(format!("Failed to write temp file: {}", e)))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| GroomError::Export(format!("Failed to sync temp file: {}", e)))?;
    temp_file
        .persist(target_path)
        .map_err(|e| GroomError::Export(format!("Failed to persist temp file: {}", e)))?;
    Ok(())
}
