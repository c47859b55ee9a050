//! The grooming pipeline.
//!
//! Stages run strictly in sequence:
//!
//! 1. **Clustering**: normalize raw records, then group them into epics
//! 2. **Rewriting**: classify, decompose and rewrite each item
//! 3. **Scoring**: effort, ROI, risk and priority per item
//! 4. **CrossChecking**: batch-wide dependencies and blocker escalation
//! 5. **Finalized**: strategic ordering and summary
//!
//! Per-item problems are collected as [`Issue`]s and never stop a run. A
//! stage that leaves nothing to work on, exceeds its time budget, or is
//! cancelled fails the whole run; no partial result is returned.

pub mod cluster;
pub mod crosscheck;
pub mod normalize;
pub mod rewrite;
pub mod score;
pub mod signals;
pub mod themes;

use crate::config::GroomConfig;
use crate::error::{GroomError, Result};
use crate::model::{Epic, Issue, ProcessedItem, RawItem, RawRecord};
use crate::sprint::is_sprint_ready;
use cluster::Clusterer;
use rayon::prelude::*;
use rewrite::{RewrittenItem, Rewriter};
use score::{Scorer, ScoringContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use themes::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Clustering,
    Rewriting,
    Scoring,
    CrossChecking,
    Finalized,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Clustering,
        Stage::Rewriting,
        Stage::Scoring,
        Stage::CrossChecking,
        Stage::Finalized,
    ];

    /// Progress index, 0 through 4.
    pub fn index(self) -> usize {
        match self {
            Stage::Clustering => 0,
            Stage::Rewriting => 1,
            Stage::Scoring => 2,
            Stage::CrossChecking => 3,
            Stage::Finalized => 4,
        }
    }

    /// Human-readable description for progress displays.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Clustering => "Clustering & Categorization",
            Stage::Rewriting => "Refinement & Decomposition",
            Stage::Scoring => "Prioritization Engine",
            Stage::CrossChecking => "Cross-Check & Impact Analysis",
            Stage::Finalized => "Export Preparation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Clustering => write!(f, "Clustering"),
            Stage::Rewriting => write!(f, "Rewriting"),
            Stage::Scoring => write!(f, "Scoring"),
            Stage::CrossChecking => write!(f, "CrossChecking"),
            Stage::Finalized => write!(f, "Finalized"),
        }
    }
}

/// Cooperative cancellation, checked between stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_items: usize,
    pub high_priority_count: usize,
    pub total_effort: u32,
    pub average_roi: f64,
    pub sprint_ready_count: usize,
    pub issues: Vec<Issue>,
}

impl Summary {
    pub fn compute(items: &[ProcessedItem], issues: Vec<Issue>, config: &GroomConfig) -> Self {
        let total_effort = items.iter().map(|i| i.effort).sum();
        let average_roi = if items.is_empty() {
            0.0
        } else {
            let total: u32 = items.iter().map(|i| u32::from(i.roi)).sum();
            (f64::from(total) / items.len() as f64 * 10.0).round() / 10.0
        };
        Self {
            total_items: items.len(),
            high_priority_count: items.iter().filter(|i| i.priority.is_high()).count(),
            total_effort,
            average_roi,
            sprint_ready_count: items
                .iter()
                .filter(|i| is_sprint_ready(i, &config.team, &config.sprint))
                .count(),
            issues,
        }
    }
}

/// Successful run result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    #[serde(rename = "processedItems")]
    pub items: Vec<ProcessedItem>,
    pub summary: Summary,
    pub epics: Vec<Epic>,

    /// Normalized input, kept for side-by-side comparison
    pub sources: Vec<RawItem>,
}

impl RunReport {
    pub fn source(&self, id: &str) -> Option<&RawItem> {
        self.sources.iter().find(|s| s.id == id)
    }

    /// Items produced from one raw ticket, in final order.
    pub fn items_from(&self, source_id: &str) -> Vec<&ProcessedItem> {
        self.items
            .iter()
            .filter(|i| i.source_id == source_id)
            .collect()
    }
}

/// Failed run result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFailure {
    pub failed_stage: Stage,
    pub error_kind: String,
    pub message: String,
}

impl RunFailure {
    /// Errors raised outside a stage (config, I/O) happen before any item
    /// work starts and are reported against the first stage, Clustering;
    /// `error_kind` still tells them apart.
    pub fn from_error(err: &GroomError) -> Self {
        let failed_stage = match err {
            GroomError::StageFailure { stage, .. } | GroomError::Cancelled(stage) => *stage,
            _ => Stage::Clustering,
        };
        let error_kind = match err {
            GroomError::StageFailure { kind, .. } => kind.clone(),
            other => other.kind().to_string(),
        };
        Self {
            failed_stage,
            error_kind,
            message: err.to_string(),
        }
    }
}

type ProgressFn<'a> = Box<dyn Fn(Stage) + Send + Sync + 'a>;

/// Runs the stages over one batch of raw records.
pub struct Pipeline<'a> {
    config: &'a GroomConfig,
    themes: Vec<Theme>,
    goals: Vec<String>,
    cancel: Option<CancelToken>,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a GroomConfig) -> Self {
        Self {
            config,
            themes: themes::catalog(&config.themes),
            goals: config.sprint.goals.clone(),
            cancel: None,
            progress: None,
        }
    }

    /// Replace the configured sprint goals for this run.
    pub fn with_goals(mut self, goals: Vec<String>) -> Self {
        self.goals = goals;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Called with each stage as it starts. Advisory only.
    pub fn on_progress(mut self, f: impl Fn(Stage) + Send + Sync + 'a) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    /// Groom one batch. The configuration is validated first, so a bad
    /// config fails the run instead of a stage.
    pub fn run(&self, records: &[RawRecord]) -> Result<RunReport> {
        self.config.validate()?;
        let run_started = Instant::now();
        let mut issues: Vec<Issue> = Vec::new();

        // Clustering
        let started = self.enter(Stage::Clustering)?;
        let normalized = normalize::normalize(records);
        issues.extend(normalized.issues);
        let sources = normalized.items;
        if sources.is_empty() {
            return Err(stage_failure(
                Stage::Clustering,
                "EmptyInput",
                format!("no usable records among {} after normalization", records.len()),
            ));
        }
        let clustering = Clusterer::new(&self.themes, &self.config.clustering).cluster(&sources);
        self.leave(Stage::Clustering, started, clustering.epics.len())?;

        // Rewriting
        let started = self.enter(Stage::Rewriting)?;
        let rewriter =
            Rewriter::new(&self.themes).with_reserved_ids(sources.iter().map(|s| s.id.clone()));
        let results = self.map_items(&sources, |item| {
            let epic = clustering.epic_of(&item.id).ok_or_else(|| {
                stage_failure(
                    Stage::Rewriting,
                    "PartitionViolation",
                    format!("item {} has no epic", item.id),
                )
            })?;
            rewriter.rewrite(item, epic)
        });
        let mut rewritten: Vec<RewrittenItem> = Vec::new();
        for result in results {
            match result {
                Ok(entries) => rewritten.extend(entries),
                Err(e) => match Issue::from_error(&e) {
                    Some(issue) => {
                        tracing::warn!(id = %issue.item_id, error = %e, "Excluding item");
                        issues.push(issue);
                    }
                    None => return Err(e),
                },
            }
        }
        if rewritten.is_empty() {
            return Err(stage_failure(
                Stage::Rewriting,
                "EmptyResult",
                "no item could be classified".to_string(),
            ));
        }
        self.leave(Stage::Rewriting, started, rewritten.len())?;

        // Scoring
        let started = self.enter(Stage::Scoring)?;
        let scorer = Scorer::new(
            &self.config.scoring,
            ScoringContext {
                team: &self.config.team,
                goals: &self.goals,
            },
        );
        let scored = self.map_items(&rewritten, |item| scorer.finalize(item));
        self.leave(Stage::Scoring, started, scored.len())?;

        // CrossChecking
        let started = self.enter(Stage::CrossChecking)?;
        let mut items = crosscheck::cross_check(&scored);
        self.leave(Stage::CrossChecking, started, items.len())?;

        // Finalized
        let started = self.enter(Stage::Finalized)?;
        // stable: equal priority and ROI keep input order
        items.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| b.roi.cmp(&a.roi)));
        let summary = Summary::compute(&items, issues, self.config);
        self.leave(Stage::Finalized, started, items.len())?;

        tracing::info!(
            items = summary.total_items,
            epics = clustering.epics.len(),
            issues = summary.issues.len(),
            elapsed_ms = run_started.elapsed().as_millis() as u64,
            "Pipeline finished"
        );

        Ok(RunReport {
            items,
            summary,
            epics: clustering.epics,
            sources,
        })
    }

    fn enter(&self, stage: Stage) -> Result<Instant> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            tracing::warn!(stage = %stage, "Run cancelled");
            return Err(GroomError::Cancelled(stage));
        }
        if let Some(progress) = &self.progress {
            progress(stage);
        }
        tracing::debug!(stage = %stage, index = stage.index(), "Stage started");
        Ok(Instant::now())
    }

    fn leave(&self, stage: Stage, started: Instant, count: usize) -> Result<()> {
        let elapsed = started.elapsed().as_millis() as u64;
        tracing::info!(stage = %stage, count, elapsed_ms = elapsed, "Stage complete");
        match self.config.pipeline.stage_budget_ms {
            Some(budget) if elapsed > budget => Err(stage_failure(
                stage,
                "BudgetExceeded",
                format!("took {} ms, budget is {} ms", elapsed, budget),
            )),
            _ => Ok(()),
        }
    }

    /// Per-item map that keeps input order, on the rayon pool when enabled.
    fn map_items<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        if self.config.pipeline.parallel {
            items.par_iter().map(f).collect()
        } else {
            items.iter().map(f).collect()
        }
    }
}

fn stage_failure(stage: Stage, kind: &str, message: String) -> GroomError {
    GroomError::StageFailure {
        stage,
        kind: kind.to_string(),
        message,
    }
}
