//! Effort, ROI, risk and priority.
//!
//! Every input is a signal count from the rewritten entry; every weight comes
//! from [`ScoringWeights`]. Each bump is non-negative, so adding a signal can
//! only raise effort, impact and the risk tier.

use super::rewrite::RewrittenItem;
use super::signals::keywords;
use crate::config::{ScoringWeights, TeamCapacity};
use crate::model::{ItemType, Priority, ProcessedItem, Risk};
use std::collections::BTreeSet;

pub const FLAG_OVER_CAPACITY: &str = "Exceeds Sprint Capacity";

/// Effort at or above which an item counts as large.
const LARGE_EFFORT: u32 = 13;

const MAX_IMPACT: u32 = 100;
const MAX_REVENUE_SIGNALS: usize = 2;
const MAX_URGENCY_SIGNALS: usize = 2;
const MAX_REACH_SIGNALS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub effort: u32,
    pub roi: u8,
    pub risk: Risk,
    pub priority: Priority,
}

/// Team capacity and sprint goals a batch is scored against.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub team: &'a TeamCapacity,
    pub goals: &'a [String],
}

pub struct Scorer<'a> {
    weights: &'a ScoringWeights,
    velocity: u32,
    goal_keywords: BTreeSet<String>,
}

impl<'a> Scorer<'a> {
    pub fn new(weights: &'a ScoringWeights, context: ScoringContext<'_>) -> Self {
        let goal_keywords = context.goals.iter().flat_map(|g| keywords(g)).collect();
        Self {
            weights,
            velocity: context.team.velocity,
            goal_keywords,
        }
    }

    pub fn score(&self, item: &RewrittenItem) -> Score {
        let w = self.weights;
        let s = &item.signals;

        let index = self.effort_index(item);
        let effort = w.effort_scale[index];

        let matches = self.goal_matches(item);
        let efficiency = w.efficiency_step * (w.effort_scale.len() - 1 - index) as u32;
        let roi = (self.impact(item) + efficiency + w.goal_boost * matches).min(100) as u8;

        let risk_points = s.external.min(2)
            + 2 * s.compliance.min(1)
            + s.platform.min(1)
            + s.ml.min(1)
            + usize::from(effort >= LARGE_EFFORT);
        let risk = match risk_points {
            0 => Risk::Low,
            1 | 2 => Risk::Medium,
            _ => Risk::High,
        };

        let committed = s.revenue > 0 || s.urgency > 0;
        let mut points: i32 = match roi {
            80.. => 3,
            60..=79 => 2,
            40..=59 => 1,
            _ => 0,
        };
        if s.revenue > 0 {
            points += 2;
        }
        if s.urgency > 0 {
            points += 2;
        }
        if item.item_type == ItemType::Bug {
            points += 1;
        }
        if matches > 0 {
            points += 1;
        }
        if risk == Risk::High {
            points -= 1;
        }

        let mut priority = if points >= w.critical_threshold {
            Priority::Critical
        } else if points >= w.high_threshold {
            Priority::High
        } else if points >= w.medium_threshold {
            Priority::Medium
        } else {
            Priority::Low
        };
        // exploratory work and uncommitted large items never outrank Medium
        if item.item_type == ItemType::Spike || (effort >= LARGE_EFFORT && !committed) {
            priority = priority.min(Priority::Medium);
        }

        Score {
            effort,
            roi,
            risk,
            priority,
        }
    }

    /// Score an entry and assemble the final item.
    pub fn finalize(&self, item: &RewrittenItem) -> ProcessedItem {
        let score = self.score(item);
        let mut processed = ProcessedItem {
            id: item.id.clone(),
            source_id: item.source_id.clone(),
            title: item.title.clone(),
            item_type: item.item_type,
            epic: item.epic.clone(),
            priority: score.priority,
            effort: score.effort,
            roi: score.roi,
            risk: score.risk,
            flags: item.flags.clone(),
            acceptance: item.acceptance.clone(),
            dependencies: item.dependencies.clone(),
            ai_generated: item.ai_generated,
        };
        if score.effort > self.velocity {
            processed.add_flag(FLAG_OVER_CAPACITY);
        }
        processed
    }

    fn effort_index(&self, item: &RewrittenItem) -> usize {
        let w = self.weights;
        let s = &item.signals;
        let top = w.effort_scale.len() - 1;

        let base = match item.item_type {
            ItemType::Bug => w.bug_effort,
            ItemType::UserStory => w.story_effort,
            ItemType::Feature => w.feature_effort,
            ItemType::Spike => w.spike_effort,
        };
        let steps = s.scope.min(w.max_scope_steps as usize)
            + s.ml.min(1)
            + s.external.min(1)
            + s.compliance.min(1)
            + s.unknowns.min(1)
            + usize::from(item.item_type == ItemType::Bug && s.platform > 0);

        let index = (scale_index(&w.effort_scale, base) + steps).min(top);
        if item.item_type == ItemType::Spike {
            return index.min(scale_index(&w.effort_scale, w.spike_effort_ceiling));
        }
        index
    }

    fn impact(&self, item: &RewrittenItem) -> u32 {
        let w = self.weights;
        let s = &item.signals;
        let base = match item.item_type {
            ItemType::Bug => w.bug_impact,
            ItemType::UserStory => w.story_impact,
            ItemType::Feature => w.feature_impact,
            ItemType::Spike => w.spike_impact,
        };
        let impact = base
            + w.revenue_impact * s.revenue.min(MAX_REVENUE_SIGNALS) as u32
            + w.urgency_impact * s.urgency.min(MAX_URGENCY_SIGNALS) as u32
            + w.reach_impact * s.reach.min(MAX_REACH_SIGNALS) as u32;
        impact.min(MAX_IMPACT)
    }

    fn goal_matches(&self, item: &RewrittenItem) -> u32 {
        let hits = item
            .signals
            .keywords
            .iter()
            .filter(|k| self.goal_keywords.contains(*k))
            .count() as u32;
        hits.min(self.weights.max_goal_matches)
    }
}

/// Smallest scale position holding at least `points`, or the top.
fn scale_index(scale: &[u32], points: u32) -> usize {
    scale
        .iter()
        .position(|&v| v >= points)
        .unwrap_or(scale.len().saturating_sub(1))
}
