//! Sprint readiness and next-sprint recommendation.

use crate::config::{SprintSettings, TeamCapacity};
use crate::model::{ItemType, Priority, ProcessedItem};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// An item is sprint-ready when it fits the team's per-item limit.
pub fn is_sprint_ready(item: &ProcessedItem, team: &TeamCapacity, sprint: &SprintSettings) -> bool {
    item.effort > 0 && item.effort <= ready_limit(team, sprint)
}

fn ready_limit(team: &TeamCapacity, sprint: &SprintSettings) -> u32 {
    sprint.ready_max_effort.min(team.velocity)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    pub id: String,
    pub title: String,
    pub effort: u32,
    pub priority: Priority,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deferral {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SprintPlan {
    pub velocity: u32,
    pub committed_effort: u32,
    pub picks: Vec<Pick>,
    pub deferred: Vec<Deferral>,
}

/// Greedy fill of one sprint.
///
/// Candidates are taken by priority, then by how many items they unblock,
/// then by ROI. An item whose in-batch dependencies are not picked yet waits;
/// passes repeat until nothing more fits.
pub fn recommend(
    items: &[ProcessedItem],
    team: &TeamCapacity,
    sprint: &SprintSettings,
) -> SprintPlan {
    let ids: BTreeSet<&str> = items.iter().map(|i| i.id.as_str()).collect();

    let mut blocking_count: HashMap<&str, usize> = HashMap::new();
    for item in items {
        for dep in &item.dependencies {
            if ids.contains(dep.as_str()) {
                *blocking_count.entry(dep.as_str()).or_insert(0) += 1;
            }
        }
    }
    let blocks = |id: &str| blocking_count.get(id).copied().unwrap_or(0);

    let mut plan = SprintPlan {
        velocity: team.velocity,
        committed_effort: 0,
        picks: Vec::new(),
        deferred: Vec::new(),
    };

    let limit = ready_limit(team, sprint);
    let mut candidates: Vec<&ProcessedItem> = Vec::new();
    for item in items {
        if is_sprint_ready(item, team, sprint) {
            candidates.push(item);
        } else {
            plan.deferred.push(Deferral {
                id: item.id.clone(),
                reason: format!(
                    "Effort {} exceeds the sprint-ready limit of {}",
                    item.effort, limit
                ),
            });
        }
    }
    candidates.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| blocks(&b.id).cmp(&blocks(&a.id)))
            .then_with(|| b.roi.cmp(&a.roi))
    });

    let mut picked: BTreeSet<&str> = BTreeSet::new();
    let mut settled: BTreeSet<&str> = BTreeSet::new();
    loop {
        let mut progress = false;
        for item in &candidates {
            if settled.contains(item.id.as_str()) {
                continue;
            }
            let waiting = item
                .dependencies
                .iter()
                .any(|d| ids.contains(d.as_str()) && !picked.contains(d.as_str()));
            if waiting {
                continue;
            }
            settled.insert(&item.id);
            progress = true;
            if plan.committed_effort + item.effort > team.velocity {
                plan.deferred.push(Deferral {
                    id: item.id.clone(),
                    reason: "Would exceed team velocity".to_string(),
                });
                continue;
            }
            picked.insert(&item.id);
            plan.committed_effort += item.effort;
            plan.picks.push(Pick {
                id: item.id.clone(),
                title: item.title.clone(),
                effort: item.effort,
                priority: item.priority,
                reason: pick_reason(item, blocks(&item.id)),
            });
        }
        if !progress {
            break;
        }
    }

    for item in &candidates {
        if !settled.contains(item.id.as_str()) {
            let blockers: Vec<&str> = item
                .dependencies
                .iter()
                .filter(|d| ids.contains(d.as_str()) && !picked.contains(d.as_str()))
                .map(String::as_str)
                .collect();
            plan.deferred.push(Deferral {
                id: item.id.clone(),
                reason: format!("Blocked by {}", blockers.join(", ")),
            });
        }
    }

    tracing::debug!(
        picks = plan.picks.len(),
        committed = plan.committed_effort,
        velocity = plan.velocity,
        "Recommended sprint"
    );
    plan
}

fn pick_reason(item: &ProcessedItem, blocks_count: usize) -> String {
    if blocks_count > 0 {
        format!("Unblocks {} item(s)", blocks_count)
    } else if item.priority == Priority::Critical {
        "Critical priority".to_string()
    } else if item.priority == Priority::High {
        "High priority".to_string()
    } else if item.item_type == ItemType::Bug {
        "Bug fix".to_string()
    } else {
        "Next in queue".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Risk;

    fn item(id: &str, effort: u32, priority: Priority) -> ProcessedItem {
        ProcessedItem {
            id: id.to_string(),
            source_id: id.to_string(),
            title: format!("Do {}", id),
            item_type: ItemType::Feature,
            epic: "E".to_string(),
            priority,
            effort,
            roi: 50,
            risk: Risk::Low,
            flags: vec![],
            acceptance: vec!["a".to_string(), "b".to_string()],
            dependencies: vec![],
            ai_generated: true,
        }
    }

    fn team(velocity: u32) -> TeamCapacity {
        TeamCapacity {
            velocity,
            ..TeamCapacity::default()
        }
    }

    #[test]
    fn test_sprint_ready_uses_smaller_limit() {
        let sprint = SprintSettings::default();
        assert!(is_sprint_ready(&item("A", 8, Priority::Low), &team(45), &sprint));
        assert!(!is_sprint_ready(&item("A", 13, Priority::Low), &team(45), &sprint));
        assert!(!is_sprint_ready(&item("A", 8, Priority::Low), &team(5), &sprint));
    }

    #[test]
    fn test_recommend_fills_by_priority_within_velocity() {
        let items = vec![
            item("LOW", 5, Priority::Low),
            item("CRIT", 5, Priority::Critical),
            item("HIGH", 8, Priority::High),
        ];
        let plan = recommend(&items, &team(13), &SprintSettings::default());
        let ids: Vec<_> = plan.picks.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["CRIT", "HIGH"]);
        assert_eq!(plan.committed_effort, 13);
        assert_eq!(plan.deferred.len(), 1);
        assert_eq!(plan.deferred[0].id, "LOW");
    }

    #[test]
    fn test_recommend_waits_for_dependencies() {
        let mut dependent = item("DEP", 3, Priority::Critical);
        dependent.dependencies = vec!["BASE".to_string(), "Analytics service".to_string()];
        let base = item("BASE", 3, Priority::Low);
        let plan = recommend(&[dependent, base], &team(45), &SprintSettings::default());
        let ids: Vec<_> = plan.picks.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["BASE", "DEP"]);
        assert_eq!(plan.picks[0].reason, "Unblocks 1 item(s)");
    }

    #[test]
    fn test_recommend_defers_blocked_items() {
        let mut dependent = item("DEP", 3, Priority::High);
        dependent.dependencies = vec!["BIG".to_string()];
        let big = item("BIG", 21, Priority::High);
        let plan = recommend(&[dependent, big], &team(45), &SprintSettings::default());
        assert!(plan.picks.is_empty());
        let reasons: Vec<_> = plan.deferred.iter().map(|d| d.reason.as_str()).collect();
        assert!(reasons.iter().any(|r| r.starts_with("Effort 21")));
        assert!(reasons.contains(&"Blocked by BIG"));
    }
}
