//! Batch-scope dependency detection and blocker escalation.
//!
//! The checker reads the whole batch before emitting anything. It only adds
//! dependencies and flags and only raises priorities, and running it on its
//! own output changes nothing.

use super::signals::keywords;
use crate::model::{ItemType, Priority, ProcessedItem};
use std::collections::{BTreeSet, HashMap};

pub const FLAG_BLOCKER: &str = "Blocker";
pub const FLAG_ESCALATED: &str = "Escalated";

/// Detect cross-item dependencies and escalate blockers.
pub fn cross_check(items: &[ProcessedItem]) -> Vec<ProcessedItem> {
    let mut out = items.to_vec();
    let index: HashMap<String, usize> = out
        .iter()
        .enumerate()
        .map(|(i, item)| (item.id.clone(), i))
        .collect();

    let edges = candidate_edges(&out, &index);
    let mut added = 0;
    for (from, to) in edges {
        if out[from].depends_on(&out[to].id) {
            continue;
        }
        if reaches(&out, &index, to, from) {
            tracing::debug!(
                from = %out[from].id,
                to = %out[to].id,
                "Skipping dependency that would close a cycle"
            );
            continue;
        }
        let target = out[to].id.clone();
        out[from].add_dependency(target);
        added += 1;
    }

    let escalated = escalate(&mut out, &index);
    tracing::debug!(
        items = out.len(),
        dependencies_added = added,
        escalated,
        "Cross-checked items"
    );
    out
}

/// Proposed `(dependent, dependency)` pairs in a fixed order.
fn candidate_edges(items: &[ProcessedItem], index: &HashMap<String, usize>) -> Vec<(usize, usize)> {
    let vocab: Vec<BTreeSet<String>> = items
        .iter()
        .map(|item| keywords(&format!("{} {}", item.title, item.epic)).into_iter().collect())
        .collect();

    let mut edges = Vec::new();

    // capability labels that name another item in the batch
    for (from, item) in items.iter().enumerate() {
        for label in &item.dependencies {
            if index.contains_key(label) {
                continue;
            }
            let wanted = keywords(label);
            if wanted.is_empty() {
                continue;
            }
            for (to, words) in vocab.iter().enumerate() {
                if to != from && wanted.iter().all(|w| words.contains(w)) {
                    edges.push((from, to));
                }
            }
        }
    }

    // research gates the stories and features of its epic
    for (to, spike) in items.iter().enumerate() {
        if spike.item_type != ItemType::Spike {
            continue;
        }
        for (from, item) in items.iter().enumerate() {
            let gated = matches!(item.item_type, ItemType::Feature | ItemType::UserStory);
            if gated && item.epic == spike.epic {
                edges.push((from, to));
            }
        }
    }

    edges
}

/// True when `start` depends on `goal`, directly or transitively.
fn reaches(
    items: &[ProcessedItem],
    index: &HashMap<String, usize>,
    start: usize,
    goal: usize,
) -> bool {
    let mut stack = vec![start];
    let mut seen = BTreeSet::new();
    while let Some(current) = stack.pop() {
        if current == goal {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        for dep in &items[current].dependencies {
            if let Some(&next) = index.get(dep) {
                stack.push(next);
            }
        }
    }
    false
}

/// Raise every blocker to one tier below its highest dependent, to a fixpoint.
/// Returns the number of items raised.
fn escalate(items: &mut [ProcessedItem], index: &HashMap<String, usize>) -> usize {
    let original: Vec<Priority> = items.iter().map(|item| item.priority).collect();
    let mut priorities = original.clone();
    let mut blockers = BTreeSet::new();

    loop {
        let mut changed = false;
        for (dependent, item) in items.iter().enumerate() {
            for dep in &item.dependencies {
                let Some(&blocker) = index.get(dep) else {
                    continue;
                };
                blockers.insert(blocker);
                let floor = priorities[dependent].demoted();
                if priorities[blocker] < floor {
                    priorities[blocker] = floor;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    let mut raised = 0;
    for (i, item) in items.iter_mut().enumerate() {
        if blockers.contains(&i) {
            item.add_flag(FLAG_BLOCKER);
        }
        if priorities[i] > original[i] {
            tracing::info!(
                id = %item.id,
                from = %original[i],
                to = %priorities[i],
                "Escalated blocker"
            );
            item.priority = priorities[i];
            item.add_flag(FLAG_ESCALATED);
            raised += 1;
        }
    }
    raised
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Risk;

    fn item(id: &str, item_type: ItemType, epic: &str, priority: Priority) -> ProcessedItem {
        ProcessedItem {
            id: id.to_string(),
            source_id: id.to_string(),
            title: format!("Title of {}", id),
            item_type,
            epic: epic.to_string(),
            priority,
            effort: 3,
            roi: 50,
            risk: Risk::Low,
            flags: vec![],
            acceptance: vec!["a".to_string(), "b".to_string()],
            dependencies: vec![],
            ai_generated: true,
        }
    }

    #[test]
    fn test_spike_gates_feature_in_same_epic() {
        let items = vec![
            item("F-1", ItemType::Feature, "Payments", Priority::High),
            item("S-1", ItemType::Spike, "Payments", Priority::Low),
            item("F-2", ItemType::Feature, "Search & Discovery", Priority::High),
        ];
        let out = cross_check(&items);
        assert!(out[0].depends_on("S-1"));
        assert!(!out[2].depends_on("S-1"));
        assert!(out[1].has_flag(FLAG_BLOCKER));
        assert_eq!(out[1].priority, Priority::Medium);
        assert!(out[1].has_flag(FLAG_ESCALATED));
    }

    #[test]
    fn test_label_links_to_item_providing_it() {
        let mut story = item("US-1", ItemType::UserStory, "User Onboarding", Priority::Critical);
        story.dependencies = vec!["Analytics service".to_string()];
        let mut provider = item("F-9", ItemType::Feature, "Reporting & Analytics", Priority::Low);
        provider.title = "Implement analytics service ingestion".to_string();

        let out = cross_check(&[story, provider]);
        assert!(out[0].depends_on("F-9"));
        assert!(out[0].depends_on("Analytics service"));
        assert_eq!(out[1].priority, Priority::High);
    }

    #[test]
    fn test_never_removes_dependencies() {
        let mut a = item("A", ItemType::Bug, "X", Priority::Low);
        a.dependencies = vec!["Something external".to_string(), "B".to_string()];
        let b = item("B", ItemType::Bug, "Y", Priority::Low);
        let out = cross_check(&[a, b]);
        assert_eq!(out[0].dependencies[..2], ["Something external", "B"]);
    }

    #[test]
    fn test_cycle_is_not_closed() {
        let mut spike = item("S", ItemType::Spike, "E", Priority::Low);
        spike.dependencies = vec!["F".to_string()];
        let feature = item("F", ItemType::Feature, "E", Priority::Low);
        let out = cross_check(&[spike, feature]);
        assert!(!out[1].depends_on("S"));
    }

    #[test]
    fn test_escalation_propagates_through_chain() {
        let mut top = item("A", ItemType::Bug, "X", Priority::Critical);
        top.dependencies = vec!["B".to_string()];
        let mut mid = item("B", ItemType::Bug, "X", Priority::Low);
        mid.dependencies = vec!["C".to_string()];
        let low = item("C", ItemType::Bug, "X", Priority::Low);

        let out = cross_check(&[top, mid, low]);
        assert_eq!(out[1].priority, Priority::High);
        assert_eq!(out[2].priority, Priority::Medium);
    }

    #[test]
    fn test_higher_blocker_is_untouched() {
        let mut low = item("A", ItemType::Bug, "X", Priority::Low);
        low.dependencies = vec!["B".to_string()];
        let high = item("B", ItemType::Bug, "X", Priority::High);
        let out = cross_check(&[low, high]);
        assert_eq!(out[1].priority, Priority::High);
        assert!(!out[1].has_flag(FLAG_ESCALATED));
        assert!(out[1].has_flag(FLAG_BLOCKER));
    }

    #[test]
    fn test_idempotent() {
        let mut story = item("US-1", ItemType::UserStory, "Payments", Priority::Critical);
        story.dependencies = vec!["Payment gateway".to_string()];
        let mut gateway = item("F-1", ItemType::Feature, "Payments", Priority::Low);
        gateway.title = "Implement payment gateway failover".to_string();
        let spike = item("S-1", ItemType::Spike, "Payments", Priority::Low);

        let once = cross_check(&[story, gateway, spike]);
        let twice = cross_check(&once);
        assert_eq!(once, twice);
    }
}
