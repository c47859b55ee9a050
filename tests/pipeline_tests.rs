use groom::config::GroomConfig;
use groom::ingest::read_records;
use groom::model::{IssueKind, ItemType, Priority, ProcessedItem, RawRecord};
use groom::pipeline::crosscheck::cross_check;
use groom::pipeline::{Pipeline, RunFailure, RunReport, Stage};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const GOAL: &str = "Improve user onboarding flow and reduce checkout abandonment";

fn fixture(name: &str) -> Vec<RawRecord> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    read_records(&path).unwrap()
}

fn run(records: &[RawRecord]) -> RunReport {
    let config = GroomConfig::default();
    Pipeline::new(&config).run(records).unwrap()
}

fn item<'a>(report: &'a RunReport, id: &str) -> &'a ProcessedItem {
    report
        .items
        .iter()
        .find(|i| i.id == id)
        .unwrap_or_else(|| panic!("no item {}", id))
}

fn by_id(items: &[ProcessedItem]) -> BTreeMap<String, ProcessedItem> {
    items.iter().map(|i| (i.id.clone(), i.clone())).collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_onboarding_and_checkout_scenario() {
    let records = vec![
        RawRecord::new("US-001", "onboarding thing")
            .with_description("users confused about app, need help"),
        RawRecord::new("BUG-002", "button broken mobile")
            .with_description("checkout not working on iphone"),
    ];
    let report = run(&records);

    let story = item(&report, "US-001");
    let bug = item(&report, "BUG-002");
    assert_eq!(story.epic, "User Onboarding");
    assert_eq!(bug.epic, "Checkout Flow");
    assert_eq!(story.item_type, ItemType::UserStory);
    assert_eq!(bug.item_type, ItemType::Bug);
    assert_eq!(bug.priority, Priority::Critical);
    assert!(bug.effort <= story.effort);
    assert_eq!(report.items[0].id, "BUG-002");
}

#[test]
fn test_malformed_record_is_reported_not_emitted() {
    let report = run(&fixture("backlog.json"));

    assert!(report.items.iter().all(|i| i.source_id != "X-9"));
    assert!(report.source("X-9").is_none());
    let issue = report
        .summary
        .issues
        .iter()
        .find(|i| i.item_id == "X-9")
        .unwrap();
    assert_eq!(issue.kind, IssueKind::MalformedInput);
}

#[test]
fn test_goals_raise_onboarding_story() {
    let config = GroomConfig::default();
    let report = Pipeline::new(&config)
        .with_goals(vec![GOAL.to_string()])
        .run(&fixture("backlog.json"))
        .unwrap();
    assert_eq!(item(&report, "US-001").priority, Priority::High);
    assert_eq!(item(&report, "BUG-002").priority, Priority::Critical);
}

#[test]
fn test_fixture_items_are_rewritten() {
    let report = run(&fixture("backlog.json"));
    assert_eq!(
        item(&report, "BUG-002").title,
        "Fix checkout button failure on mobile / iPhone"
    );
    assert_eq!(item(&report, "FEAT-003").epic, "Personalization");
    assert_eq!(item(&report, "SPIKE-004").item_type, ItemType::Spike);
    assert_eq!(item(&report, "SPIKE-004").epic, "Payments");
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn test_every_usable_record_is_accounted_for() {
    let records = fixture("backlog.json");
    let report = run(&records);

    for record in &records {
        let id = record.id.as_deref().unwrap();
        let produced = !report.items_from(id).is_empty();
        let reported = report.summary.issues.iter().any(|i| i.item_id == id);
        assert!(produced || reported, "{} vanished", id);
    }
    assert_eq!(report.summary.total_items, report.items.len());
}

#[test]
fn test_epics_partition_sources() {
    let report = run(&fixture("backlog.json"));

    let mut seen = BTreeSet::new();
    for epic in &report.epics {
        assert!(!epic.member_ids.is_empty());
        for id in &epic.member_ids {
            assert!(seen.insert(id.clone()), "{} is in two epics", id);
        }
    }
    let sources: BTreeSet<String> = report.sources.iter().map(|s| s.id.clone()).collect();
    assert_eq!(seen, sources);

    for item in &report.items {
        let epic = report.epics.iter().find(|e| e.name == item.epic).unwrap();
        assert!(epic.contains(&item.source_id));
    }
}

#[test]
fn test_items_are_well_formed() {
    let report = run(&fixture("backlog.json"));
    for item in &report.items {
        assert!(item.acceptance.len() >= 2, "{} has thin acceptance", item.id);
        assert!(item.roi <= 100);
        assert!(item.ai_generated);
        let raw = report.source(&item.source_id).unwrap();
        assert_ne!(item.title.to_lowercase(), raw.title.to_lowercase());
    }
}

#[test]
fn test_runs_are_deterministic() {
    let records = fixture("backlog.json");
    assert_eq!(run(&records), run(&records));

    let mut config = GroomConfig::default();
    config.pipeline.parallel = false;
    let sequential = Pipeline::new(&config).run(&records).unwrap();
    assert_eq!(run(&records), sequential);
}

#[test]
fn test_decomposed_ids_never_collide_with_batch_ids() {
    let records = vec![
        RawRecord::new("A", "misc requests").with_description(
            "- export invoices as pdf files\n- password reset email never arrives",
        ),
        RawRecord::new("A-1", "dark mode toggle"),
    ];
    let report = run(&records);

    let ids: BTreeSet<&str> = report.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids.len(), report.items.len());
    assert_eq!(report.items_from("A").len(), 2);
    assert!(report.items_from("A").iter().all(|i| i.id != "A-1"));
    assert_eq!(item(&report, "A-1").source_id, "A-1");
}

#[test]
fn test_cross_check_is_idempotent_on_output() {
    let report = run(&fixture("backlog.json"));
    assert_eq!(cross_check(&report.items), report.items);
}

#[test]
fn test_goals_never_lower_priority() {
    let records = fixture("backlog.json");
    let config = GroomConfig::default();
    let plain = by_id(&Pipeline::new(&config).run(&records).unwrap().items);
    let boosted = by_id(
        &Pipeline::new(&config)
            .with_goals(vec![GOAL.to_string(), "ship new payment options".to_string()])
            .run(&records)
            .unwrap()
            .items,
    );
    for (id, item) in &plain {
        assert!(boosted[id].priority >= item.priority, "{} was lowered", id);
    }
}

#[test]
fn test_output_is_ordered_strategically() {
    let report = run(&fixture("backlog.json"));
    for pair in report.items.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(a.priority > b.priority || (a.priority == b.priority && a.roi >= b.roi));
    }
}

// =============================================================================
// Inputs and failures
// =============================================================================

#[test]
fn test_input_formats_agree() {
    let from_json = by_id(&run(&fixture("backlog.json")).items);
    let from_yaml = by_id(&run(&fixture("backlog.yaml")).items);
    let from_csv = by_id(&run(&fixture("backlog.csv")).items);
    assert_eq!(from_json, from_yaml);
    assert_eq!(from_json, from_csv);
}

#[test]
fn test_unusable_batch_fails_without_partial_result() {
    let config = GroomConfig::default();
    let records = vec![RawRecord::default(), RawRecord::new("X-1", "")];
    let err = Pipeline::new(&config).run(&records).unwrap_err();
    let failure = RunFailure::from_error(&err);
    assert_eq!(failure.failed_stage, Stage::Clustering);
    assert_eq!(failure.error_kind, "EmptyInput");

    let json = serde_json::to_value(&failure).unwrap();
    assert_eq!(json["failedStage"], "Clustering");
    assert_eq!(json["errorKind"], "EmptyInput");
}
