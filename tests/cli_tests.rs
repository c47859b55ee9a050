use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn groom_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("groom"));
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn run_json(temp_dir: &TempDir, extra: &[&str]) -> serde_json::Value {
    let output = groom_cmd()
        .arg("run")
        .arg(fixture("backlog.json"))
        .args(["--format", "json"])
        .args(extra)
        .current_dir(temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

fn item<'a>(result: &'a serde_json::Value, id: &str) -> &'a serde_json::Value {
    result["processedItems"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["id"] == id)
        .unwrap()
}

// =============================================================================
// Basic CLI
// =============================================================================

#[test]
fn test_help() {
    groom_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("backlog groomer"));
}

#[test]
fn test_version() {
    groom_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("groom"));
}

// =============================================================================
// Initialization
// =============================================================================

#[test]
fn test_init_creates_config() {
    let temp_dir = TempDir::new().unwrap();

    groom_cmd()
        .args(["init", "--velocity", "30", "--goal", "Improve user onboarding flow"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    let content = std::fs::read_to_string(temp_dir.path().join(".groom.yml")).unwrap();
    assert!(content.contains("velocity: 30"));
    assert!(content.contains("Improve user onboarding flow"));
}

#[test]
fn test_init_twice_needs_force() {
    let temp_dir = TempDir::new().unwrap();

    groom_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .success();

    groom_cmd()
        .arg("init")
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));

    groom_cmd()
        .args(["init", "--force"])
        .current_dir(temp_dir.path())
        .assert()
        .success();
}

#[test]
fn test_init_rejects_zero_velocity() {
    let temp_dir = TempDir::new().unwrap();

    groom_cmd()
        .args(["init", "--velocity", "0"])
        .current_dir(temp_dir.path())
        .assert()
        .failure();

    assert!(!temp_dir.path().join(".groom.yml").exists());
}

// =============================================================================
// Run
// =============================================================================

#[test]
fn test_run_json_result() {
    let temp_dir = TempDir::new().unwrap();
    let result = run_json(&temp_dir, &[]);

    assert_eq!(result["processedItems"].as_array().unwrap().len(), 4);
    assert_eq!(result["summary"]["totalItems"], 4);
    assert_eq!(result["summary"]["sprintReadyCount"], 3);
    let issues = result["summary"]["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["itemId"], "X-9");
    assert_eq!(issues[0]["kind"], "MalformedInputError");

    let bug = item(&result, "BUG-002");
    assert_eq!(bug["type"], "Bug");
    assert_eq!(bug["priority"], "Critical");
    assert_eq!(bug["epic"], "Checkout Flow");
}

#[test]
fn test_run_goal_raises_priority() {
    let temp_dir = TempDir::new().unwrap();
    let result = run_json(
        &temp_dir,
        &["--goal", "Improve user onboarding flow and reduce checkout abandonment"],
    );
    assert_eq!(item(&result, "US-001")["priority"], "High");
}

#[test]
fn test_run_uses_project_config() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join(".groom.yml"), "team:\n  velocity: 5\n").unwrap();

    let result = run_json(&temp_dir, &[]);
    assert_eq!(result["summary"]["sprintReadyCount"], 2);

    let story = item(&result, "US-001");
    assert!(
        story["flags"]
            .as_array()
            .unwrap()
            .iter()
            .any(|f| f == "Exceeds Sprint Capacity")
    );
}

#[test]
fn test_run_velocity_flag_overrides_config() {
    let temp_dir = TempDir::new().unwrap();
    let result = run_json(&temp_dir, &["--velocity", "5"]);
    assert_eq!(result["summary"]["sprintReadyCount"], 2);
}

#[test]
fn test_run_invalid_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("custom.yml");
    std::fs::write(&config_path, "scoring:\n  effort_scale: []\n").unwrap();

    groom_cmd()
        .arg("--config")
        .arg(&config_path)
        .arg("run")
        .arg(fixture("backlog.json"))
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_run_filter() {
    let temp_dir = TempDir::new().unwrap();
    let result = run_json(&temp_dir, &["--filter", "type:bug"]);
    let items = result["processedItems"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "BUG-002");
}

#[test]
fn test_run_invalid_filter_fails() {
    let temp_dir = TempDir::new().unwrap();

    groom_cmd()
        .arg("run")
        .arg(fixture("backlog.json"))
        .args(["--filter", "regex:[bad"])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid regex"));
}

#[test]
fn test_run_table_output() {
    let temp_dir = TempDir::new().unwrap();

    groom_cmd()
        .arg("run")
        .arg(fixture("backlog.yaml"))
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Groomed 4 items"))
        .stdout(predicate::str::contains("Fix checkout button failure on mobile / iPhone"))
        .stdout(predicate::str::contains("Summary:"));
}

#[test]
fn test_run_table_lists_issues() {
    let temp_dir = TempDir::new().unwrap();

    groom_cmd()
        .arg("run")
        .arg(fixture("backlog.json"))
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("MalformedInputError"))
        .stdout(predicate::str::contains("X-9"));
}

#[test]
fn test_run_csv_output() {
    let temp_dir = TempDir::new().unwrap();

    groom_cmd()
        .arg("run")
        .arg(fixture("backlog.csv"))
        .args(["--format", "csv"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "ID,Title,Type,Epic,Priority,Effort,ROI,Risk,Dependencies\n",
        ))
        .stdout(predicate::str::contains("BUG-002,"));
}

#[test]
fn test_run_digest_output() {
    let temp_dir = TempDir::new().unwrap();

    groom_cmd()
        .arg("run")
        .arg(fixture("backlog.json"))
        .args(["--format", "digest", "--top", "3"])
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Daily Grooming Digest"))
        .stdout(predicate::str::contains("Top 3 Items for Grooming Discussion"))
        .stdout(predicate::str::contains("Recommendation"));
}

#[test]
fn test_run_recommend() {
    let temp_dir = TempDir::new().unwrap();
    let result = run_json(&temp_dir, &["--recommend"]);
    let plan = &result["sprintPlan"];
    assert_eq!(plan["velocity"], 45);
    assert!(plan["committedEffort"].as_u64().unwrap() <= 45);
    assert_eq!(plan["picks"][0]["id"], "BUG-002");

    groom_cmd()
        .arg("run")
        .arg(fixture("backlog.json"))
        .arg("--recommend")
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Next sprint:"));
}

#[test]
fn test_run_push_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let tracker = temp_dir.path().join("tracker");

    groom_cmd()
        .arg("run")
        .arg(fixture("backlog.json"))
        .arg("--push-dir")
        .arg(&tracker)
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("4 created"));

    groom_cmd()
        .arg("run")
        .arg(fixture("backlog.json"))
        .arg("--push-dir")
        .arg(&tracker)
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0 created, 0 updated, 4 unchanged"));

    assert!(tracker.join("groom-BUG-002.json").exists());
    assert_eq!(std::fs::read_dir(&tracker).unwrap().count(), 4);
}

#[test]
fn test_run_failure_reports_stage() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("broken.json");
    std::fs::write(&input, r#"[{"id":"A","title":"","description":""},{"title":"no id"}]"#)
        .unwrap();

    groom_cmd()
        .arg("run")
        .arg(&input)
        .args(["--format", "json"])
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"failedStage\": \"Clustering\""))
        .stdout(predicate::str::contains("\"errorKind\": \"EmptyInput\""))
        .stderr(predicate::str::contains("Pipeline failed at stage Clustering"));
}

#[test]
fn test_run_generate_ids_rescues_records() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("noids.json");
    std::fs::write(
        &input,
        r#"[{"title":"button broken mobile","description":"checkout not working on iphone"}]"#,
    )
    .unwrap();

    let output = groom_cmd()
        .arg("run")
        .arg(&input)
        .args(["--format", "json", "--generate-ids"])
        .current_dir(temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let id = result["processedItems"][0]["id"].as_str().unwrap();
    assert!(id.starts_with("RAW-"));
}

#[test]
fn test_run_unsupported_format() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("backlog.txt");
    std::fs::write(&input, "whatever").unwrap();

    groom_cmd()
        .arg("run")
        .arg(&input)
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported input format"));
}

// =============================================================================
// Source
// =============================================================================

#[test]
fn test_source_shows_original_and_groomed() {
    let temp_dir = TempDir::new().unwrap();

    groom_cmd()
        .arg("source")
        .arg(fixture("backlog.json"))
        .arg("BUG-002")
        .current_dir(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("button broken mobile"))
        .stdout(predicate::str::contains("checkout not working on iphone"))
        .stdout(predicate::str::contains("Fix checkout button failure on mobile / iPhone"));
}

#[test]
fn test_source_json() {
    let temp_dir = TempDir::new().unwrap();

    let output = groom_cmd()
        .arg("source")
        .arg(fixture("backlog.json"))
        .arg("US-001")
        .arg("--json")
        .current_dir(temp_dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["source"]["title"], "onboarding thing");
    assert_eq!(result["processedItems"][0]["epic"], "User Onboarding");
}

#[test]
fn test_source_not_found() {
    let temp_dir = TempDir::new().unwrap();

    groom_cmd()
        .arg("source")
        .arg(fixture("backlog.json"))
        .arg("X-9")
        .current_dir(temp_dir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("MalformedInputError"))
        .stderr(predicate::str::contains("Item not found: X-9"));
}
