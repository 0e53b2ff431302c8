use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

fn temp_path(file_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("riti-{nanos}-{file_name}"))
}

fn run(store_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_riti"))
        .args(args)
        .env("RITI_STORE_PATH", store_path)
        .env("RITI_CONFIG_PATH", temp_path("absent-config.json"))
        .output()
        .expect("failed to run list command")
}

fn shifted(days: i64) -> String {
    (OffsetDateTime::now_utc() + Duration::days(days))
        .format(&Rfc3339)
        .expect("format date")
}

fn task(id: &str, title: &str, recurrence: &str, due_date: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "description": "fixture task",
        "recurrence": recurrence,
        "due_date": due_date,
        "reward": 10,
        "completed": false
    })
}

fn completed(id: &str, title: &str, recurrence: &str, due_date: &str) -> serde_json::Value {
    let mut value = task(id, title, recurrence, due_date);
    value["completed"] = serde_json::json!(true);
    value["completed_at"] = serde_json::json!("2025-01-01T08:00:00Z");
    value["proof_image"] = serde_json::json!("data:image/png;base64,AAAA");
    value
}

fn write_fixture(path: &Path) {
    let content = serde_json::json!({
        "schema_version": 1,
        "balance": 10,
        "tasks": [
            task("task-1", "far weekly", "weekly", &shifted(10)),
            task("task-2", "past daily", "daily", &shifted(-2)),
            completed("task-3", "done daily", "daily", &shifted(3)),
            task("task-4", "soon daily", "daily", &shifted(1)),
            task("task-5", "mid monthly", "monthly", &shifted(5)),
        ]
    });
    std::fs::write(path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

fn ids(stdout: &[u8]) -> Vec<String> {
    let printed: serde_json::Value = serde_json::from_slice(stdout).expect("json output");
    printed
        .as_array()
        .expect("json array")
        .iter()
        .map(|task| task["id"].as_str().expect("id").to_string())
        .collect()
}

#[test]
fn list_upcoming_json_is_sorted_and_pending_only() {
    let store_path = temp_path("cli-list-upcoming.json");
    write_fixture(&store_path);

    let output = run(&store_path, &["list", "upcoming", "--json"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert_eq!(ids(&output.stdout), vec!["task-4", "task-5", "task-1"]);
}

#[test]
fn list_daily_json_excludes_completed_tasks() {
    let store_path = temp_path("cli-list-daily.json");
    write_fixture(&store_path);

    let output = run(&store_path, &["list", "daily", "--json"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    assert_eq!(ids(&output.stdout), vec!["task-2", "task-4"]);
}

#[test]
fn list_completed_json_hides_proof_payload() {
    let store_path = temp_path("cli-list-completed.json");
    write_fixture(&store_path);

    let output = run(&store_path, &["list", "completed", "--json"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed[0]["id"], "task-3");
    assert_eq!(printed[0]["has_proof"], true);
    assert!(printed[0].get("proof_image").is_none());
}

#[test]
fn list_weekly_plain_text_renders_table() {
    let store_path = temp_path("cli-list-weekly.json");
    write_fixture(&store_path);

    let output = run(&store_path, &["list", "weekly"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("far weekly"));
    assert!(!stdout.contains("soon daily"));
    assert!(stdout.contains("TITLE"));
}

#[test]
fn list_all_plain_text_marks_overdue() {
    let store_path = temp_path("cli-list-all.json");
    write_fixture(&store_path);

    let output = run(&store_path, &["list", "all"]);
    std::fs::remove_file(&store_path).ok();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("past daily"));
    assert!(stdout.contains("overdue"));
    assert!(stdout.contains("completed"));
}

#[test]
fn list_on_empty_store_reports_no_tasks() {
    let store_path = temp_path("cli-list-empty.json");

    let output = run(&store_path, &["list", "monthly"]);

    assert!(output.status.success());
    assert!(!store_path.exists());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No tasks."));
}

#[test]
fn list_reports_corrupt_store() {
    let store_path = temp_path("cli-list-corrupt.json");
    std::fs::write(&store_path, "{ not json").unwrap();

    let output = run(&store_path, &["list", "all"]);
    std::fs::remove_file(&store_path).ok();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_data"));
}
