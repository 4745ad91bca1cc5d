mod support;

use std::fs;

use predicates::str::contains;
use serde_json::Value;

use support::{lb_cmd, TestData};

#[test]
fn lb_help_works() {
    lb_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("kanban"));
}

#[test]
fn subcommand_help_works() {
    let subcommands = [
        "init", "add", "edit", "mv", "reorder", "rm", "ls", "show", "search", "archive",
        "calendar", "schedule", "done", "today", "upcoming", "export", "import",
    ];

    for cmd in subcommands {
        lb_cmd().arg(cmd).arg("--help").assert().success();
    }
}

#[test]
fn init_seeds_once() {
    let data = TestData::new();

    let first = data.json(&["init"]);
    assert_eq!(first["created_config"], true);
    assert_eq!(first["tasks"]["seeded"], true);
    assert!(data.file("tasks.json").exists());
    assert!(data.file("lifeboard.toml").exists());

    let second = data.json(&["init"]);
    assert_eq!(second["created_config"], false);
    assert_eq!(second["tasks"]["seeded"], false);

    data.lb()
        .arg("init")
        .assert()
        .success()
        .stdout(contains("nothing to do"));
}

#[test]
fn add_then_board_lists_the_task() {
    let data = TestData::new();
    let added = data.json(&["add", "Write cover letter", "--parent", "career", "--status", "doing"]);
    let id = added["task"]["id"].as_str().expect("id").to_string();
    assert_eq!(added["task"]["status"], "IN_PROGRESS");
    assert_eq!(added["breadcrumb"], "Root › Career › Write cover letter");

    let board = data.json(&["ls", "career"]);
    let columns = board["columns"].as_array().expect("columns");
    assert_eq!(columns.len(), 4);
    let in_progress: Vec<&str> = columns[1]["tasks"]
        .as_array()
        .expect("tasks")
        .iter()
        .filter_map(|t| t["id"].as_str())
        .collect();
    assert_eq!(in_progress, vec!["c1", id.as_str()]);

    data.lb()
        .args(["show", &id])
        .assert()
        .success()
        .stdout(contains("Write cover letter"));
}

#[test]
fn dashboard_at_the_top_level() {
    let data = TestData::new();
    let dashboard = data.json(&["ls"]);
    let areas = dashboard["areas"].as_array().expect("areas");
    assert_eq!(areas.len(), 6);
    assert_eq!(areas[0]["area"]["id"], "career");
    assert_eq!(areas[0]["counts"]["in_progress"], 1);
    assert_eq!(dashboard["primary"], "career");
}

#[test]
fn cycle_is_rejected_with_exit_code_3() {
    let data = TestData::new();
    let output = data
        .lb()
        .args(["--json", "mv", "career", "--parent", "c1"])
        .output()
        .expect("run lb");
    assert_eq!(output.status.code(), Some(3));

    let envelope: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["command"], "mv");
    assert_eq!(envelope["error"]["kind"], "rejected");
    assert_eq!(envelope["error"]["details"]["task_id"], "career");
}

#[test]
fn unknown_task_exits_with_code_2() {
    let data = TestData::new();
    data.lb()
        .args(["rm", "nope"])
        .assert()
        .code(2)
        .stderr(contains("Task not found"));

    data.lb()
        .args(["add", "   ", "--parent", "career"])
        .assert()
        .code(2)
        .stderr(contains("Invalid title"));
}

#[test]
fn rm_cascades() {
    let data = TestData::new();
    let removed = data.json(&["rm", "career"]);
    let mut deleted: Vec<&str> = removed["deleted"]
        .as_array()
        .expect("deleted")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    deleted.sort();
    assert_eq!(deleted, vec!["c1", "c2", "career"]);

    let found = data.json(&["search", "resume"]);
    assert!(found["results"].as_array().expect("results").is_empty());
}

#[test]
fn reorder_and_search() {
    let data = TestData::new();
    let added = data.json(&["add", "Polish portfolio", "--parent", "career"]);
    let id = added["task"]["id"].as_str().expect("id").to_string();
    data.json(&["reorder", &id, "c2", "c1", "--status", "not_started"]);

    let board = data.json(&["ls", "career"]);
    let column = |index: usize| -> Vec<String> {
        board["columns"][index]["tasks"]
            .as_array()
            .expect("tasks")
            .iter()
            .filter_map(|t| t["id"].as_str().map(str::to_string))
            .collect()
    };
    assert_eq!(column(0), vec![id, "c2".to_string()]);
    assert_eq!(column(1), vec!["c1".to_string()]);

    let found = data.json(&["search", "BUDGET review"]);
    assert_eq!(found["results"][0]["task"]["id"], "f1");
    assert_eq!(found["results"][0]["breadcrumb"], "Root › Finances › Budget Review");
}

#[test]
fn export_import_round_trip() {
    let source = TestData::new();
    source.json(&["add", "Call plumber", "--parent", "home", "--due", "2030-01-15"]);
    let export_path = source.file("export.json");
    let exported = source.json(&["export", "--output", export_path.to_str().expect("utf8")]);
    assert_eq!(exported["count"], 12);

    let target = TestData::new();
    let imported = target.json(&["import", export_path.to_str().expect("utf8")]);
    assert_eq!(imported["count"], 12);

    let original = fs::read_to_string(&export_path).expect("read export");
    let second_path = target.file("again.json");
    target.json(&["export", "--output", second_path.to_str().expect("utf8")]);
    assert_eq!(fs::read_to_string(&second_path).expect("read export"), original);
}

#[test]
fn calendar_item_appears_today() {
    let data = TestData::new();
    let added = data.json(&["add", "Dentist", "--calendar"]);
    let id = added["task"]["id"].as_str().expect("id").to_string();
    assert_eq!(added["task"]["calendar_only"], true);

    let today = data.json(&["today"]);
    assert_eq!(today["calendar_items"][0]["id"], id.as_str());

    let done = data.json(&["done", &id]);
    assert_eq!(done["deleted"], true);
    let today = data.json(&["today"]);
    assert!(today["calendar_items"].as_array().expect("items").is_empty());
}

#[test]
fn events_are_written_as_jsonl() {
    let data = TestData::new();
    let events_path = data.file("events.jsonl");
    data.lb()
        .args(["--events", events_path.to_str().expect("utf8"), "add", "Read", "--parent", "learning"])
        .assert()
        .success();

    let content = fs::read_to_string(&events_path).expect("events");
    let kinds: Vec<String> = content
        .lines()
        .map(|line| {
            let event: Value = serde_json::from_str(line).expect("json line");
            event["event"].as_str().expect("event").to_string()
        })
        .collect();
    assert_eq!(kinds, vec!["store_loaded", "task_created"]);
}

#[test]
fn upcoming_accepts_the_widest_window() {
    let data = TestData::new();
    data.json(&["add", "Renew passport", "--parent", "home", "--due", "2099-06-01"]);
    let upcoming = data.json(&["upcoming", "--days", "4294967295"]);
    assert_eq!(upcoming["tasks"][0]["title"], "Renew passport");
}
