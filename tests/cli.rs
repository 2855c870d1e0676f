mod common;

use assert_cmd::Command;
use common::{TestWorkspace, fixture_path};
use predicates::str::contains;
use serde_json::Value;

fn table_repair() -> Command {
    Command::cargo_bin("table-repair").expect("binary exists")
}

#[test]
fn compare_reports_score_and_findings() {
    let workspace = TestWorkspace::new();
    let generated = workspace.write("generated.csv", "A,1\nB,2\n");
    let groundtruth = workspace.write("groundtruth.csv", "A,1\nB,3\n");

    table_repair()
        .args([
            "compare",
            "-g",
            generated.to_str().unwrap(),
            "-t",
            groundtruth.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("Score: 0.7500"))
        .stdout(contains("generated-only"))
        .stdout(contains("missing"));
}

#[test]
fn compare_normalizes_formatted_numbers_in_tsv() {
    table_repair()
        .args([
            "compare",
            "-g",
            fixture_path("formatted_generated.tsv").to_str().unwrap(),
            "-t",
            fixture_path("formatted_groundtruth.tsv").to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("Score: 1.0000"))
        .stdout(contains("No mismatches found."));
}

#[test]
fn repair_emits_json_report_and_writes_table() {
    let workspace = TestWorkspace::new();
    let output = workspace.path().join("repaired.csv");

    let assert = table_repair()
        .args([
            "repair",
            "-g",
            fixture_path("fragmented_generated.csv").to_str().unwrap(),
            "-t",
            fixture_path("fragmented_groundtruth.csv").to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--format",
            "json",
        ])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let report: Value = serde_json::from_str(&stdout).expect("json report");
    assert_eq!(report["final_score"]["score"], 1.0);
    assert_eq!(report["operations"][0]["operation"], "merge");
    assert_eq!(report["repaired"][1][1], "10 0");

    let written = workspace.read("repaired.csv");
    assert_eq!(
        written,
        "\"Item\",\"Q1\",\"Q2\"\n\"Revenue\",\"10 0\",\"\"\n\"Cost\",\"40\",\"\"\n"
    );
}

#[test]
fn repair_text_lists_committed_operations() {
    let workspace = TestWorkspace::new();
    let generated = workspace.write("generated.csv", "A,1\nB,2\n");
    let groundtruth = workspace.write("groundtruth.csv", "A,1\nB,3\n");

    table_repair()
        .args([
            "repair",
            "-g",
            generated.to_str().unwrap(),
            "-t",
            groundtruth.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("clear (1, 1)"))
        .stdout(contains("add_value_in_empty_cell (1, 1) -> (1, 1)"))
        .stdout(contains("Final score: 1.0000"));
}

#[test]
fn repair_applies_edit_instructions_first() {
    let workspace = TestWorkspace::new();
    let generated = workspace.write("generated.csv", "Item,Q1\nRevenue,999\n");
    let groundtruth = workspace.write("groundtruth.csv", "Item,Q1\nRevenue,100\n");
    let edits = workspace.write(
        "edits.json",
        r#"[{"fileName": "generated.csv", "action": "edit", "details": {"row": 1, "col": 1, "oldVal": "999", "newVal": "100"}}]"#,
    );

    table_repair()
        .args([
            "repair",
            "-g",
            generated.to_str().unwrap(),
            "-t",
            groundtruth.to_str().unwrap(),
            "--edits",
            edits.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("Initial score: 1.0000"))
        .stdout(contains("No operations applied."));
}

#[test]
fn config_file_rejects_unknown_keys() {
    let workspace = TestWorkspace::new();
    let generated = workspace.write("generated.csv", "A\n");
    let config = workspace.write("repair.yml", "max_iterationz: 3\n");

    table_repair()
        .args([
            "compare",
            "-g",
            generated.to_str().unwrap(),
            "-t",
            generated.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn missing_input_fails_with_context() {
    table_repair()
        .args(["compare", "-g", "does-not-exist.csv", "-t", "neither.csv"])
        .assert()
        .failure()
        .stderr(contains("error: Loading table"));
}

#[test]
fn edit_writes_edited_copies() {
    let workspace = TestWorkspace::new();
    workspace.write("table_4.csv", "Item,Q1,Q2\nRevenue,10,12\nCost,4,5\n");
    let instructions = workspace.write(
        "instructions.json",
        r#"[
            {"fileName": "table_4.csv", "action": "remove_row", "details": {"index": 2}},
            {"fileName": "table_4.csv", "action": "merge", "details": {"index": 1, "isRow": false}},
            {"fileName": "table_4.csv", "action": "explode", "details": {}}
        ]"#,
    );
    let output = workspace.path().join("out");

    table_repair()
        .args([
            "edit",
            "-i",
            workspace.path().to_str().unwrap(),
            "-j",
            instructions.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let edited = std::fs::read_to_string(output.join("table_4_edited.csv")).expect("edited csv");
    assert_eq!(edited, "\"Item\",\"Q1_Q2\"\n\"Revenue\",\"10 12\"\n");
}

#[test]
fn batch_writes_one_result_per_variant() {
    let workspace = TestWorkspace::new();
    workspace.write("table_4.csv", "A,1\nB,3\n");
    workspace.write("table_4_1.csv", "A,1\nB,2\n");
    workspace.write("table_4_2.csv", "A,1\nB,3\n");
    let results = workspace.path().join("results.csv");

    table_repair()
        .args([
            "batch",
            "-f",
            workspace.path().to_str().unwrap(),
            "-o",
            results.to_str().unwrap(),
        ])
        .assert()
        .success();

    let mut reader = csv::Reader::from_path(&results).expect("results csv");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec![
            "generate_file",
            "groundtruth_file",
            "initial_score",
            "best_score",
            "operations",
            "operation_log"
        ]
    );
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("record")).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0][0], "table_4_1.csv");
    assert_eq!(&records[0][1], "table_4.csv");
    assert_eq!(&records[0][3], "1.0");
    assert_eq!(&records[0][4], "2");
    assert_eq!(&records[1][4], "0");
}

#[test]
fn distance_counts_row_and_cell_edits() {
    let workspace = TestWorkspace::new();
    let generated = workspace.write("generated.csv", "A,\"1,234.0\"\nC,3\n");
    let groundtruth = workspace.write("groundtruth.csv", "A,1234\nB,2\nC,3\n");

    table_repair()
        .args([
            "distance",
            "-g",
            generated.to_str().unwrap(),
            "-t",
            groundtruth.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout("2\n");

    table_repair()
        .args([
            "distance",
            "-g",
            generated.to_str().unwrap(),
            "-t",
            groundtruth.to_str().unwrap(),
            "--ignore-comma",
        ])
        .assert()
        .success()
        .stdout("1\n");
}
