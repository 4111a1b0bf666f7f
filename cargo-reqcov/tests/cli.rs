//! Integration tests for the cargo-reqcov binary

use std::{
    path::Path,
    process::{
        Command,
        Output,
    },
};

use tempfile::TempDir;

const SPEC: &str = r#"
[REQ-1]
description = "reverse_string returns the reversed string"
priority = "high"

[REQ-1.features]
"F1.1" = "handles ASCII characters"

[REQ-2]
description = "reversing twice returns the original"
priority = "high"

[REQ-3]
description = "reverse_string handles empty strings"
priority = "medium"
"#;

const TAGS: &str = r#"
[tests.test_basic_reversal]
requirements = ["REQ-1"]
features = ["F1.1"]

[tests.test_double_reverse]
requirements = ["REQ-2"]
"#;

const EVENTS: &str = r#"{"test_id": "test_basic_reversal", "passed": true}
{"test_id": "test_double_reverse", "passed": true, "example": 0}
{"test_id": "test_double_reverse", "passed": true, "example": 1}
"#;

fn cargo_reqcov(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cargo-reqcov"))
        .args(args)
        .arg("--no-color")
        .current_dir(dir)
        .output()
        .expect("failed to run cargo-reqcov")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Workspace with a collected report in `reports/`
fn collected() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("requirements.toml"), SPEC).unwrap();
    std::fs::write(dir.path().join("tags.toml"), TAGS).unwrap();
    std::fs::write(dir.path().join("events.jsonl"), EVENTS).unwrap();

    let output = cargo_reqcov(
        dir.path(),
        &[
            "collect",
            "--spec",
            "requirements.toml",
            "--events",
            "events.jsonl",
            "--tags",
            "tags.toml",
            "--out-dir",
            "reports",
        ],
    );
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    dir
}

#[test]
fn collect_writes_all_reports() {
    let dir = collected();
    for name in ["report.json", "report.html", "report.md", "report_table.txt"] {
        assert!(dir.path().join("reports").join(name).exists(), "missing {}", name);
    }

    let json = std::fs::read_to_string(dir.path().join("reports/report.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["summary"]["verified_requirements"], 2);
    assert_eq!(value["summary"]["total_examples"], 3);
    assert_eq!(value["requirements"]["REQ-3"]["covered"], false);
}

#[test]
fn gate_fails_below_threshold() {
    let dir = collected();
    let output = cargo_reqcov(
        dir.path(),
        &["gate", "--report", "reports/report.json", "--min-verification", "95"],
    );

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("requirement verification 66.7% < 95%"));
    assert!(out.contains("Uncovered requirements (1):"));
    assert!(out.contains("REQ-3: reverse_string handles empty strings"));
}

#[test]
fn gate_passes_at_threshold() {
    let dir = collected();
    let output = cargo_reqcov(
        dir.path(),
        &["gate", "--report", "reports/report.json", "--min-verification", "60"],
    );

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("PASS - Verification 66.7% >= 60%"));
}

#[test]
fn gate_reads_thresholds_from_config() {
    let dir = collected();
    std::fs::write(dir.path().join("reqcov.toml"), "[gate]\nmin_verification = 50.0\n").unwrap();

    let output = cargo_reqcov(dir.path(), &["gate", "--report", "reports/report.json"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn missing_report_is_a_tool_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = cargo_reqcov(dir.path(), &["gate", "--report", "absent.json"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.json"));
}

#[test]
fn corrupt_report_is_a_tool_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("report.json"), "{ not json").unwrap();

    let output = cargo_reqcov(dir.path(), &["gate"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn render_to_stdout() {
    let dir = collected();
    let output = cargo_reqcov(
        dir.path(),
        &[
            "render",
            "--report",
            "reports/report.json",
            "--format",
            "markdown",
            "--title",
            "String utilities",
            "--stdout",
        ],
    );

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.starts_with("# String utilities"));
    assert!(out.contains("### ❌ REQ-3"));
}

#[test]
fn render_rejects_unknown_format() {
    let dir = collected();
    let output = cargo_reqcov(
        dir.path(),
        &["render", "--report", "reports/report.json", "--format", "pdf"],
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn uncovered_listing() {
    let dir = collected();
    let output = cargo_reqcov(dir.path(), &["uncovered", "--report", "reports/report.json"]);

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("❌ REQ-3 [medium]: reverse_string handles empty strings"));
    assert!(out.contains("✅ All features are covered!"));
}

#[test]
fn check_spec_reports_errors() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("good.toml"), SPEC).unwrap();
    std::fs::write(
        dir.path().join("bad.json"),
        r#"{"REQ-1": {"priority": "high"}}"#,
    )
    .unwrap();

    let output = cargo_reqcov(dir.path(), &["check-spec", "--spec", "good.toml"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("3 requirements, 1 features"));

    let output = cargo_reqcov(dir.path(), &["check-spec", "--spec", "bad.json"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed specification"));
}

#[test]
fn collect_reports_undecodable_event_lines() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("requirements.toml"), SPEC).unwrap();
    std::fs::write(
        dir.path().join("events.jsonl"),
        "{\"test_id\": \"test_basic_reversal\", \"requirement_ids\": [\"REQ-2\"], \"passed\": true}\n\
         {\"test_id\": \"test_bad\", \"requirement_ids\": [\"REQ-1\"], \"passed\": \"no\"}\n",
    )
    .unwrap();

    let output = cargo_reqcov(
        dir.path(),
        &[
            "collect",
            "--spec",
            "requirements.toml",
            "--events",
            "events.jsonl",
            "--out-dir",
            "reports",
        ],
    );
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("1 event line(s)"));

    let json = std::fs::read_to_string(dir.path().join("reports/report.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let diagnostics = value["diagnostics"].as_array().unwrap();
    let undecodable: Vec<_> = diagnostics
        .iter()
        .filter(|d| d["code"] == "undecodable-event")
        .collect();
    assert_eq!(undecodable.len(), 1);
    assert_eq!(undecodable[0]["severity"], "warning");
    assert_eq!(undecodable[0]["test"], "test_bad");
    assert!(undecodable[0]["message"].as_str().unwrap().contains("line 2"));

    let table = std::fs::read_to_string(dir.path().join("reports/report_table.txt")).unwrap();
    assert!(table.contains("undecodable-event"));
}

#[test]
fn gate_rejects_invalid_thresholds() {
    let dir = collected();

    for value in ["NaN", "150"] {
        let output = cargo_reqcov(
            dir.path(),
            &["gate", "--report", "reports/report.json", "--min-verification", value],
        );
        assert_eq!(output.status.code(), Some(2), "--min-verification {}", value);
        assert!(String::from_utf8_lossy(&output.stderr).contains("min_verification"));
        assert!(!stdout(&output).contains("PASS"));
    }

    std::fs::write(dir.path().join("reqcov.toml"), "[gate]\nmin_verification = nan\n").unwrap();
    let output = cargo_reqcov(dir.path(), &["gate", "--report", "reports/report.json"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("min_verification"));
}
