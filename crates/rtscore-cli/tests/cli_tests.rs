//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const GOLD: &str = "SHEPHARD, REDCROSS 1, at Medical Bay, request clearance to proceed to Fuel Area via Service Road ONE.";

fn rtscore() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("rtscore").unwrap()
}

fn write_request(dir: &Path, transcript: &str, difficulty: &str, parameters: Option<&str>) -> PathBuf {
    let mut request = serde_json::json!({
        "transcript": transcript,
        "expected": GOLD,
        "difficulty": difficulty,
        "context": {
            "expectedReceiver": "SHEPHARD",
            "expectedSender": "REDCROSS 1",
            "requiresLocation": true
        }
    });
    if let Some(p) = parameters {
        request["parameters"] = serde_json::from_str(p).unwrap();
    }
    let path = dir.join("request.json");
    std::fs::write(&path, serde_json::to_string(&request).unwrap()).unwrap();
    path
}

fn stdout_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("stdout should be JSON")
}

#[test]
fn score_perfect_readback() {
    let dir = TempDir::new().unwrap();
    let request = write_request(dir.path(), GOLD, "hard", None);

    let output = rtscore()
        .arg("score")
        .arg("--request")
        .arg(&request)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output.stdout);
    assert_eq!(json["structure"]["score"], 30);
    assert_eq!(json["accuracy"]["score"], 50);
    assert_eq!(json["fluency"]["score"], 20);
    assert_eq!(json["total"], 100);
}

#[test]
fn score_filler_allowance() {
    let dir = TempDir::new().unwrap();
    let transcript = "SHEPHARD, um, REDCROSS 1, uh, at Medical Bay, request clearance to proceed to Fuel Area via Service Road ONE.";

    let lenient = write_request(
        dir.path(),
        transcript,
        "hard",
        Some(r#"{"werThreshold": 15, "fillerPenalty": 1, "maxAllowedFillers": 2, "pauseTolerance": 1}"#),
    );
    let output = rtscore().args(["score", "--request"]).arg(&lenient).output().unwrap();
    assert_eq!(stdout_json(&output.stdout)["fluency"]["score"], 20);

    let strict = write_request(
        dir.path(),
        transcript,
        "hard",
        Some(r#"{"werThreshold": 15, "fillerPenalty": 1, "maxAllowedFillers": 0, "pauseTolerance": 1}"#),
    );
    let output = rtscore().args(["score", "--request"]).arg(&strict).output().unwrap();
    let json = stdout_json(&output.stdout);
    assert_eq!(json["fluency"]["score"], 18);
    assert_eq!(json["fluency"]["fillersDetected"], serde_json::json!(["um", "uh"]));
}

#[test]
fn score_reads_stdin() {
    let request = serde_json::json!({
        "transcript": "REDCROSS 1, SHEPHARD, at Medical Bay, request clearance to proceed to Fuel Area via Service Road ONE.",
        "expected": GOLD,
        "difficulty": "medium",
        "context": { "expectedReceiver": "SHEPHARD", "expectedSender": "REDCROSS 1", "requiresLocation": true }
    });

    let output = rtscore()
        .args(["score", "--request", "-"])
        .write_stdin(request.to_string())
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output.stdout);
    assert_eq!(json["structure"]["receiverCorrect"], false);
    assert_eq!(json["structure"]["senderCorrect"], false);
    assert_eq!(json["structure"]["score"], 10);
}

#[test]
fn score_text_format() {
    let dir = TempDir::new().unwrap();
    let request = write_request(dir.path(), "SHEPHARD, REDCROSS 1, request clearance", "easy", None);

    rtscore()
        .args(["score", "--format", "text", "--request"])
        .arg(&request)
        .assert()
        .success()
        .stdout(predicate::str::contains("Total:"))
        .stdout(predicate::str::contains("Missing:"))
        .stdout(predicate::str::contains("FUEL AREA"));
}

#[test]
fn score_unknown_difficulty_scores_as_medium() {
    let dir = TempDir::new().unwrap();
    let request = write_request(dir.path(), GOLD, "expert", None);

    let output = rtscore().args(["score", "--request"]).arg(&request).output().unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output.stdout);
    // Medium never reports a WER.
    assert!(json["accuracy"].get("werScore").is_none());
    assert_eq!(json["total"], 100);
}

#[test]
fn score_rejects_out_of_range_parameters() {
    let dir = TempDir::new().unwrap();
    let request = write_request(
        dir.path(),
        GOLD,
        "hard",
        Some(r#"{"werThreshold": 150, "fillerPenalty": 1, "maxAllowedFillers": 0, "pauseTolerance": 1}"#),
    );

    rtscore()
        .args(["score", "--request"])
        .arg(&request)
        .assert()
        .failure()
        .stderr(predicate::str::contains("werThreshold"));
}

#[test]
fn score_uses_config_defaults() {
    let dir = TempDir::new().unwrap();
    let transcript = "SHEPHARD, um, REDCROSS 1, at Medical Bay, request clearance to proceed to Fuel Area via Service Road ONE.";
    let request = write_request(dir.path(), transcript, "hard", None);
    let config = dir.path().join("rtscore.toml");
    std::fs::write(
        &config,
        "[defaults.hard]\nwer_threshold = 15.0\nfiller_penalty = 5.0\nmax_allowed_fillers = 0\npause_tolerance = 1.0\n",
    )
    .unwrap();

    let output = rtscore()
        .args(["score", "--request"])
        .arg(&request)
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output.stdout)["fluency"]["score"], 15);
}

#[test]
fn validate_drill_set() {
    rtscore()
        .arg("validate")
        .arg("--drill-set")
        .arg("../../drill-sets/ground-ops.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("5 drills"))
        .stdout(predicate::str::contains("All drill sets valid"));
}

#[test]
fn validate_directory() {
    rtscore()
        .arg("validate")
        .arg("--drill-set")
        .arg("../../drill-sets")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ground Operations"))
        .stdout(predicate::str::contains("Emergency Calls"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[drill_set]
id = "broken"
name = "Broken"

[[drills]]
id = "d1"
name = "No transcript"
expected = "TOWER, UNIT 4, request taxi"
[drills.context]
expected_receiver = "TOWER"
expected_sender = "UNIT 9"
"#,
    )
    .unwrap();

    rtscore()
        .arg("validate")
        .arg("--drill-set")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[d1] WARNING: no transcript"))
        .stdout(predicate::str::contains("UNIT 9"))
        .stdout(predicate::str::contains("2 warning(s) found"));
}

#[test]
fn validate_nonexistent_file() {
    rtscore()
        .arg("validate")
        .arg("--drill-set")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn run_json_report() {
    let output = rtscore()
        .args(["run", "--format", "json", "--drill-set", "../../drill-sets/emergency.toml"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output.stdout);
    assert_eq!(json["drill_set"]["id"], "emergency");
    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["drill_id"], "pan-pan");
    assert_eq!(results[0]["result"]["total"], 100);
    assert_eq!(results[2]["drill_id"], "radio-check");
    assert_eq!(results[2]["result"]["total"], 100);
    assert!(results[1]["result"]["fluency"]["score"].as_u64().unwrap() < 20);
    assert_eq!(json["stats"]["overall"]["count"], 3);
}

#[test]
fn run_text_summary_with_filter() {
    rtscore()
        .args(["run", "--drill-set", "../../drill-sets/ground-ops.toml", "--filter", "runway"])
        .assert()
        .success()
        .stdout(predicate::str::contains("runway-crossing"))
        .stdout(predicate::str::contains("fuel-run").not());
}

#[test]
fn run_with_feedback() {
    rtscore()
        .args(["run", "--feedback", "--drill-set", "../../drill-sets/emergency.toml", "--filter", "routine"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[radio-check]"))
        .stdout(predicate::str::contains("Scored 100/100"));
}

#[test]
fn run_then_compare() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("sessions");

    rtscore()
        .args(["run", "--drill-set", "../../drill-sets/ground-ops.toml", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Results saved to"));

    let report = std::fs::read_dir(&out)
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();

    rtscore()
        .arg("compare")
        .arg("--baseline")
        .arg(&report)
        .arg("--current")
        .arg(&report)
        .arg("--fail-on-regression")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 regressions"))
        .stdout(predicate::str::contains("5 unchanged"));
}

#[test]
fn compare_nonexistent_report() {
    rtscore()
        .args(["compare", "--baseline", "nope.json", "--current", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read report"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    rtscore()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created rtscore.toml"))
        .stdout(predicate::str::contains("Created drill-sets/example.toml"));

    assert!(dir.path().join("rtscore.toml").exists());

    // The generated files are usable straight away.
    rtscore()
        .current_dir(dir.path())
        .args(["validate", "--drill-set", "drill-sets/example.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 drills"));

    rtscore()
        .current_dir(dir.path())
        .args(["run", "--drill-set", "drill-sets/example.toml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("fuel-run"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("rtscore.toml"), "parallelism = 1\n").unwrap();

    rtscore()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("rtscore.toml already exists"));

    let content = std::fs::read_to_string(dir.path().join("rtscore.toml")).unwrap();
    assert_eq!(content, "parallelism = 1\n");
}

#[test]
fn help_output() {
    rtscore()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("radio-telephony"));
}

#[test]
fn version_output() {
    rtscore()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("rtscore"));
}
