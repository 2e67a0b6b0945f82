use assert_cmd::Command;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

// Runs the binary against a throwaway database with config lookups pointed
// into the temp dir so the real user config is never read.
fn typemaster(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("typemaster").unwrap();
    cmd.env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join("config"))
        .arg("--db")
        .arg(dir.join("stats.db"))
        .arg("--user")
        .arg("tester");
    cmd
}

fn json_output(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn words_respects_count() {
    let dir = TempDir::new().unwrap();
    let words = json_output(typemaster(dir.path()).args(["words", "-n", "4", "-d", "easy"]));
    assert_eq!(words.as_array().unwrap().len(), 4);
}

#[test]
fn text_prints_something() {
    let dir = TempDir::new().unwrap();
    let output = typemaster(dir.path())
        .args(["text", "--difficulty", "hard"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(!String::from_utf8(output).unwrap().trim().is_empty());
}

#[test]
fn unknown_lesson_gives_placeholder() {
    let dir = TempDir::new().unwrap();
    let lesson = json_output(typemaster(dir.path()).args(["lesson", "42"]));
    assert_eq!(lesson["title"], "Lesson Not Found");
}

#[test]
fn submit_reads_stdin_and_updates_progress() {
    let dir = TempDir::new().unwrap();
    let submission = r#"{
        "original_text": "the cat sat",
        "typed_text": "the cat sit",
        "time_taken": 6.0
    }"#;

    let report = json_output(
        typemaster(dir.path())
            .args(["submit", "-"])
            .write_stdin(submission),
    );
    assert_eq!(report["wpm"], 22.0);
    assert_eq!(report["accuracy"], 90.91);
    assert_eq!(report["error_analysis"]["character_errors"]["a->i"], 1);

    let progress = json_output(typemaster(dir.path()).arg("progress"));
    assert_eq!(progress["tests_taken"], 1);
    assert_eq!(progress["error_statistics"]["total_errors"], 1);
}

#[test]
fn submit_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("test.json");
    std::fs::write(
        &path,
        r#"{"original_text": "abc", "typed_text": "abc", "time_taken": 1.0, "difficulty": "easy"}"#,
    )
    .unwrap();

    let report = json_output(typemaster(dir.path()).arg("submit").arg(&path));
    assert_eq!(report["accuracy"], 100.0);
}

#[test]
fn submit_rejects_malformed_json() {
    let dir = TempDir::new().unwrap();
    typemaster(dir.path())
        .args(["submit", "-"])
        .write_stdin(r#"{"typed_text": "missing the rest"}"#)
        .assert()
        .failure();
}

#[test]
fn predict_mid_test() {
    let dir = TempDir::new().unwrap();
    let prediction = json_output(
        typemaster(dir.path())
            .args(["predict", "-"])
            .write_stdin(r#"{"partial_text": "the quick", "time_elapsed": 3.0}"#),
    );
    assert_eq!(prediction["current_wpm"], 36.0);
    assert_eq!(prediction["predicted_wpm"], 36.0);
}

#[test]
fn lesson_done_accumulates_attempts() {
    let dir = TempDir::new().unwrap();
    json_output(typemaster(dir.path()).args(["lesson-done", "2", "--score", "75", "--completed"]));
    let progress =
        json_output(typemaster(dir.path()).args(["lesson-done", "2", "--score", "60"]));

    assert_eq!(progress["attempts"], 2);
    assert_eq!(progress["completed"], true);
    assert_eq!(progress["best_score"], 75.0);
}

#[test]
fn game_reports_success() {
    let dir = TempDir::new().unwrap();
    let status = json_output(typemaster(dir.path()).args(["game", "--score", "120"]));
    assert_eq!(status["status"], "success");
}

#[test]
fn ask_falls_back_to_default_reply() {
    let dir = TempDir::new().unwrap();
    let output = typemaster(dir.path())
        .args(["ask", "tell", "me", "a", "joke"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(String::from_utf8(output)
        .unwrap()
        .starts_with("I'm not sure how to help with that."));
}

#[test]
fn export_writes_header_and_rows() {
    let dir = TempDir::new().unwrap();
    for _ in 0..2 {
        typemaster(dir.path())
            .args(["submit", "-"])
            .write_stdin(r#"{"original_text": "ab", "typed_text": "ab", "time_taken": 2.0}"#)
            .assert()
            .success();
    }

    let out = dir.path().join("history.csv");
    typemaster(dir.path())
        .arg("export")
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let csv = std::fs::read_to_string(out).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("id,timestamp,difficulty,wpm"));
}
