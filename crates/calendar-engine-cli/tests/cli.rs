use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

const NOW: &str = "2025-06-02T03:00:00Z";

fn calexport() -> Command {
    let mut cmd = Command::cargo_bin("calexport").unwrap();
    cmd.env_remove("RUST_LOG").args(["--now", NOW]);
    cmd
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("calexport-{}-{name}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_resolve_all_day_json() {
    let output = calexport()
        .args(["resolve", "--start", "2025-01-31"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["kind"], "all_day");
    assert_eq!(json["start_yyyymmdd"], "20250131");
    assert_eq!(json["end_yyyymmdd_exclusive"], "20250201");
}

#[test]
fn test_resolve_timed_with_timezone_flag() {
    let output = calexport()
        .args(["--timezone", "Asia/Tokyo", "resolve", "--start", "12/16 10:00"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["kind"], "date_time");
    assert_eq!(json["start_utc"], "20251216T010000Z");
    assert_eq!(json["end_utc"], "20251216T020000Z");
}

#[test]
fn test_ics_to_stdout() {
    calexport()
        .args([
            "ics",
            "--title",
            "A;B,C",
            "--start",
            "2025-12-16T10:00:00+09:00",
            "--location",
            "Room 1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("BEGIN:VCALENDAR\r\n"))
        .stdout(predicate::str::contains("SUMMARY:A\\;B\\,C\r\n"))
        .stdout(predicate::str::contains("DTSTART:20251216T010000Z\r\n"))
        .stdout(predicate::str::contains("DTSTAMP:20250602T030000Z\r\n"))
        .stdout(predicate::str::contains("LOCATION:Room 1\r\n"))
        .stdout(predicate::str::ends_with("END:VCALENDAR\r\n"));
}

#[test]
fn test_ics_out_dir_uses_sanitized_title() {
    let dir = scratch_dir("out-dir");
    calexport()
        .args(["ics", "--title", "Launch: v2/final", "--start", "2025-01-31", "--out-dir"])
        .arg(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Launch_ v2_final.ics"));

    let written = fs::read_to_string(dir.join("Launch_ v2_final.ics")).unwrap();
    assert!(written.contains("DTSTART;VALUE=DATE:20250131\r\n"));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_link_all_day() {
    calexport()
        .args(["link", "--title", "Launch", "--start", "2025-01-31"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "https://calendar.google.com/calendar/render?action=TEMPLATE",
        ))
        .stdout(predicate::str::contains("dates=20250131%2F20250201"))
        .stdout(predicate::str::contains("details=").not())
        .stdout(predicate::str::contains("location=").not());
}

#[test]
fn test_export_from_input_file() {
    let dir = scratch_dir("input");
    let input = dir.join("event.json");
    fs::write(
        &input,
        r#"{"title": "Offsite", "start": "2025-03-10", "end": "2025-03-12", "allDay": true}"#,
    )
    .unwrap();

    let output = calexport()
        .args(["export", "--input"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["range"]["end_yyyymmdd_exclusive"], "20250312");
    assert!(json["ics"].as_str().unwrap().contains("SUMMARY:Offsite\r\n"));
    assert!(json["google_calendar_url"]
        .as_str()
        .unwrap()
        .contains("dates=20250310%2F20250312"));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_input_from_stdin_with_flag_override() {
    calexport()
        .args(["link", "--input", "-", "--title", "Override"])
        .write_stdin(r#"{"title": "Original", "start": "2025-01-31"}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("text=Override"));
}

#[test]
fn test_config_file_sets_product_id_and_title() {
    let dir = scratch_dir("config");
    let config = dir.join("config.json");
    fs::write(
        &config,
        r#"{"product_id": "-//Acme//Clipper//EN", "default_title": "Imported"}"#,
    )
    .unwrap();

    calexport()
        .arg("--config")
        .arg(&config)
        .args(["ics", "--start", "2025-01-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PRODID:-//Acme//Clipper//EN\r\n"))
        .stdout(predicate::str::contains("SUMMARY:Imported\r\n"));
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_unresolvable_start_fails_without_output() {
    calexport()
        .args(["ics", "--title", "Bad", "--start", "2025-02-30"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("could not resolve event time"));
}

#[test]
fn test_missing_start_fails() {
    calexport()
        .args(["link", "--title", "No start"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no event start given"));
}

#[test]
fn test_invalid_timezone_fails() {
    calexport()
        .args(["--timezone", "Mars/Olympus", "resolve", "--start", "2025-01-31"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timezone"));
}
