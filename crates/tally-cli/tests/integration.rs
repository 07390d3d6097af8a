#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn tally(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.current_dir(dir.path())
        .env("DATA_FILE", dir.path().join("sistemas.json"))
        .env_remove("TALLY_PREFIX")
        .env_remove("RUST_LOG");
    cmd
}

fn read_data(dir: &TempDir) -> Value {
    let raw = std::fs::read_to_string(dir.path().join("sistemas.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn console(dir: &TempDir, input: &str) -> String {
    let out = tally(dir)
        .arg("console")
        .write_stdin(input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(out).unwrap()
}

// ---------------------------------------------------------------------------
// tally show
// ---------------------------------------------------------------------------

#[test]
fn show_on_missing_file_prints_empty_board() {
    let dir = TempDir::new().unwrap();
    tally(&dir)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Activity Status"))
        .stdout(predicate::str::contains("empty; use `!add ...`"));

    assert!(!dir.path().join("sistemas.json").exists());
}

#[test]
fn show_json_prints_stored_document() {
    let dir = TempDir::new().unwrap();
    console(&dir, "!add KD LUNAR 3 CORP\n");

    let out = tally(&dir)
        .args(["show", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let doc: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(doc["LUNAR"]["KD"]["total"], 3);
    assert_eq!(doc["LUNAR"]["KD"]["tipo"], "CORP");
}

#[test]
fn show_fails_on_corrupt_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("sistemas.json"), "{ not json").unwrap();

    tally(&dir)
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn show_fails_when_root_is_not_an_object() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("sistemas.json"), "[1, 2]").unwrap();

    tally(&dir)
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed"));
}

// ---------------------------------------------------------------------------
// tally console
// ---------------------------------------------------------------------------

#[test]
fn console_flow_persists_progress_and_board() {
    let dir = TempDir::new().unwrap();
    let out = console(&dir, "!add KD LUNAR 2\n!register KD LUNAR cami\nhello there\n!show\n");

    assert!(out.contains("[#1] ✅ KD in LUNAR now has total 2 (NUESTRA)."));
    assert!(out.contains("Registered KD in LUNAR (cami): 1/2"));
    assert!(out.contains("[#2 edited]"));
    assert!(out.contains("KD (NUESTRA): 1/2"));

    let doc = read_data(&dir);
    assert_eq!(doc["LUNAR"]["KD"]["hecho"], 1);
    assert_eq!(doc["LUNAR"]["KD"]["total"], 2);
    assert_eq!(doc["LUNAR"]["KD"]["tipo"], "NUESTRA");
    assert_eq!(doc["_meta"]["boards"]["console"], "2");
}

#[test]
fn console_restart_recreates_board() {
    let dir = TempDir::new().unwrap();
    console(&dir, "!add KD LUNAR 2\n");
    assert_eq!(read_data(&dir)["_meta"]["boards"]["console"], "2");

    let out = console(&dir, "!reset\n");
    assert!(out.contains("[#3] 🔄 Counters reset"));
    assert!(out.contains("[#4] **📋 Activity Status**"));
    assert_eq!(read_data(&dir)["_meta"]["boards"]["console"], "4");
}

#[test]
fn console_reports_usage_errors() {
    let dir = TempDir::new().unwrap();
    let out = console(&dir, "!add KD LUNAR lots\n!undo KD LUNAR 0\n");

    assert!(out.contains("Usage: `!add <activity> <system> <total> [kind]`"));
    assert!(out.contains("System or activity not found."));
    assert!(read_data(&dir)["LUNAR"].is_null());
}

#[test]
fn console_honours_custom_prefix() {
    let dir = TempDir::new().unwrap();
    let out = String::from_utf8(
        tally(&dir)
            .arg("console")
            .env("TALLY_PREFIX", "?")
            .write_stdin("!help\n?ayuda\n")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone(),
    )
    .unwrap();

    assert!(out.contains("?add [activity]"));
    assert!(!out.contains("!add [activity]"));
    assert_eq!(out.matches("[#").count(), 1);
}

#[test]
fn console_fails_on_corrupt_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("sistemas.json"), "{ not json").unwrap();

    tally(&dir)
        .arg("console")
        .write_stdin("!show\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

// ---------------------------------------------------------------------------
// tally run
// ---------------------------------------------------------------------------

#[test]
fn run_without_token_fails_at_startup() {
    let dir = TempDir::new().unwrap();
    tally(&dir)
        .args(["run", "--channel", "123"])
        .env_remove("DISCORD_TOKEN")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DISCORD_TOKEN"));
}

#[test]
fn run_without_channels_fails_at_startup() {
    let dir = TempDir::new().unwrap();
    tally(&dir)
        .arg("run")
        .env("DISCORD_TOKEN", "tok")
        .env_remove("TALLY_CHANNELS")
        .assert()
        .failure()
        .stderr(predicate::str::contains("TALLY_CHANNELS"));
}
