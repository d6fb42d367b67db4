//! Integration tests for the CLI commands.

#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Create a temp directory with a complete test world.
fn test_world() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("world")).unwrap();
    fs::write(
        dir.path().join("world/village.txt"),
        r#"
square {
    "The village square.",
    TRANS { north = mill, east = tavern, },
}
mill { "A creaking water mill.", TRANS { south = square, }, }
tavern { "Smoke and laughter.", TRANS { west = square, }, }
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("characters.txt"),
        r#"
miller {
    NODE = mill,
    DESC = "A flour-dusted man.",
    "hour >= 20" { NODE = tavern, },
}
guard {
    NAME = "Old Tom",
    NODE = square,
    "rescue == 1" { NODE = mill, },
}
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("quests.txt"),
        r#"
rescue {
    0 { "Nobody has asked for help.", 1:"talk to the miller", },
    1 { "The daughter is missing.", 2, },
    2 { "Found her.", },
}
"#,
    )
    .unwrap();
    dir
}

fn dm() -> Command {
    Command::cargo_bin("dm").unwrap()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_passes_valid_world() {
    let dir = test_world();
    dm().args(["check", "-d", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("All checks passed")
                .and(predicate::str::contains("3 nodes, 2 characters, 1 quests")),
        );
}

#[test]
fn check_fails_malformed_unit() {
    let dir = test_world();
    fs::write(dir.path().join("world/broken.txt"), "ruin { \"Rubble.\" }").unwrap();

    dm().args(["check", "-d", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 source unit failed to load"));
}

#[test]
fn check_reports_unresolved_exits() {
    let dir = test_world();
    fs::write(dir.path().join("world/dock.txt"), "dock { TRANS { west = sea, }, }").unwrap();

    dm().args(["check", "-d", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("leads to unknown node \"sea\""));
}

#[test]
fn check_empty_dir_warns() {
    let dir = TempDir::new().unwrap();
    dm().args(["check", "-d", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("3 warnings"));
}

#[test]
fn check_rejects_missing_dir() {
    dm().args(["check", "-d", "/definitely/not/a/world"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a world directory"));
}

// ---------------------------------------------------------------------------
// tree
// ---------------------------------------------------------------------------

#[test]
fn tree_prints_source() {
    let dir = test_world();
    dm().args(["tree", dir.path().join("quests.txt").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("rescue {").and(predicate::str::contains("\"1:talk to the miller\",")));
}

#[test]
fn tree_prints_json() {
    let dir = test_world();
    dm().args(["tree", "--json", dir.path().join("world/village.txt").to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"kind\": \"container\"")
                .and(predicate::str::contains("\"name\": \"TRANS\"")),
        );
}

#[test]
fn tree_reports_parse_errors() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bad.txt");
    fs::write(&file, "cave { \"never closed }").unwrap();

    dm().args(["tree", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unterminated quoted literal"));
}

#[test]
fn tree_reports_unreadable_file() {
    let dir = TempDir::new().unwrap();
    dm().args(["tree", dir.path().join("nope.txt").to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn tree_points_at_the_open_quote() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bad.txt");
    fs::write(&file, "cave {\n  \"never closed,\n}\n").unwrap();

    dm().args(["tree", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("this quote is never closed"));
}

// ---------------------------------------------------------------------------
// look
// ---------------------------------------------------------------------------

#[test]
fn look_shows_node_and_characters() {
    let dir = test_world();
    dm().args(["look", "mill", "-d", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("A creaking water mill.")
                .and(predicate::str::contains("south"))
                .and(predicate::str::contains("miller"))
                .and(predicate::str::contains("A flour-dusted man.")),
        );
}

#[test]
fn look_follows_the_clock() {
    let dir = test_world();
    dm().args(["look", "tavern", "--hour", "21", "-d", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("miller"));
    dm().args(["look", "mill", "--hour", "21", "-d", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nobody is here."));
}

#[test]
fn look_follows_quest_steps() {
    let dir = test_world();
    dm().args(["look", "mill", "-q", "rescue=1", "-d", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Old Tom"));
}

#[test]
fn look_fails_unknown_node() {
    let dir = test_world();
    dm().args(["look", "castle", "-d", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("node not found: \"castle\""));
}

// ---------------------------------------------------------------------------
// quests
// ---------------------------------------------------------------------------

#[test]
fn quests_show_current_stage() {
    let dir = test_world();
    dm().args(["quests", "-d", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Nobody has asked for help.")
                .and(predicate::str::contains("1: talk to the miller")),
        );
}

#[test]
fn quests_reject_invalid_steps() {
    let dir = test_world();
    dm().args(["quests", "-q", "rescue=2", "-d", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("2 is not a valid transition from 0"));
}

// ---------------------------------------------------------------------------
// attr
// ---------------------------------------------------------------------------

#[test]
fn attr_resolves_clock_and_quests() {
    let dir = test_world();
    dm().args(["attr", "hour", "--hour", "30", "-d", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout("6\n");
    dm().args(["attr", "day", "--hour", "30", "-d", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout("1\n");
    dm().args(["attr", "rescue", "-q", "rescue=1", "-d", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn attr_fails_unknown_name() {
    let dir = test_world();
    dm().args(["attr", "weather", "-d", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown attribute"));
}
