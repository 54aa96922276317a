use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn invalid_enum_value_for_format_yields_error() {
    let mut cmd = Command::cargo_bin("depgraph").unwrap();
    cmd.args(["levels", "--records", "modules.json", "--format", "nope"]);

    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid value 'nope'"))
        .stderr(predicate::str::contains("text").and(predicate::str::contains("json")));
}

#[test]
fn roots_and_records_are_mutually_exclusive() {
    let mut cmd = Command::cargo_bin("depgraph").unwrap();
    cmd.args(["graph", "some/dir", "--records", "modules.json"]);

    cmd.assert().failure().code(2).stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn completions_are_generated() {
    let mut cmd = Command::cargo_bin("depgraph").unwrap();
    cmd.args(["completions", "bash"]);

    cmd.assert().success().stdout(predicate::str::contains("depgraph"));
}
