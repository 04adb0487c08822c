use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn thistle_run_factorial() {
    let mut cmd = Command::cargo_bin("thistle").expect("binary exists");
    cmd.arg("run").arg("demos/factorial.lsp");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("3628800"));
}

#[test]
fn thistle_eval_snippet() {
    let mut cmd = Command::cargo_bin("thistle").expect("binary exists");
    cmd.arg("eval").arg("(print-num (+ 1 2))");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("3"));
}

#[test]
fn thistle_eval_reports_type_error() {
    let mut cmd = Command::cargo_bin("thistle").expect("binary exists");
    cmd.arg("eval").arg("(+ 1 #t)");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("expects Int operands"));
}

#[test]
fn burdock_continues_after_a_failing_script() {
    let dir = tempdir().expect("create temp dir");
    // Sorted order: the failing script runs first, the passing one after.
    fs::write(dir.path().join("a.lsp"), "(print-num 1)\noops\n").expect("write a.lsp");
    fs::write(dir.path().join("b.lsp"), "(print-num 7)\n").expect("write b.lsp");

    let mut cmd = Command::cargo_bin("burdock").expect("binary exists");
    cmd.arg(dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("7"))
        .stdout(predicate::str::contains("2 script(s), 1 failure(s)"))
        .stderr(predicate::str::contains("unbound symbol `oops`"));
}

#[test]
fn burdock_reports_empty_directory() {
    let dir = tempdir().expect("create temp dir");
    let mut cmd = Command::cargo_bin("burdock").expect("binary exists");
    cmd.arg(dir.path());
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("No .lsp files found"));
}
