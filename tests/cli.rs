use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn lotus_eval_prints_the_result() {
    let mut cmd = Command::cargo_bin("lotus").expect("binary exists");
    cmd.arg("eval").arg("(+ 1 (* 2 3))");
    cmd.assert().success().stdout(predicate::str::contains("7"));
}

#[test]
fn lotus_run_executes_a_script() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("hello.lisp");
    fs::write(&script, "(println (str \"Hello from \" \"Lotus!\"))\n").expect("write script");

    let mut cmd = Command::cargo_bin("lotus").expect("binary exists");
    cmd.arg("run").arg(&script);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Hello from Lotus!"));
}

#[test]
fn lotus_run_passes_arguments_as_argv() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("args.lisp");
    fs::write(&script, "(prn (count *ARGV*))\n").expect("write script");

    let mut cmd = Command::cargo_bin("lotus").expect("binary exists");
    cmd.arg("run").arg(&script).arg("one").arg("two");
    cmd.assert().success().stdout(predicate::str::contains("2"));
}

#[test]
fn lotus_eval_reports_unknown_symbols() {
    let mut cmd = Command::cargo_bin("lotus").expect("binary exists");
    cmd.arg("eval").arg("(foo)");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("UnknownSymbol"));
}
