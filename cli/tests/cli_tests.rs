//! Black-box CLI tests for the `sci`/`scc` binaries.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_source(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn sci_help_mentions_usage() {
    let mut cmd = Command::cargo_bin("sci").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn sci_version_prints_crate_version() {
    let mut cmd = Command::cargo_bin("sci").unwrap();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn sci_runs_a_program_and_prints_its_result() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "main.sc", "function main(){ return 6 * 7; }");

    let mut cmd = Command::cargo_bin("sci").unwrap();
    cmd.arg(&path);
    cmd.assert().success().stdout(predicate::str::contains("42"));
}

#[test]
fn sci_dump_registers_prints_the_register_file() {
    let dir = TempDir::new().unwrap();
    let path = write_source(
        &dir,
        "main.sc",
        "function main(){ register uint32 r3 = 5; return r3; }",
    );

    let mut cmd = Command::cargo_bin("sci").unwrap();
    cmd.arg(&path).arg("--dump-registers");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("r3 = 5"));
}

#[test]
fn sci_reports_a_runtime_error_with_exit_code_one() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "main.sc", "function main(){ uint32 d=0; return 1/d; }");

    let mut cmd = Command::cargo_bin("sci").unwrap();
    cmd.arg(&path);
    cmd.assert().failure().code(1);
}

#[test]
fn scc_emits_assembly_to_stdout_by_default() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "main.sc", "function main(){ return 1 + 2; }");

    let mut cmd = Command::cargo_bin("scc").unwrap();
    cmd.arg(&path);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("entry main"));
}

#[test]
fn scc_writes_assembly_to_the_given_output_path() {
    let dir = TempDir::new().unwrap();
    let source = write_source(&dir, "main.sc", "function main(){ return 1 + 2; }");
    let output = dir.path().join("main.asm");

    let mut cmd = Command::cargo_bin("scc").unwrap();
    cmd.arg(&source).arg(&output);
    cmd.assert().success();
    assert!(output.exists());
    let contents = std::fs::read_to_string(&output).unwrap();
    assert!(contents.contains("hlt"));
}

#[test]
fn scc_emit_tokens_exits_before_code_generation() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "main.sc", "function main(){ return 1; }");

    let mut cmd = Command::cargo_bin("scc").unwrap();
    cmd.arg(&path).arg("--emit-tokens");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Function"));
}

#[test]
fn scc_emit_ast_exits_before_code_generation() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "main.sc", "function main(){ return 1; }");

    let mut cmd = Command::cargo_bin("scc").unwrap();
    cmd.arg(&path).arg("--emit-ast");
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("FunctionDef"));
}

#[test]
fn scc_reports_a_parse_error_with_exit_code_one() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "main.sc", "function main( return 1; }");

    let mut cmd = Command::cargo_bin("scc").unwrap();
    cmd.arg(&path);
    cmd.assert().failure().code(1);
}

#[test]
fn scc_run_without_an_assembler_on_path_fails_rather_than_hangs() {
    let dir = TempDir::new().unwrap();
    let path = write_source(&dir, "main.sc", "function main(){ return 1; }");
    let output = dir.path().join("main.asm");

    let mut cmd = Command::cargo_bin("scc").unwrap();
    cmd.arg(&path).arg(&output).arg("--run");
    cmd.assert().failure();
}
