//! The `repsq` command line.

use crate::common::{log_of, run_repsq, run_repsq_with_env, stdout_of};

#[test]
fn square_prints_export_and_digest() {
    let home = tempfile::tempdir().unwrap();
    let output = run_repsq(home.path(), &["square", "111111111", "--json"]);
    assert!(output.status.success(), "{output:?}");

    let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(value["schemaVersion"], 1);
    assert_eq!(value["base"], 10);
    assert_eq!(value["rootDigits"], "111111111");
    assert_eq!(value["normalizedSquareDigits"], "12345678987654321");
    assert_eq!(value["peak"], "9");
    assert_eq!(value["isPalindrome"], true);
    assert_eq!(value["mode"], "exact");
    assert_eq!(value["isApproximate"], false);
    assert_eq!(
        value["digest"],
        "903660bc10ee71a95fa92fda0c65014059b2e092f4e28faf3630857605254967"
    );
}

#[test]
fn square_through_process_backend() {
    let home = tempfile::tempdir().unwrap();
    let output = run_repsq(
        home.path(),
        &["square", "111", "--base", "2", "--backend", "process", "--json"],
    );
    assert!(output.status.success(), "{output:?}");
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(value["normalizedSquareDigits"], "110001");
    assert_eq!(value["isPalindrome"], false);
}

#[test]
fn backend_env_var_overrides_config_file() {
    let home = tempfile::tempdir().unwrap();
    let config_dir = home.path().join(".repsq");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "[engine]\nbackend = \"thread\"\n").unwrap();

    let output = run_repsq_with_env(
        home.path(),
        &["square", "12", "--json"],
        &[("REPSQ_BACKEND", "process"), ("RUST_LOG", "repsq_engine=debug")],
    );
    assert!(output.status.success(), "{output:?}");
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(value["normalizedSquareDigits"], "144");

    let log = log_of(home.path());
    let started = log
        .lines()
        .find(|line| line.contains("Scheduler started"))
        .unwrap_or_else(|| panic!("no scheduler start in log:\n{log}"));
    assert!(started.contains("process"), "{started}");
}

#[test]
fn unknown_backend_env_var_falls_back_to_config() {
    let home = tempfile::tempdir().unwrap();
    let output = run_repsq_with_env(
        home.path(),
        &["square", "12", "--json"],
        &[("REPSQ_BACKEND", "gpu"), ("RUST_LOG", "repsq_config=warn,repsq_engine=debug")],
    );
    assert!(output.status.success(), "{output:?}");

    let log = log_of(home.path());
    assert!(log.contains("Unknown REPSQ_BACKEND value"), "{log}");
    let started = log
        .lines()
        .find(|line| line.contains("Scheduler started"))
        .unwrap_or_else(|| panic!("no scheduler start in log:\n{log}"));
    assert!(started.contains("thread"), "{started}");
}

#[test]
fn preview_reports_indeterminate_marker() {
    let home = tempfile::tempdir().unwrap();
    let output = run_repsq(home.path(), &["square", "12345", "--mode", "preview", "--json"]);
    assert!(output.status.success(), "{output:?}");
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(value["isPalindrome"], "indeterminate");
    assert_eq!(value["isApproximate"], true);
    assert!(value["digest"].is_null());
}

#[test]
fn invalid_digit_fails_fast() {
    let home = tempfile::tempdir().unwrap();
    let output = run_repsq(home.path(), &["square", "102", "--base", "2"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid digit"), "{stderr}");
}

#[test]
fn timed_out_job_exits_nonzero() {
    let home = tempfile::tempdir().unwrap();
    let root = crate::common::slow_root(60_000);
    let output = run_repsq(home.path(), &["square", &root, "--timeout-ms", "50"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("timed out"));
}

#[test]
fn classify_without_materializing() {
    let home = tempfile::tempdir().unwrap();
    let output = run_repsq(
        home.path(),
        &["classify", "--base", "36", "--length", "1000000000", "--json"],
    );
    assert!(output.status.success(), "{output:?}");
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(value["isPalindrome"], false);
    assert_eq!(value["peak"], "1000000000");
    assert!(value["squareDigits"].is_null());
}

#[test]
fn classify_materialized() {
    let home = tempfile::tempdir().unwrap();
    let output = run_repsq(home.path(), &["classify", "--length", "9", "--materialize"]);
    assert!(output.status.success(), "{output:?}");
    let text = stdout_of(&output);
    assert!(text.contains("palindrome  true"));
    assert!(text.contains("square      12345678987654321"));
}

#[test]
fn digest_command_canonicalizes_inputs() {
    let home = tempfile::tempdir().unwrap();
    let output = run_repsq(
        home.path(),
        &[
            "digest", "--base", "2", "--root", "0011", "--square", "1001", "--peak", "2",
            "--palindrome", "true",
        ],
    );
    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        stdout_of(&output).trim(),
        "f9be08157a5a17bc19af889ec4c7b6f3880823d302134a88fa0fb36046bbdbff"
    );
}

#[test]
fn limits_are_persisted_and_applied() {
    let home = tempfile::tempdir().unwrap();
    let output = run_repsq(
        home.path(),
        &["limits", "--safe-digits-exact", "4", "--timeout-ms", "5000"],
    );
    assert!(output.status.success(), "{output:?}");
    let text = stdout_of(&output);
    assert!(text.contains("safe_digits_exact       4"));
    assert!(text.contains("worker_hard_timeout_ms  5000"));

    let config = std::fs::read_to_string(home.path().join(".repsq").join("config.toml")).unwrap();
    assert!(config.contains("safe_digits_exact = 4"));

    // Auto mode now previews anything longer than four digits.
    let output = run_repsq(home.path(), &["square", "12345", "--mode", "auto", "--json"]);
    let value: serde_json::Value = serde_json::from_str(&stdout_of(&output)).unwrap();
    assert_eq!(value["mode"], "preview");
}

#[test]
fn logs_never_reach_stdout() {
    let home = tempfile::tempdir().unwrap();
    let output = std::process::Command::new(crate::common::repsq_bin())
        .args(["square", "101", "--json"])
        .env("HOME", home.path())
        .env("RUST_LOG", "trace")
        .current_dir(home.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    serde_json::from_str::<serde_json::Value>(&stdout_of(&output)).expect("stdout is pure JSON");
    assert!(home.path().join(".repsq").join("logs").join("repsq.log").exists());
}
