//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};

use repsq_core::{ComputeMode, ComputeRequest, ComputeResult, NeverInterrupt, compute};

/// Path of the `repsq` binary built for this test run.
pub fn repsq_bin() -> &'static str {
    env!("CARGO_BIN_EXE_repsq")
}

/// Run the binary with `home` as its home directory, so config and logs stay
/// inside a temp dir.
pub fn run_repsq(home: &Path, args: &[&str]) -> Output {
    run_repsq_with_env(home, args, &[])
}

/// Like [`run_repsq`], with extra environment variables set.
pub fn run_repsq_with_env(home: &Path, args: &[&str], vars: &[(&str, &str)]) -> Output {
    let mut command = Command::new(repsq_bin());
    command
        .args(args)
        .env("HOME", home)
        .env_remove("REPSQ_BACKEND")
        .env_remove("RUST_LOG")
        .current_dir(home);
    for (key, value) in vars {
        command.env(key, value);
    }
    command.output().expect("repsq binary runs")
}

/// Contents of the log file under `home`, or empty if none was written.
pub fn log_of(home: &Path) -> String {
    std::fs::read_to_string(home.join(".repsq").join("logs").join("repsq.log")).unwrap_or_default()
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn exact(digits: &str, radix: u32) -> ComputeResult {
    let request = ComputeRequest::parse(digits, radix, ComputeMode::Exact).expect("valid input");
    compute(&request, &NeverInterrupt).expect("no interruption")
}

pub fn preview(digits: &str, radix: u32) -> ComputeResult {
    let request = ComputeRequest::parse(digits, radix, ComputeMode::Preview).expect("valid input");
    compute(&request, &NeverInterrupt).expect("no interruption")
}

/// A non-repunit root long enough that an exact square takes far longer than any test.
pub fn slow_root(len: usize) -> String {
    "123456789".chars().cycle().take(len).collect()
}
