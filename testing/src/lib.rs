//
// This file is part of the rush project covered under the MIT License.
// For the full license text, please see the LICENSE file in the root
// directory of this project.
// SPDX-License-Identifier: MIT
//

use std::io::Write;
use std::process::{Command, Output, Stdio};

pub struct TestPlan {
    pub cmd: String,
    pub args: Vec<String>,
    pub stdin_data: String,
    pub expected_out: String,
    pub expected_err: String,
    pub expected_exit_code: i32,
}

/// Runs a workspace binary with the given arguments, stdin and environment
/// overrides, and collects its output.
pub fn run_test_base_with_env(
    cmd: &str,
    args: &[String],
    stdin_data: &[u8],
    env_vars: &[(&str, &str)],
) -> Output {
    let relpath = if cfg!(debug_assertions) {
        format!("target/debug/{}", cmd)
    } else {
        format!("target/release/{}", cmd)
    };
    // tests run from the package directory; binaries live in the target
    // directory one level up, at the workspace root
    let test_bin_path = std::env::current_dir()
        .unwrap()
        .parent()
        .unwrap()
        .join(relpath);

    let mut command = Command::new(test_bin_path);
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in env_vars {
        command.env(key, value);
    }

    let mut child = command
        .spawn()
        .unwrap_or_else(|_| panic!("failed to spawn command {cmd}"));

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(stdin_data)
            .expect("failed to write to stdin of child");
        drop(stdin);
    }

    child.wait_with_output().expect("failed to wait for child")
}

pub fn run_test_base(cmd: &str, args: &[String], stdin_data: &[u8]) -> Output {
    run_test_base_with_env(cmd, args, stdin_data, &[])
}

pub fn run_test(plan: TestPlan) {
    let output = run_test_base(&plan.cmd, &plan.args, plan.stdin_data.as_bytes());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, plan.expected_out);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr, plan.expected_err);

    assert_eq!(output.status.code(), Some(plan.expected_exit_code));
    if plan.expected_exit_code == 0 {
        assert!(output.status.success());
    }
}

pub fn run_test_with_env(plan: TestPlan, env_vars: &[(&str, &str)]) {
    let output =
        run_test_base_with_env(&plan.cmd, &plan.args, plan.stdin_data.as_bytes(), env_vars);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, plan.expected_out);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr, plan.expected_err);

    assert_eq!(output.status.code(), Some(plan.expected_exit_code));
}

pub fn run_test_with_checker<F: FnMut(&TestPlan, &Output)>(plan: TestPlan, mut checker: F) {
    let output = run_test_base(&plan.cmd, &plan.args, plan.stdin_data.as_bytes());
    checker(&plan, &output);
}

pub fn run_test_with_checker_and_env<F: FnMut(&TestPlan, &Output)>(
    plan: TestPlan,
    env_vars: &[(&str, &str)],
    mut checker: F,
) {
    let output =
        run_test_base_with_env(&plan.cmd, &plan.args, plan.stdin_data.as_bytes(), env_vars);
    checker(&plan, &output);
}
