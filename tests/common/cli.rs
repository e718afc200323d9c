//! Runs the `autoripper` binary and checks what it printed.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use serde_json::Value;

/// Variables a developer's shell may carry that would change the binary's
/// behaviour. They are removed before every run.
const HOST_VARS: [&str; 3] = ["RIPPER_SETTINGS", "AUTORIPPER_FORMAT", "RUST_LOG"];

/// Builder for one or more invocations of the binary.
///
/// ```ignore
/// CliRunner::new()
///     .with_settings(&env.write_settings(&makemkvcon, "whipper", "true"))
///     .run(&["status"])
///     .assert_success()
///     .assert_stdout_contains("/dev/sr0");
/// ```
#[derive(Debug, Default)]
pub struct CliRunner {
    env: BTreeMap<String, String>,
}

impl CliRunner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Point `RIPPER_SETTINGS` at `path`.
    #[must_use]
    pub fn with_settings(self, path: &Path) -> Self {
        self.with_env("RIPPER_SETTINGS", &path.display().to_string())
    }

    /// # Panics
    ///
    /// Panics if the binary cannot be spawned.
    #[must_use]
    pub fn run(&self, args: &[&str]) -> CliResult {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_autoripper"));
        cmd.args(args);
        for key in HOST_VARS {
            cmd.env_remove(key);
        }
        cmd.envs(&self.env);

        let output = cmd.output().expect("failed to spawn autoripper");
        CliResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
            args: args.iter().map(ToString::to_string).collect(),
        }
    }

    /// Run with `--robot` prepended.
    #[must_use]
    pub fn run_robot(&self, args: &[&str]) -> CliResult {
        let mut full = vec!["--robot"];
        full.extend_from_slice(args);
        self.run(&full)
    }
}

/// Captured output of one run. Assertions return `&Self` for chaining.
#[derive(Debug, Clone)]
pub struct CliResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub args: Vec<String>,
}

impl CliResult {
    pub fn assert_success(&self) -> &Self {
        assert_eq!(
            self.exit_code, 0,
            "{:?} failed with {}:\n{}",
            self.args, self.exit_code, self.stderr
        );
        self
    }

    pub fn assert_exit_code(&self, expected: i32) -> &Self {
        assert_eq!(
            self.exit_code, expected,
            "{:?} exited with {}, stderr:\n{}",
            self.args, self.exit_code, self.stderr
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "stdout lacks {text:?}:\n{}",
            self.stdout
        );
        self
    }

    /// # Panics
    ///
    /// Panics on an invalid pattern or when stdout does not match.
    pub fn assert_stdout_matches(&self, pattern: &str) -> &Self {
        let re = regex::Regex::new(pattern).expect("invalid pattern");
        assert!(
            re.is_match(&self.stdout),
            "stdout does not match {pattern:?}:\n{}",
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "stderr lacks {text:?}:\n{}",
            self.stderr
        );
        self
    }

    /// Stdout parsed as one JSON document.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout))
    }

    fn pointer(&self, json_pointer: &str) -> Value {
        let json = self.json();
        json.pointer(json_pointer)
            .cloned()
            .unwrap_or_else(|| panic!("{json_pointer} missing from {json}"))
    }

    pub fn assert_json_field(&self, json_pointer: &str, expected: &Value) -> &Self {
        assert_eq!(&self.pointer(json_pointer), expected, "at {json_pointer}");
        self
    }

    pub fn assert_json_field_exists(&self, json_pointer: &str) -> &Self {
        let _ = self.pointer(json_pointer);
        self
    }

    pub fn assert_json_array_len(&self, json_pointer: &str, expected: usize) -> &Self {
        let value = self.pointer(json_pointer);
        let len = value
            .as_array()
            .unwrap_or_else(|| panic!("{json_pointer} is not an array: {value}"))
            .len();
        assert_eq!(len, expected, "length of {json_pointer}");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_path_is_reported() {
        let result = CliRunner::new().run(&["--config", "/nonexistent/x.toml", "status"]);
        result
            .assert_exit_code(1)
            .assert_stderr_contains("/nonexistent/x.toml");
    }

    #[test]
    fn robot_run_prints_json() {
        CliRunner::new()
            .run_robot(&["version"])
            .assert_success()
            .assert_json_field_exists("/git_sha");
    }

    #[test]
    fn usage_errors_exit_with_clap_code() {
        CliRunner::new().run(&["nonexistent-command"]).assert_exit_code(2);
    }
}
