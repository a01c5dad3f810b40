//! Process spawning and output capture.
//!
//! Every executor funnels into [`execute`] (async) or [`execute_blocking`]:
//! run one rendered command string through the configured shell, capture
//! stdout and stderr, and report the exit code.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output, Stdio};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;

use super::platform::shell_flag;
use crate::error::{Result, ShellError};

/// Exit code reported when the shell itself could not be started.
pub const SPAWN_FAILURE_CODE: i32 = 127;

/// Result of executing a shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellResult {
    exit_code: i32,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    duration: Duration,
}

impl ShellResult {
    pub fn new(exit_code: i32, stdout: Vec<u8>, stderr: Vec<u8>, duration: Duration) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
        }
    }

    /// A result standing in for a process that never started.
    pub fn spawn_failure(error: &ShellError, duration: Duration) -> Self {
        Self::new(
            SPAWN_FAILURE_CODE,
            Vec::new(),
            format!("{}\n", error).into_bytes(),
            duration,
        )
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Whether the command exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    pub fn stderr(&self) -> &[u8] {
        &self.stderr
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Stdout decoded lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Stderr decoded lossily.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Stdout split into lines, without a trailing empty line.
    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_string).collect()
    }

    /// Stdout parsed as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.stdout)?)
    }

    pub fn into_stdout(self) -> Vec<u8> {
        self.stdout
    }
}

/// Process-level options for one execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Environment overrides: `Some` sets, `None` removes.
    pub env: BTreeMap<String, Option<String>>,

    /// Working directory.
    pub cwd: Option<PathBuf>,
}

fn build(shell: &Path, command: &str, options: &ExecOptions) -> std::process::Command {
    let mut cmd = std::process::Command::new(shell);
    cmd.arg(shell_flag(shell));
    cmd.arg(command);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        match value {
            Some(value) => cmd.env(key, value),
            None => cmd.env_remove(key),
        };
    }

    cmd.stdin(Stdio::inherit());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    cmd
}

fn spawn_error(command: &str, source: std::io::Error) -> ShellError {
    ShellError::Spawn {
        command: command.to_string(),
        source,
    }
}

fn finish(output: Output, duration: Duration) -> ShellResult {
    ShellResult::new(
        exit_code(output.status),
        output.stdout,
        output.stderr,
        duration,
    )
}

/// Run `command` through `shell` and capture its output.
///
/// A non-zero exit is not an error here; only failing to start is.
pub async fn execute(shell: &Path, command: &str, options: &ExecOptions) -> Result<ShellResult> {
    let start = Instant::now();
    let mut cmd = tokio::process::Command::from(build(shell, command, options));
    let output = cmd
        .output()
        .await
        .map_err(|e| spawn_error(command, e))?;
    Ok(finish(output, start.elapsed()))
}

/// Blocking variant of [`execute`].
pub fn execute_blocking(shell: &Path, command: &str, options: &ExecOptions) -> Result<ShellResult> {
    let start = Instant::now();
    let output = build(shell, command, options)
        .output()
        .map_err(|e| spawn_error(command, e))?;
    Ok(finish(output, start.elapsed()))
}

/// Exit code of `status`, mapping death-by-signal to `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh() -> PathBuf {
        PathBuf::from("/bin/sh")
    }

    #[tokio::test]
    async fn execute_successful_command() {
        let result = execute(&sh(), "echo hello", &ExecOptions::default())
            .await
            .unwrap();
        assert!(result.success());
        assert_eq!(result.exit_code(), 0);
        assert_eq!(result.text(), "hello\n");
    }

    #[tokio::test]
    async fn execute_failing_command_is_not_an_error() {
        let result = execute(&sh(), "echo oops >&2; exit 3", &ExecOptions::default())
            .await
            .unwrap();
        assert!(!result.success());
        assert_eq!(result.exit_code(), 3);
        assert_eq!(result.stderr_text(), "oops\n");
    }

    #[tokio::test]
    async fn execute_with_env_set_and_unset() {
        let mut options = ExecOptions::default();
        options
            .env
            .insert("MY_VAR".to_string(), Some("my_value".to_string()));
        options.env.insert("HOME".to_string(), None);
        let result = execute(&sh(), "echo \"$MY_VAR:${HOME-unset}\"", &options)
            .await
            .unwrap();
        assert_eq!(result.text(), "my_value:unset\n");
    }

    #[tokio::test]
    async fn execute_with_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let options = ExecOptions {
            cwd: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let result = execute(&sh(), "pwd", &options).await.unwrap();
        let reported = PathBuf::from(result.text().trim()).canonicalize().unwrap();
        assert_eq!(reported, temp.path().canonicalize().unwrap());
    }

    #[tokio::test]
    async fn missing_shell_is_spawn_error() {
        let err = execute(
            Path::new("/nonexistent/shell"),
            "true",
            &ExecOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ShellError::Spawn { .. }));
    }

    #[test]
    fn blocking_matches_async() {
        let result = execute_blocking(&sh(), "printf 'a\\nb\\n'", &ExecOptions::default()).unwrap();
        assert_eq!(result.lines(), vec!["a", "b"]);
    }

    #[cfg(unix)]
    #[test]
    fn signal_death_maps_to_shell_convention() {
        let result = execute_blocking(&sh(), "kill -TERM $$", &ExecOptions::default()).unwrap();
        assert_eq!(result.exit_code(), 143);
    }

    #[test]
    fn json_accessor_parses_stdout() {
        let result = ShellResult::new(0, br#"{"n": 2}"#.to_vec(), Vec::new(), Duration::ZERO);
        let value: serde_json::Value = result.json().unwrap();
        assert_eq!(value["n"], 2);
    }

    #[test]
    fn json_accessor_reports_bad_output() {
        let result = ShellResult::new(0, b"not json".to_vec(), Vec::new(), Duration::ZERO);
        assert!(matches!(
            result.json::<serde_json::Value>(),
            Err(ShellError::Json(_))
        ));
    }

    #[test]
    fn spawn_failure_result_carries_message() {
        let err = ShellError::Spawn {
            command: "x".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        let result = ShellResult::spawn_failure(&err, Duration::ZERO);
        assert_eq!(result.exit_code(), SPAWN_FAILURE_CODE);
        assert!(result.stderr_text().contains("missing"));
    }
}
