//! Local command execution.
//!
//! [`Shell::cmd`] turns a [`Command`] into a [`ShellTask`]. The task is a
//! builder until it is run: nothing spawns before [`ShellTask::run`], one of
//! the output accessors, or `.await`. Each of these consumes the task, so a
//! task executes exactly once.
//!
//! A failing command terminates the process with status 1 after printing the
//! command and the tail of its output. Call [`ShellTask::nothrow`] to get the
//! failed [`ShellResult`] back instead.
//!
//! # Example
//!
//! ```no_run
//! use shellbracket::cmd;
//! use shellbracket::shell::Shell;
//!
//! # async fn demo() -> shellbracket::Result<()> {
//! let shell = Shell::new();
//! let branch = shell
//!     .cmd(cmd!("git -C {} rev-parse --abbrev-ref HEAD", "/srv/app")?)
//!     .text()
//!     .await;
//! let clean = shell.cmd(cmd!("git diff --quiet")?).test().await;
//! # let _ = (branch, clean);
//! # Ok(())
//! # }
//! ```

use std::future::{Future, IntoFuture};
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Instant;

use serde::de::DeserializeOwned;

use super::command::Command;
use super::exec::{self, ExecOptions, ShellResult};
use crate::config::{self, Settings};
use crate::error::{Result, ShellError};
use crate::lifecycle::Lifecycle;
use crate::ui::{tail_lines, OutputStream, Spinner, Tail, Theme};

/// Whether a failing command terminates the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThrowPolicy {
    /// Follow the executor's default.
    #[default]
    Default,
    /// Terminate on failure.
    Always,
    /// Return the failed result.
    Never,
}

impl ThrowPolicy {
    pub fn throws(self, default: bool) -> bool {
        match self {
            Self::Default => default,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

impl From<bool> for ThrowPolicy {
    fn from(throws: bool) -> Self {
        if throws {
            Self::Always
        } else {
            Self::Never
        }
    }
}

/// Local command executor.
///
/// Cheap to clone; clones share the diagnostic stream and lifecycle.
#[derive(Debug, Clone)]
pub struct Shell {
    settings: Settings,
    verbose: Option<bool>,
    throws: bool,
    diagnostics: OutputStream,
    lifecycle: &'static Lifecycle,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    /// Executor with default settings, logging to stderr.
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            verbose: None,
            throws: true,
            diagnostics: OutputStream::stderr(),
            lifecycle: Lifecycle::process(),
        }
    }

    /// Send command logs, spinners and failure reports to `stream`.
    pub fn diagnostics(mut self, stream: OutputStream) -> Self {
        self.diagnostics = stream;
        self
    }

    /// Pin verbose mode for this executor instead of following the
    /// process-wide toggle.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Whether tasks with [`ThrowPolicy::Default`] terminate on failure.
    pub fn throws_by_default(mut self, throws: bool) -> Self {
        self.throws = throws;
        self
    }

    /// Exit through `lifecycle` so its cleanup routines run on failure.
    pub fn lifecycle(mut self, lifecycle: &'static Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn diagnostics_stream(&self) -> &OutputStream {
        &self.diagnostics
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose.unwrap_or_else(config::is_verbose)
    }

    /// Prepare `command` for execution.
    pub fn cmd(&self, command: Command) -> ShellTask {
        ShellTask {
            shell: self.clone(),
            command,
            options: ExecOptions::default(),
            quiet: false,
            policy: ThrowPolicy::Default,
        }
    }

    /// Run `command` without the failure policy and report whether it exited 0.
    pub async fn test(&self, command: Command) -> bool {
        self.cmd(command).test().await
    }

    /// Run `command` with a blocking spawn and return its captured output.
    ///
    /// No verbose logging and no failure policy: the caller inspects the
    /// result. Errors only if the shell cannot be started.
    pub fn run_sync(&self, command: &Command, options: &ExecOptions) -> Result<ShellResult> {
        let rendered = command.render();
        tracing::debug!(command = %rendered, "spawning (blocking)");
        let result = exec::execute_blocking(&self.settings.shell_path(), &rendered, options)?;
        tracing::debug!(code = result.exit_code(), "command exited");
        Ok(result)
    }

    async fn execute(
        &self,
        command: String,
        options: ExecOptions,
        quiet: bool,
        policy: ThrowPolicy,
    ) -> ShellResult {
        let verbose = self.is_verbose();
        let echo = verbose && !quiet;
        let theme = Theme::for_stream(&self.diagnostics);

        let spinner = if echo {
            self.diagnostics
                .write_line(&theme.format_command(&command))
                .ok();
            self.start_spinner()
        } else {
            None
        };

        tracing::debug!(command = %command, "spawning");
        let start = Instant::now();
        let result = match exec::execute(&self.settings.shell_path(), &command, &options).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!("spawn failed: {}", e);
                ShellResult::spawn_failure(&e, start.elapsed())
            }
        };
        tracing::debug!(code = result.exit_code(), elapsed = ?result.duration(), "command exited");

        if let Some(spinner) = spinner {
            spinner.stop();
        }

        if result.success() {
            if echo {
                self.report(&theme, &result, self.settings.success_tail());
            }
            return result;
        }

        if !policy.throws(self.throws) {
            if verbose {
                if !echo {
                    self.diagnostics
                        .write_line(&theme.format_command(&command))
                        .ok();
                }
                self.report(&theme, &result, self.settings.failure_tail());
            }
            return result;
        }

        self.fail(&theme, &command, echo, &result)
    }

    fn start_spinner(&self) -> Option<Spinner> {
        if !self.settings.spinners || !self.diagnostics.is_interactive() {
            return None;
        }
        let spinner = Spinner::with_interval(
            self.diagnostics.clone(),
            self.settings.spinner_interval(),
        );
        spinner.start();
        Some(spinner)
    }

    /// Print the exit badge and the selected tail of stdout and stderr.
    fn report(&self, theme: &Theme, result: &ShellResult, tail: Tail) {
        let stream = &self.diagnostics;
        stream
            .write_line(&theme.format_badge(result.exit_code()))
            .ok();
        for text in [result.text(), result.stderr_text()] {
            for line in tail_lines(&text, tail) {
                stream
                    .write_line(&theme.output.apply_to(line).to_string())
                    .ok();
            }
        }
    }

    fn fail(&self, theme: &Theme, command: &str, logged: bool, result: &ShellResult) -> ! {
        let stream = &self.diagnostics;
        stream
            .write_line(&theme.format_error(&format!(
                "Command failed with exit code {}",
                result.exit_code()
            )))
            .ok();
        if !logged {
            stream.write_line(&theme.format_command(command)).ok();
        }
        self.report(theme, result, self.settings.failure_tail());
        self.lifecycle.exit(1)
    }
}

/// A local command waiting to run.
#[must_use = "a ShellTask does nothing until it is run or awaited"]
#[derive(Debug, Clone)]
pub struct ShellTask {
    shell: Shell,
    command: Command,
    options: ExecOptions,
    quiet: bool,
    policy: ThrowPolicy,
}

impl ShellTask {
    /// Set several environment variables.
    pub fn env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in vars {
            self.options.env.insert(key.into(), Some(value.into()));
        }
        self
    }

    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), Some(value.into()));
        self
    }

    /// Remove a variable from the child's environment.
    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), None);
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(dir.into());
        self
    }

    /// Do not echo the command or its output on success.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn throws(mut self, throws: bool) -> Self {
        self.policy = throws.into();
        self
    }

    /// Return failures as results instead of terminating.
    pub fn nothrow(self) -> Self {
        self.throws(false)
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn options(&self) -> &ExecOptions {
        &self.options
    }

    pub fn policy(&self) -> ThrowPolicy {
        self.policy
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Run the command.
    pub async fn run(self) -> ShellResult {
        let rendered = self.command.render();
        self.shell
            .execute(rendered, self.options, self.quiet, self.policy)
            .await
    }

    /// Run without terminating on failure; a non-zero exit becomes
    /// [`ShellError::CommandFailed`].
    pub async fn try_run(self) -> Result<ShellResult> {
        let rendered = self.command.render();
        let result = self.nothrow().run().await;
        if result.success() {
            Ok(result)
        } else {
            Err(ShellError::CommandFailed {
                command: rendered,
                code: result.exit_code(),
            })
        }
    }

    /// Run and return stdout as text.
    pub async fn text(self) -> String {
        self.run().await.text()
    }

    /// Run and return stdout lines.
    pub async fn lines(self) -> Vec<String> {
        self.run().await.lines()
    }

    /// Run and parse stdout as JSON.
    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        self.run().await.json()
    }

    /// Run and return raw stdout.
    pub async fn bytes(self) -> Vec<u8> {
        self.run().await.into_stdout()
    }

    /// Run without the failure policy and report whether it exited 0.
    pub async fn test(self) -> bool {
        self.nothrow().run().await.success()
    }
}

impl IntoFuture for ShellTask {
    type Output = ShellResult;
    type IntoFuture = Pin<Box<dyn Future<Output = ShellResult> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}
