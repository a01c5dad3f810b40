//! Remote command execution over SSH.
//!
//! A [`Remote`] wraps each command in a prefix that changes directory and sets
//! environment variables on the far side, then hands the whole string to
//! `ssh` as one escaped argument. The resulting local command runs through
//! the owning [`Shell`], so verbose logging and the failure policy apply
//! unchanged.
//!
//! # Example
//!
//! ```
//! use shellbracket::cmd;
//! use shellbracket::shell::{Remote, RemoteOptions, Shell};
//!
//! let options = RemoteOptions::default()
//!     .env_var("RAILS_ENV", "production")
//!     .cwd("/srv/app")
//!     .proxy("bastion")
//!     .tty(false);
//! let remote = Remote::new(Shell::new(), "deploy@web1", options);
//! let ssh = remote.command(&cmd!("bin/rails db:migrate").unwrap());
//! assert!(ssh.render().starts_with("ssh -J bastion -o StrictHostKeyChecking=no"));
//! ```

use std::collections::BTreeMap;
use std::future::{Future, IntoFuture};
use std::pin::Pin;

use serde::de::DeserializeOwned;

use super::command::{escape, quote, Command, Value};
use super::exec::{ExecOptions, ShellResult};
use super::local::{Shell, ThrowPolicy};
use super::platform;
use crate::error::{Result, ShellError};

/// Per-host defaults for remote commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOptions {
    /// Variables set before the remote command; `None` renders as `NAME=`.
    pub env: BTreeMap<String, Option<String>>,

    /// Remote working directory.
    pub cwd: Option<String>,

    /// Request a pseudo-terminal. `None` follows whether stdin is a terminal.
    pub tty: Option<bool>,

    /// Jump hosts, in connection order.
    pub proxy: Vec<String>,

    /// Extra flags passed to `ssh` verbatim.
    pub ssh_flags: Vec<String>,

    /// Keep ssh's host key checking enabled.
    pub verify_host_keys: bool,
}

impl RemoteOptions {
    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), Some(value.into()));
        self
    }

    pub fn cwd(mut self, dir: impl Into<String>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn tty(mut self, tty: bool) -> Self {
        self.tty = Some(tty);
        self
    }

    /// Append a jump host.
    pub fn proxy(mut self, hop: impl Into<String>) -> Self {
        self.proxy.push(hop.into());
        self
    }

    pub fn ssh_flag(mut self, flag: impl Into<String>) -> Self {
        self.ssh_flags.push(flag.into());
        self
    }

    pub fn verify_host_keys(mut self, verify: bool) -> Self {
        self.verify_host_keys = verify;
        self
    }
}

/// Prefix `inner` with a directory change and variable assignments.
///
/// The directory is always single-quoted; values are escaped as tokens.
pub fn remote_command(
    inner: &str,
    env: &BTreeMap<String, Option<String>>,
    cwd: Option<&str>,
) -> String {
    let mut out = String::new();
    if let Some(cwd) = cwd {
        out.push_str(&format!("cd {} && ", quote(cwd)));
    }
    for (name, value) in env {
        match value {
            Some(value) => out.push_str(&format!("{}={} ", name, escape(value))),
            None => out.push_str(&format!("{}= ", name)),
        }
    }
    out.push_str(inner);
    out
}

/// The local `ssh` invocation that runs `remote` on `host`.
pub fn ssh_command(host: &str, remote: &str, tty: bool, options: &RemoteOptions) -> Command {
    let mut args: Vec<Value> = Vec::new();
    if tty {
        args.push("-t".into());
    }
    for hop in &options.proxy {
        args.push("-J".into());
        args.push(hop.into());
    }
    if !options.verify_host_keys {
        args.extend(
            [
                "-o",
                "StrictHostKeyChecking=no",
                "-o",
                "UserKnownHostsFile=/dev/null",
            ]
            .map(Value::from),
        );
    }
    args.extend(options.ssh_flags.iter().map(|flag| Value::raw(flag.as_str())));
    args.push(host.into());
    args.push(remote.into());
    Command::from_args("ssh", args)
}

/// SSH executor bound to one host.
#[derive(Debug, Clone)]
pub struct Remote {
    shell: Shell,
    host: String,
    options: RemoteOptions,
}

impl Remote {
    pub fn new(shell: Shell, host: impl Into<String>, options: RemoteOptions) -> Self {
        Self {
            shell,
            host: host.into(),
            options,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn options(&self) -> &RemoteOptions {
        &self.options
    }

    /// Replace the default environment for later commands.
    pub fn set_env(&mut self, env: BTreeMap<String, Option<String>>) {
        self.options.env = env;
    }

    pub fn set_cwd(&mut self, cwd: Option<String>) {
        self.options.cwd = cwd;
    }

    pub fn set_proxy(&mut self, proxy: Vec<String>) {
        self.options.proxy = proxy;
    }

    /// Prepare `command` for execution on the host.
    pub fn cmd(&self, command: Command) -> RemoteTask {
        RemoteTask {
            remote: self.clone(),
            command,
            env: BTreeMap::new(),
            cwd: None,
            tty: None,
            quiet: false,
            policy: ThrowPolicy::Default,
        }
    }

    /// The `ssh` command for `command` under this remote's defaults.
    pub fn command(&self, command: &Command) -> Command {
        self.assemble(command, &BTreeMap::new(), None, None)
    }

    /// Run `command` with a blocking spawn. No failure policy applies.
    pub fn run_sync(&self, command: &Command) -> Result<ShellResult> {
        let ssh = self.command(command);
        self.shell.run_sync(&ssh, &ExecOptions::default())
    }

    fn assemble(
        &self,
        command: &Command,
        env: &BTreeMap<String, Option<String>>,
        cwd: Option<&str>,
        tty: Option<bool>,
    ) -> Command {
        let mut merged = self.options.env.clone();
        merged.extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        let cwd = cwd.or(self.options.cwd.as_deref());
        let tty = tty
            .or(self.options.tty)
            .unwrap_or_else(platform::stdin_is_interactive);

        let remote = remote_command(&command.render(), &merged, cwd);
        tracing::debug!(host = %self.host, remote = %remote, tty, "assembled remote command");
        ssh_command(&self.host, &remote, tty, &self.options)
    }
}

/// A remote command waiting to run.
#[must_use = "a RemoteTask does nothing until it is run or awaited"]
#[derive(Debug, Clone)]
pub struct RemoteTask {
    remote: Remote,
    command: Command,
    env: BTreeMap<String, Option<String>>,
    cwd: Option<String>,
    tty: Option<bool>,
    quiet: bool,
    policy: ThrowPolicy,
}

impl RemoteTask {
    /// Set several remote variables.
    pub fn env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in vars {
            self.env.insert(key.into(), Some(value.into()));
        }
        self
    }

    pub fn env_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), Some(value.into()));
        self
    }

    /// Blank out a variable on the remote side.
    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.env.insert(key.into(), None);
        self
    }

    pub fn cwd(mut self, dir: impl Into<String>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn tty(mut self, tty: bool) -> Self {
        self.tty = Some(tty);
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn throws(mut self, throws: bool) -> Self {
        self.policy = throws.into();
        self
    }

    pub fn nothrow(self) -> Self {
        self.throws(false)
    }

    /// The local `ssh` command this task will run.
    pub fn ssh_command(&self) -> Command {
        self.remote
            .assemble(&self.command, &self.env, self.cwd.as_deref(), self.tty)
    }

    pub async fn run(self) -> ShellResult {
        let ssh = self.ssh_command();
        let mut task = self.remote.shell.cmd(ssh);
        if self.quiet {
            task = task.quiet();
        }
        match self.policy {
            ThrowPolicy::Default => {}
            ThrowPolicy::Always => task = task.throws(true),
            ThrowPolicy::Never => task = task.throws(false),
        }
        task.run().await
    }

    /// Run without terminating on failure; a non-zero exit becomes
    /// [`ShellError::CommandFailed`] carrying the ssh command.
    pub async fn try_run(self) -> Result<ShellResult> {
        let rendered = self.ssh_command().render();
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

    pub async fn text(self) -> String {
        self.run().await.text()
    }

    pub async fn lines(self) -> Vec<String> {
        self.run().await.lines()
    }

    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        self.run().await.json()
    }

    pub async fn bytes(self) -> Vec<u8> {
        self.run().await.into_stdout()
    }

    pub async fn test(self) -> bool {
        self.nothrow().run().await.success()
    }
}

impl IntoFuture for RemoteTask {
    type Output = ShellResult;
    type IntoFuture = Pin<Box<dyn Future<Output = ShellResult> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}
