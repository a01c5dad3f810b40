//! Command dispatching.
//!
//! This module provides the core command infrastructure:
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use crate::cli::args::{Cli, Commands};
use crate::config::Settings;
use crate::error::Result;
use crate::ui::OutputStream;

/// Trait for command implementations.
///
/// Each CLI subcommand implements this trait to provide its execution logic.
pub trait Command {
    /// Execute the command.
    ///
    /// # Returns
    ///
    /// A [`CommandResult`] indicating success/failure and exit code.
    fn execute(&self) -> impl std::future::Future<Output = Result<CommandResult>>;
}

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    /// Create a failure result.
    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Result mirroring a process exit code.
    pub fn from_exit_code(exit_code: i32) -> Self {
        if exit_code == 0 {
            Self::success()
        } else {
            Self::failure(exit_code)
        }
    }
}

/// Dispatches CLI commands to their implementations.
pub struct CommandDispatcher {
    settings: Settings,
    output: OutputStream,
}

impl CommandDispatcher {
    /// Create a dispatcher writing command output to stdout.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            output: OutputStream::stdout(),
        }
    }

    /// Write command output to `stream` instead of stdout.
    pub fn with_output(mut self, stream: OutputStream) -> Self {
        self.output = stream;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Dispatch and execute a command.
    pub async fn dispatch(&self, cli: &Cli) -> Result<CommandResult> {
        match &cli.command {
            Commands::Run(args) => {
                let cmd = super::run::RunCommand::new(
                    self.settings.clone(),
                    self.output.clone(),
                    args.clone(),
                );
                cmd.execute().await
            }
            Commands::Ssh(args) => {
                let cmd = super::ssh::SshCommand::new(
                    self.settings.clone(),
                    self.output.clone(),
                    args.clone(),
                );
                cmd.execute().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn command_result_success() {
        let result = CommandResult::success();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn command_result_failure() {
        let result = CommandResult::failure(1);
        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn command_result_from_exit_code() {
        assert!(CommandResult::from_exit_code(0).success);
        assert_eq!(CommandResult::from_exit_code(3).exit_code, 3);
    }

    #[tokio::test]
    async fn dispatches_ssh_dry_run() {
        let (stream, capture) = OutputStream::capture(false);
        let dispatcher = CommandDispatcher::new(Settings::default()).with_output(stream);
        let cli = Cli::parse_from([
            "shellbracket",
            "ssh",
            "web1",
            "--verify-host-keys",
            "--no-tty",
            "--dry-run",
            "--",
            "uptime",
        ]);
        let result = dispatcher.dispatch(&cli).await.unwrap();
        assert!(result.success);
        assert_eq!(capture.contents(), "ssh web1 uptime\n");
    }
}
