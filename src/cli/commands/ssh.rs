//! Ssh command implementation.
//!
//! The `shellbracket ssh` command runs one command on a remote host, or with
//! `--dry-run` prints the assembled `ssh` invocation.

use crate::cli::args::SshArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::shell::{Command as ShellCommand, Remote, RemoteOptions, Shell};
use crate::ui::OutputStream;

use super::dispatcher::{Command, CommandResult};

/// The ssh command implementation.
pub struct SshCommand {
    settings: Settings,
    output: OutputStream,
    args: SshArgs,
}

impl SshCommand {
    /// Create a new ssh command.
    pub fn new(settings: Settings, output: OutputStream, args: SshArgs) -> Self {
        Self {
            settings,
            output,
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &SshArgs {
        &self.args
    }

    fn options(&self) -> RemoteOptions {
        let args = &self.args;
        let mut options = RemoteOptions {
            cwd: args.cwd.clone(),
            tty: args.tty_override(),
            proxy: args.proxy.clone(),
            ssh_flags: args.ssh_flags.clone(),
            verify_host_keys: args.verify_host_keys,
            ..Default::default()
        };
        for (key, value) in &args.env {
            options = options.env_var(key, value);
        }
        options
    }
}

impl Command for SshCommand {
    async fn execute(&self) -> Result<CommandResult> {
        let shell = Shell::with_settings(self.settings.clone());
        let remote = Remote::new(shell, &self.args.host, self.options());
        let task = remote.cmd(ShellCommand::from_argv(&self.args.command));

        if self.args.dry_run {
            self.output.write_line(&task.ssh_command().render())?;
            return Ok(CommandResult::success());
        }

        let result = task.throws(!self.args.nothrow).await;
        self.output.write_bytes(result.stdout())?;
        Ok(CommandResult::from_exit_code(result.exit_code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::args::{Cli, Commands};

    fn ssh_args(argv: &[&str]) -> SshArgs {
        let mut full = vec!["shellbracket", "ssh"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Ssh(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn dry_run_prints_assembled_command() {
        let (stream, capture) = OutputStream::capture(false);
        let cmd = SshCommand::new(
            Settings::default(),
            stream,
            ssh_args(&[
                "deploy@web1",
                "--cwd",
                "/tmp",
                "--env",
                "A=1",
                "--proxy",
                "bastion",
                "--tty",
                "--dry-run",
                "--",
                "ls",
                "-la",
            ]),
        );
        let result = cmd.execute().await.unwrap();
        assert!(result.success);
        assert_eq!(
            capture.contents(),
            "ssh -t -J bastion -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null \
             deploy@web1 'cd '\\''/tmp'\\'' && A=1 ls -la'\n"
        );
    }

    #[test]
    fn options_follow_flags() {
        let (stream, _) = OutputStream::capture(false);
        let cmd = SshCommand::new(
            Settings::default(),
            stream,
            ssh_args(&[
                "web1",
                "--env",
                "B=2",
                "--env",
                "A=1",
                "--no-tty",
                "--verify-host-keys",
                "--",
                "true",
            ]),
        );
        let options = cmd.options();
        assert_eq!(options.tty, Some(false));
        assert!(options.verify_host_keys);
        assert_eq!(
            options.env.keys().cloned().collect::<Vec<_>>(),
            vec!["A", "B"]
        );
        assert_eq!(cmd.args().host, "web1");
    }
}
