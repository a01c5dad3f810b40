//! Run command implementation.
//!
//! The `shellbracket run` command executes one local command inside a
//! bracket titled after the program.

use crate::cli::args::RunArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::lifecycle::Lifecycle;
use crate::shell::{Command as ShellCommand, Shell};
use crate::ui::{Bracket, BracketOptions, OutputStream, Theme};

use super::dispatcher::{Command, CommandResult};

/// The run command implementation.
pub struct RunCommand {
    settings: Settings,
    output: OutputStream,
    args: RunArgs,
}

impl RunCommand {
    /// Create a new run command.
    pub fn new(settings: Settings, output: OutputStream, args: RunArgs) -> Self {
        Self {
            settings,
            output,
            args,
        }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &RunArgs {
        &self.args
    }

    fn title(&self) -> String {
        self.args
            .title
            .clone()
            .or_else(|| self.args.command.first().cloned())
            .unwrap_or_else(|| "run".to_string())
    }

    fn bracket(&self) -> Bracket {
        let options = BracketOptions::new()
            .spinners(self.settings.spinners)
            .spinner_interval(self.settings.spinner_interval());
        Bracket::with_options(self.title(), self.output.clone(), options)
    }
}

impl Command for RunCommand {
    async fn execute(&self) -> Result<CommandResult> {
        let shell = Shell::with_settings(self.settings.clone());
        let command = ShellCommand::from_argv(&self.args.command);
        let nothrow = self.args.nothrow;
        let theme = Theme::for_stream(&self.output);
        let lifecycle = Lifecycle::process();

        let bracket = self.bracket();
        // Close the box if a failure exits the process mid-bracket.
        let closer = bracket.clone();
        let token = lifecycle.registry().register("close bracket", move || {
            closer.finalize();
            Ok(())
        });

        let result = bracket
            .using(|b| async move {
                b.task(&command.render());
                let result = shell.cmd(command).throws(!nothrow).await;
                if let Some(spinner) = b.task_spinner() {
                    spinner.stop();
                }

                let mut out = result.text();
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push('\n');
                }
                b.stream().write_str(&out).ok();
                if !result.success() {
                    b.stream()
                        .write_line(&theme.format_error(&format!(
                            "exit code {}",
                            result.exit_code()
                        )))
                        .ok();
                }
                result
            })
            .await;
        token.unregister();

        tracing::debug!(code = result.exit_code(), "run finished");
        Ok(CommandResult::from_exit_code(result.exit_code()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::args::{Cli, Commands};

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["shellbracket", "run"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Run(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[tokio::test]
    async fn output_lands_inside_bracket() {
        let (stream, capture) = OutputStream::capture(false);
        let cmd = RunCommand::new(
            Settings::default(),
            stream,
            run_args(&["--title", "Greeting", "--", "echo", "hello world"]),
        );
        let result = cmd.execute().await.unwrap();
        assert!(result.success);
        assert_eq!(
            capture.contents(),
            "┌ Greeting\n│ • echo 'hello world'\n│ hello world\n└\n"
        );
    }

    #[tokio::test]
    async fn nothrow_reports_exit_code() {
        let (stream, capture) = OutputStream::capture(false);
        let cmd = RunCommand::new(
            Settings::default(),
            stream,
            run_args(&["--nothrow", "--", "sh", "-c", "exit 3"]),
        );
        let result = cmd.execute().await.unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
        let out = capture.contents();
        assert!(out.starts_with("┌ sh\n"));
        assert!(out.contains("exit code 3"));
        assert!(out.ends_with("└\n"));
    }

    #[test]
    fn title_defaults_to_program() {
        let (stream, _) = OutputStream::capture(false);
        let cmd = RunCommand::new(Settings::default(), stream, run_args(&["--", "ls", "-l"]));
        assert_eq!(cmd.title(), "ls");
        assert_eq!(cmd.args().command, vec!["ls", "-l"]);
    }
}
