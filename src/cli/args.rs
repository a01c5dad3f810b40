//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// shellbracket - Run shell commands inside bordered output sections.
#[derive(Debug, Parser)]
#[command(name = "shellbracket")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a YAML settings file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log commands, spinners and output tails
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a local command inside a bracket
    Run(RunArgs),

    /// Run a command on a remote host over ssh
    Ssh(SshArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, clap::Args)]
pub struct RunArgs {
    /// Return the command's exit code instead of aborting on failure
    #[arg(long)]
    pub nothrow: bool,

    /// Bracket title (defaults to the program name)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Program and arguments; each argument is escaped
    #[arg(last = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

/// Arguments for the `ssh` command.
#[derive(Debug, Clone, clap::Args)]
pub struct SshArgs {
    /// Destination host, optionally `user@host`
    pub host: String,

    /// Remote working directory
    #[arg(long)]
    pub cwd: Option<String>,

    /// Remote environment variable (repeatable)
    #[arg(short, long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Jump host, in connection order (repeatable)
    #[arg(long)]
    pub proxy: Vec<String>,

    /// Force a pseudo-terminal (default: only when stdin is a terminal)
    #[arg(long, conflicts_with = "no_tty")]
    pub tty: bool,

    /// Never request a pseudo-terminal
    #[arg(long)]
    pub no_tty: bool,

    /// Keep ssh host key checking enabled
    #[arg(long)]
    pub verify_host_keys: bool,

    /// Extra flag passed to ssh verbatim (repeatable)
    #[arg(long = "ssh-flag", allow_hyphen_values = true)]
    pub ssh_flags: Vec<String>,

    /// Return the exit code instead of aborting on failure
    #[arg(long)]
    pub nothrow: bool,

    /// Print the assembled ssh command without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Remote program and arguments; each argument is escaped
    #[arg(last = true, required = true, num_args = 1..)]
    pub command: Vec<String>,
}

impl SshArgs {
    /// Explicit tty choice, if any.
    pub fn tty_override(&self) -> Option<bool> {
        match (self.tty, self.no_tty) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{}`", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_trailing_command() {
        let cli = Cli::parse_from(["shellbracket", "run", "--nothrow", "--", "ls", "-la"]);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.nothrow);
                assert_eq!(args.command, vec!["ls", "-la"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_ssh_options() {
        let cli = Cli::parse_from([
            "shellbracket",
            "ssh",
            "web1",
            "--env",
            "A=1",
            "--proxy",
            "hop1",
            "--proxy",
            "hop2",
            "--dry-run",
            "--",
            "uptime",
        ]);
        match cli.command {
            Commands::Ssh(args) => {
                assert_eq!(args.host, "web1");
                assert_eq!(args.env, vec![("A".to_string(), "1".to_string())]);
                assert_eq!(args.proxy, vec!["hop1", "hop2"]);
                assert!(args.dry_run);
                assert_eq!(args.tty_override(), None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["shellbracket", "run", "--verbose", "--", "true"]);
        assert!(cli.verbose);
    }

    #[test]
    fn env_pair_requires_equals() {
        assert!(parse_env_pair("NOPE").is_err());
        assert!(parse_env_pair("=x").is_err());
        assert_eq!(
            parse_env_pair("K=a=b").unwrap(),
            ("K".to_string(), "a=b".to_string())
        );
    }
}
