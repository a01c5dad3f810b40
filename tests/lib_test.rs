//! Library integration tests.

use shellbracket::cmd;
use shellbracket::lifecycle::{Lifecycle, TempWorkspace};
use shellbracket::shell::{Command, Remote, RemoteOptions, Shell};
use shellbracket::ui::{Bracket, BracketOptions, OutputStream, Theme};
use shellbracket::ShellError;

fn quiet_shell() -> Shell {
    let (stream, _) = OutputStream::capture(false);
    Shell::new().verbose(false).diagnostics(stream)
}

#[test]
fn error_types_are_public() {
    let err = cmd!("echo {} {}", "only one").unwrap_err();
    assert!(matches!(err, ShellError::Template { .. }));
    assert!(err.to_string().contains("expected 2"));
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> shellbracket::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use shellbracket::cli::{Cli, Commands};

    let cli = Cli::parse_from(["shellbracket", "ssh", "web1", "--", "uptime"]);
    if let Commands::Ssh(args) = cli.command {
        assert_eq!(args.command, vec!["uptime"]);
    } else {
        panic!("Expected Ssh command");
    }
}

#[tokio::test]
async fn command_output_written_inside_bracket() {
    let shell = quiet_shell();
    let (stream, capture) = OutputStream::capture(false);
    let bracket = Bracket::with_options(
        "Build",
        stream,
        BracketOptions::new().theme(Theme::plain()),
    );

    bracket
        .using(|b| async move {
            b.task("compile");
            let out = shell.cmd(cmd!("printf {}", "a\\nb\\n").unwrap()).text().await;
            b.stream().write_str(&out).unwrap();
        })
        .await;

    insta::assert_snapshot!(capture.contents(), @r"
    ┌ Build
    │ • compile
    │ a
    │ b
    └
    ");
}

#[tokio::test]
async fn results_survive_nothrow() {
    let shell = quiet_shell();
    let result = shell
        .cmd(Command::literal("echo partial; exit 5"))
        .nothrow()
        .await;
    assert_eq!(result.exit_code(), 5);
    assert_eq!(result.text(), "partial\n");
}

#[test]
fn temp_workspace_usable_by_commands() {
    let lifecycle = Lifecycle::new();
    let workspace = TempWorkspace::new(&lifecycle).unwrap();
    let shell = quiet_shell();
    let result = shell
        .run_sync(
            &cmd!("echo data > {}", workspace.join("out file.txt")).unwrap(),
            &Default::default(),
        )
        .unwrap();
    assert!(result.success());
    assert!(workspace.join("out file.txt").exists());

    let path = workspace.path().to_path_buf();
    drop(workspace);
    assert!(!path.exists());
}

#[test]
fn remote_command_assembly_is_public() {
    let remote = Remote::new(
        quiet_shell(),
        "db1",
        RemoteOptions::default()
            .env_var("A", "1")
            .cwd("/tmp")
            .tty(false)
            .verify_host_keys(true),
    );
    let ssh = remote.command(&Command::literal("psql"));
    insta::assert_snapshot!(ssh.render(), @r"ssh db1 'cd '\''/tmp'\'' && A=1 psql'");
}
