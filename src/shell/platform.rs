//! Platform-specific shell detection.

use std::io::IsTerminal;
use std::path::Path;

/// Shell families, grouped by how they take a command string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    /// `sh`, `bash`, `zsh` and anything else that accepts `-c`.
    Posix,
    PowerShell,
    Cmd,
}

impl ShellType {
    /// Parse shell type from executable name.
    pub fn from_executable(exe: &str) -> Self {
        let name = Path::new(exe)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match name.as_str() {
            "powershell" | "pwsh" => ShellType::PowerShell,
            "cmd" => ShellType::Cmd,
            _ => ShellType::Posix,
        }
    }

    /// The flag that makes this shell run its next argument as a command.
    pub fn command_flag(self) -> &'static str {
        match self {
            ShellType::Posix => "-c",
            ShellType::PowerShell => "-Command",
            ShellType::Cmd => "/C",
        }
    }
}

/// The flag that makes `shell` run its next argument as a command string.
pub fn shell_flag(shell: &Path) -> &'static str {
    ShellType::from_executable(&shell.to_string_lossy()).command_flag()
}

const CI_VARS: [&str; 6] = [
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
];

/// Check if running in a CI environment.
///
/// Checks common CI environment variables: `CI`, `GITHUB_ACTIONS`,
/// `GITLAB_CI`, `CIRCLECI`, `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    ci_detected(|name| std::env::var_os(name).is_some())
}

fn ci_detected(is_set: impl Fn(&str) -> bool) -> bool {
    CI_VARS.iter().any(|name| is_set(name))
}

/// Whether stdin is an interactive terminal.
///
/// Remote sessions request a pseudo-terminal by default only when this holds.
pub fn stdin_is_interactive() -> bool {
    std::io::stdin().is_terminal() && !is_ci()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_type_from_executable() {
        assert_eq!(ShellType::from_executable("/bin/bash"), ShellType::Posix);
        assert_eq!(ShellType::from_executable("/usr/bin/zsh"), ShellType::Posix);
        assert_eq!(ShellType::from_executable("/bin/sh"), ShellType::Posix);
        assert_eq!(ShellType::from_executable("pwsh"), ShellType::PowerShell);
        assert_eq!(ShellType::from_executable("cmd.exe"), ShellType::Cmd);
    }

    #[test]
    fn shell_flags() {
        assert_eq!(shell_flag(Path::new("/bin/sh")), "-c");
        assert_eq!(shell_flag(Path::new("/bin/bash")), "-c");
        assert_eq!(shell_flag(Path::new("cmd.exe")), "/C");
        assert_eq!(shell_flag(Path::new("pwsh")), "-Command");
    }

    #[test]
    fn ci_detected_from_any_known_variable() {
        assert!(!ci_detected(|_| false));
        assert!(ci_detected(|name| name == "GITHUB_ACTIONS"));
        assert!(ci_detected(|name| name == "JENKINS_URL"));
        assert!(!ci_detected(|name| name == "BUILDKITE_X"));
    }
}
