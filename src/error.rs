//! Error types for shellbracket operations.
//!
//! This module defines [`ShellError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - A failing command is not an error by default: the executor prints
//!   diagnostics and terminates the process, or, under `nothrow`, hands the
//!   caller a [`ShellResult`](crate::shell::ShellResult) with the exit code
//! - Use `ShellError` for conditions a caller can act on (bad templates,
//!   undecodable output, I/O)
//! - Use `anyhow::Error` (via `ShellError::Other`) for cleanup routines and
//!   other unexpected errors

use thiserror::Error;

/// Core error type for shellbracket operations.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A command template had the wrong number of fragments for its values.
    #[error("Command template has {fragments} fragments for {values} values (expected {expected})")]
    Template {
        fragments: usize,
        values: usize,
        expected: usize,
    },

    /// The shell or transport process could not be started.
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Shell command exited non-zero.
    #[error("Command failed with exit code {code}: {command}")]
    CommandFailed { command: String, code: i32 },

    /// Command output could not be decoded as JSON.
    #[error("Failed to parse command output as JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file could not be parsed.
    #[error("Failed to parse settings at {path}: {message}")]
    Settings { path: String, message: String },

    /// Signal handlers could not be installed.
    #[error("Failed to install handler for {signal}: {message}")]
    Signal { signal: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for shellbracket operations.
pub type Result<T> = std::result::Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_error_displays_counts() {
        let err = ShellError::Template {
            fragments: 3,
            values: 1,
            expected: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("3 fragments"));
        assert!(msg.contains("1 values"));
    }

    #[test]
    fn spawn_error_displays_command_and_cause() {
        let err = ShellError::Spawn {
            command: "ssh box".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("ssh box"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn command_failed_displays_command_and_code() {
        let err = ShellError::CommandFailed {
            command: "npm install".into(),
            code: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("npm install"));
        assert!(msg.contains("2"));
    }

    #[test]
    fn settings_error_displays_path() {
        let err = ShellError::Settings {
            path: "/etc/shellbracket.yml".into(),
            message: "invalid type".into(),
        };
        assert!(err.to_string().contains("/etc/shellbracket.yml"));
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ShellError = io_err.into();
        assert!(matches!(err, ShellError::Io(_)));
    }

    #[test]
    fn json_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ShellError = json_err.into();
        assert!(matches!(err, ShellError::Json(_)));
    }

    #[test]
    fn result_type_alias_works() {
        fn returns_error() -> Result<()> {
            Err(ShellError::CommandFailed {
                command: "false".into(),
                code: 1,
            })
        }
        assert!(returns_error().is_err());
    }
}
