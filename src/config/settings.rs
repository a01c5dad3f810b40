//! Runtime settings.
//!
//! Settings come from, in increasing priority:
//! 1. Built-in defaults
//! 2. An optional YAML file
//! 3. Environment variables (`SHELLBRACKET_VERBOSE`, `SHELLBRACKET_LEAVE_TEMP`)
//! 4. CLI flags (applied by the caller)

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShellError};
use crate::ui::Tail;

/// Enables verbose command logging when truthy.
pub const VERBOSE_ENV: &str = "SHELLBRACKET_VERBOSE";

/// Keeps temp workspaces on disk when truthy.
pub const LEAVE_TEMP_ENV: &str = "SHELLBRACKET_LEAVE_TEMP";

/// Lines of output shown when a command fails.
pub const DEFAULT_FAILURE_TAIL: usize = 50;

/// Executor and display settings.
///
/// # Example
///
/// ```
/// use shellbracket::config::Settings;
///
/// let settings: Settings = serde_yaml::from_str("verbose: true\nfailure_tail: 10").unwrap();
/// assert!(settings.verbose);
/// assert_eq!(settings.failure_tail, 10);
/// assert_eq!(settings.shell, "/bin/sh");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Log commands, spinners and output tails to stderr.
    pub verbose: bool,

    /// Lines echoed after a successful command in verbose mode (`None` = all).
    pub success_tail: Option<usize>,

    /// Lines echoed after a failed command.
    pub failure_tail: usize,

    /// Spinner tick interval in milliseconds.
    pub spinner_interval_ms: u64,

    /// Animate spinners on interactive streams.
    pub spinners: bool,

    /// Keep temp workspaces instead of deleting them.
    pub leave_temp: bool,

    /// Shell used to run rendered commands.
    pub shell: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            verbose: false,
            success_tail: None,
            failure_tail: DEFAULT_FAILURE_TAIL,
            spinner_interval_ms: 100,
            spinners: true,
            leave_temp: false,
            shell: "/bin/sh".to_string(),
        }
    }
}

impl Settings {
    /// Load defaults, then `path` if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.with_env_overrides())
    }

    /// Parse a YAML settings file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            ShellError::Settings { message, .. } => ShellError::Settings {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parse YAML settings text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ShellError::Settings {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `SHELLBRACKET_*` environment variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(verbose) = env_flag(VERBOSE_ENV) {
            self.verbose = verbose;
        }
        if let Some(leave) = env_flag(LEAVE_TEMP_ENV) {
            self.leave_temp = leave;
        }
        self
    }

    pub fn spinner_interval(&self) -> Duration {
        Duration::from_millis(self.spinner_interval_ms)
    }

    pub fn success_tail(&self) -> Tail {
        Tail::from_limit(self.success_tail)
    }

    pub fn failure_tail(&self) -> Tail {
        Tail::Last(self.failure_tail)
    }

    pub fn shell_path(&self) -> PathBuf {
        PathBuf::from(&self.shell)
    }
}

/// Read a boolean-ish environment variable.
///
/// `1`, `true`, `yes` and `on` are true; `0`, `false`, `no`, `off` and the
/// empty string are false; unset or anything else is `None`.
pub fn env_flag(name: &str) -> Option<bool> {
    parse_flag(&std::env::var(name).ok()?)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
