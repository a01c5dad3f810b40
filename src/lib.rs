//! shellbracket - Scripted shell commands with bracketed terminal output.
//!
//! shellbracket runs local and SSH-remote commands built from escaped
//! templates, and groups their terminal output into titled, bordered
//! sections with in-place spinners.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Settings and process-wide toggles
//! - [`error`] - Error types and result aliases
//! - [`lifecycle`] - Shutdown cleanup, signal handling and temp workspaces
//! - [`shell`] - Command templates, local and remote execution
//! - [`ui`] - Output streams, spinners and brackets
//!
//! # Example
//!
//! ```
//! use shellbracket::cmd;
//!
//! let command = cmd!("grep -r {} {}", "TODO: fix", vec!["src", "tests"]).unwrap();
//! assert_eq!(command.render(), "grep -r 'TODO: fix' src tests");
//! ```
//!
//! For executor behavior, see the integration tests.

pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod shell;
pub mod ui;

pub use error::{Result, ShellError};
