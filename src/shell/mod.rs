//! Shell command construction and execution.
//!
//! - [`command`] - Command templates and escaping
//! - [`exec`] - Process spawning and captured results
//! - [`local`] - Local executor with verbose logging and failure policy
//! - [`remote`] - SSH executor built on the local one

pub mod command;
pub mod exec;
pub mod local;
pub mod platform;
pub mod remote;

pub use command::{escape, quote, Command, Raw, Value};
pub use exec::{ExecOptions, ShellResult, SPAWN_FAILURE_CODE};
pub use local::{Shell, ShellTask, ThrowPolicy};
pub use platform::{is_ci, shell_flag, stdin_is_interactive, ShellType};
pub use remote::{remote_command, ssh_command, Remote, RemoteOptions, RemoteTask};
