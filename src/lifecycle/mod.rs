//! Process lifecycle: shutdown cleanup, signals and temp workspaces.
//!
//! - [`cleanup`] - Registry of best-effort cleanup routines
//! - [`signals`] - SIGINT/SIGTERM/SIGHUP/SIGQUIT handling
//! - [`temp`] - Temp directories removed at drop or shutdown

pub mod cleanup;
pub mod signals;
pub mod temp;

use std::sync::OnceLock;

pub use cleanup::{CleanupRegistry, CleanupReport, CleanupToken};
pub use signals::ShutdownSignal;
pub use temp::{leave_temp, TempWorkspace};

use crate::error::Result;

/// Owner of the cleanup registry and the process exit path.
#[derive(Debug, Default)]
pub struct Lifecycle {
    registry: CleanupRegistry,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lifecycle shared by everything in this process.
    pub fn process() -> &'static Lifecycle {
        static PROCESS: OnceLock<Lifecycle> = OnceLock::new();
        PROCESS.get_or_init(Lifecycle::new)
    }

    pub fn registry(&self) -> &CleanupRegistry {
        &self.registry
    }

    /// Run every cleanup routine.
    pub fn shutdown(&self) -> CleanupReport {
        self.registry.run_all()
    }

    /// Run every cleanup routine, then exit the process with `code`.
    pub fn exit(&self, code: i32) -> ! {
        let report = self.shutdown();
        tracing::debug!(code, ran = report.ran, failed = report.failed, "exiting");
        std::process::exit(code)
    }

    /// Route shutdown signals through [`exit`](Self::exit). Needs a tokio runtime.
    pub fn install_signal_handlers(&'static self) -> Result<()> {
        signals::install(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_lifecycle_is_shared() {
        assert!(std::ptr::eq(Lifecycle::process(), Lifecycle::process()));
    }

    #[test]
    fn shutdown_runs_registered_routines() {
        let lifecycle = Lifecycle::new();
        lifecycle.registry().register("noop", || Ok(()));
        assert_eq!(lifecycle.shutdown().ran, 1);
        assert!(lifecycle.registry().is_empty());
    }
}
