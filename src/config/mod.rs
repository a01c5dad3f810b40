//! Configuration and process-wide toggles.
//!
//! - [`settings`] - Settings loaded from defaults, YAML and environment
//!
//! Verbose mode is a process-wide switch read by every executor at the moment
//! a command starts, so flipping it mid-script affects later commands only.

pub mod settings;

use std::sync::atomic::{AtomicBool, Ordering};

pub use settings::{env_flag, Settings, DEFAULT_FAILURE_TAIL, LEAVE_TEMP_ENV, VERBOSE_ENV};

static VERBOSE: AtomicBool = AtomicBool::new(false);
static LEAVE_TEMP: AtomicBool = AtomicBool::new(false);

/// Whether executors log commands and output.
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Turn verbose command logging on or off for the whole process.
pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::SeqCst);
}

/// Whether temp workspaces are kept when no environment override is set.
pub fn leave_temp_default() -> bool {
    LEAVE_TEMP.load(Ordering::SeqCst)
}

pub fn set_leave_temp_default(leave: bool) {
    LEAVE_TEMP.store(leave, Ordering::SeqCst);
}

impl Settings {
    /// Push process-wide toggles from these settings.
    pub fn apply_global(&self) {
        set_verbose(self.verbose);
        set_leave_temp_default(self.leave_temp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_toggle_round_trips() {
        let before = is_verbose();
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
        set_verbose(before);
    }
}
