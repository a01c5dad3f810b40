//! Shutdown signals and their exit codes.

use crate::error::Result;

use super::Lifecycle;

/// Signals that trigger cleanup and exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShutdownSignal {
    /// SIGINT (Ctrl-C).
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGHUP.
    Hangup,
    /// SIGQUIT.
    Quit,
}

impl ShutdownSignal {
    pub const ALL: [ShutdownSignal; 4] = [
        ShutdownSignal::Interrupt,
        ShutdownSignal::Terminate,
        ShutdownSignal::Hangup,
        ShutdownSignal::Quit,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Hangup => "SIGHUP",
            Self::Quit => "SIGQUIT",
        }
    }

    /// The POSIX signal number.
    #[cfg(unix)]
    pub fn number(self) -> i32 {
        match self {
            Self::Interrupt => libc::SIGINT,
            Self::Terminate => libc::SIGTERM,
            Self::Hangup => libc::SIGHUP,
            Self::Quit => libc::SIGQUIT,
        }
    }

    /// The POSIX signal number.
    #[cfg(not(unix))]
    pub fn number(self) -> i32 {
        match self {
            Self::Interrupt => 2,
            Self::Terminate => 15,
            Self::Hangup => 1,
            Self::Quit => 3,
        }
    }

    /// Conventional shell exit status for death by this signal.
    pub fn exit_code(self) -> i32 {
        128 + self.number()
    }

    #[cfg(unix)]
    fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;
        match self {
            Self::Interrupt => SignalKind::interrupt(),
            Self::Terminate => SignalKind::terminate(),
            Self::Hangup => SignalKind::hangup(),
            Self::Quit => SignalKind::quit(),
        }
    }
}

/// Spawn one listener per shutdown signal on the current tokio runtime.
///
/// When a signal arrives, every cleanup routine runs and the process exits
/// with [`ShutdownSignal::exit_code`].
#[cfg(unix)]
pub fn install(lifecycle: &'static Lifecycle) -> Result<()> {
    use crate::error::ShellError;
    use tokio::signal::unix::signal;

    for sig in ShutdownSignal::ALL {
        let mut stream = signal(sig.kind()).map_err(|e| ShellError::Signal {
            signal: sig.name().to_string(),
            message: e.to_string(),
        })?;
        tokio::spawn(async move {
            if stream.recv().await.is_some() {
                tracing::debug!(signal = sig.name(), "shutting down");
                lifecycle.exit(sig.exit_code());
            }
        });
    }
    Ok(())
}

/// Spawn a Ctrl-C listener on the current tokio runtime.
#[cfg(not(unix))]
pub fn install(lifecycle: &'static Lifecycle) -> Result<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => lifecycle.exit(ShutdownSignal::Interrupt.exit_code()),
            Err(e) => tracing::warn!("Ctrl-C handler failed: {}", e),
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_shell_convention() {
        assert_eq!(ShutdownSignal::Interrupt.exit_code(), 130);
        assert_eq!(ShutdownSignal::Terminate.exit_code(), 143);
        assert_eq!(ShutdownSignal::Hangup.exit_code(), 129);
        assert_eq!(ShutdownSignal::Quit.exit_code(), 131);
    }

    #[test]
    fn names() {
        let names: Vec<_> = ShutdownSignal::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["SIGINT", "SIGTERM", "SIGHUP", "SIGQUIT"]);
    }

    #[tokio::test]
    async fn install_succeeds_inside_runtime() {
        let lifecycle: &'static Lifecycle = Box::leak(Box::new(Lifecycle::new()));
        assert!(install(lifecycle).is_ok());
    }
}
