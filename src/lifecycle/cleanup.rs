//! Best-effort cleanup routines run at shutdown.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::ui::stream::lock;

type Routine = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

struct Entry {
    name: String,
    routine: Routine,
}

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    entries: Mutex<BTreeMap<u64, Entry>>,
}

/// Outcome of [`CleanupRegistry::run_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    /// Routines that were invoked.
    pub ran: usize,
    /// Routines that returned an error or panicked.
    pub failed: usize,
}

/// Registry of routines to run once when the process shuts down.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct CleanupRegistry {
    inner: Arc<RegistryInner>,
}

/// Handle returned by [`CleanupRegistry::register`].
///
/// Dropping the token leaves the routine registered; call
/// [`unregister`](Self::unregister) once the resource has been released.
#[derive(Debug)]
pub struct CleanupToken {
    id: u64,
    registry: Weak<RegistryInner>,
}

impl CleanupToken {
    /// Remove the routine. Returns `false` if it already ran or was removed.
    pub fn unregister(self) -> bool {
        match self.registry.upgrade() {
            Some(inner) => lock(&inner.entries).remove(&self.id).is_some(),
            None => false,
        }
    }
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `routine` under `name` (used in warnings).
    pub fn register<F>(&self, name: impl Into<String>, routine: F) -> CleanupToken
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner.entries).insert(
            id,
            Entry {
                name: name.into(),
                routine: Box::new(routine),
            },
        );
        CleanupToken {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Number of routines still registered.
    pub fn len(&self) -> usize {
        lock(&self.inner.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run and remove every registered routine, newest first.
    ///
    /// A routine that fails or panics is logged and does not stop the rest.
    pub fn run_all(&self) -> CleanupReport {
        let entries = std::mem::take(&mut *lock(&self.inner.entries));
        let mut report = CleanupReport::default();

        for (_, entry) in entries.into_iter().rev() {
            report.ran += 1;
            let name = entry.name;
            let routine = entry.routine;
            match panic::catch_unwind(AssertUnwindSafe(routine)) {
                Ok(Ok(())) => tracing::debug!(routine = %name, "cleanup ran"),
                Ok(Err(e)) => {
                    report.failed += 1;
                    tracing::warn!(routine = %name, "cleanup failed: {:#}", e);
                }
                Err(_) => {
                    report.failed += 1;
                    tracing::warn!(routine = %name, "cleanup panicked");
                }
            }
        }

        report
    }
}

impl std::fmt::Debug for CleanupRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanupRegistry")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn run_all_runs_newest_first() {
        let registry = CleanupRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = order.clone();
            registry.register(format!("r{}", n), move || {
                order.lock().unwrap().push(n);
                Ok(())
            });
        }
        let report = registry.run_all();
        assert_eq!(report, CleanupReport { ran: 3, failed: 0 });
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn run_all_only_runs_once() {
        let registry = CleanupRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        registry.register("count", move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        registry.run_all();
        let second = registry.run_all();
        assert_eq!(second.ran, 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregistered_routine_never_runs() {
        let registry = CleanupRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let token = registry.register("count", move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(token.unregister());
        assert!(registry.is_empty());
        registry.run_all();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unregister_after_run_returns_false() {
        let registry = CleanupRegistry::new();
        let token = registry.register("noop", || Ok(()));
        registry.run_all();
        assert!(!token.unregister());
    }

    #[test]
    fn failures_do_not_stop_remaining_routines() {
        let registry = CleanupRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        registry.register("survivor", move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        registry.register("errors", || anyhow::bail!("disk full"));
        registry.register("panics", || panic!("boom"));

        let report = registry.run_all();
        assert_eq!(report, CleanupReport { ran: 3, failed: 2 });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
