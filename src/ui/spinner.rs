//! Progress spinners.
//!
//! A [`Spinner`] animates a single character in place on an
//! [`OutputStream`]: every tick writes the next glyph followed by a backspace,
//! so the cursor never moves. Stopping erases the glyph and optionally writes
//! a deferred payload, which is how a task line gets terminated once its work
//! is done. Dropping the last handle of a running spinner erases it the same
//! way.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::stream::{lock, suppress_interception, OutputStream};

/// Animation cycle.
pub const FRAMES: [&str; 4] = ["-", "\\", "|", "/"];

/// Written after every glyph so the next one lands on the same cell.
pub const BACKSPACE: &str = "\x08";

/// Written on stop to clear the last glyph.
pub const ERASE: &str = "\x1b[K";

/// Tick interval used by [`Spinner::new`].
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

struct Timer {
    cancel: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct SpinnerState {
    frame: usize,
    write_on_stop: Option<String>,
    timer: Option<Timer>,
}

struct SpinnerInner {
    stream: OutputStream,
    interval: Duration,
    running: AtomicBool,
    writing: AtomicBool,
    state: Mutex<SpinnerState>,
}

impl SpinnerInner {
    /// Write `text` with the writing flag raised and decoration suppressed.
    fn emit(&self, text: &str) {
        self.writing.store(true, Ordering::SeqCst);
        {
            let _suppressed = suppress_interception();
            self.stream.write_str(text).ok();
        }
        self.writing.store(false, Ordering::SeqCst);
    }

    fn tick(&self) {
        let mut state = lock(&self.state);
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        let frame = FRAMES[state.frame];
        self.emit(&format!("{}{}", frame, BACKSPACE));
        state.frame = (state.frame + 1) % FRAMES.len();
    }
}

impl Drop for SpinnerInner {
    fn drop(&mut self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = state.timer.take() {
            timer.cancel.send(()).ok();
        }
        let payload = state.write_on_stop.take();
        self.emit(ERASE);
        if let Some(payload) = payload {
            self.emit(&payload);
        }
    }
}

/// A single-glyph spinner bound to an output stream.
///
/// Cloning yields another handle to the same spinner.
#[derive(Clone)]
pub struct Spinner {
    inner: Arc<SpinnerInner>,
}

impl Spinner {
    /// Create a stopped spinner ticking every [`DEFAULT_INTERVAL`].
    pub fn new(stream: OutputStream) -> Self {
        Self::with_interval(stream, DEFAULT_INTERVAL)
    }

    /// Create a stopped spinner with a custom tick interval.
    pub fn with_interval(stream: OutputStream, interval: Duration) -> Self {
        Self {
            inner: Arc::new(SpinnerInner {
                stream,
                interval,
                running: AtomicBool::new(false),
                writing: AtomicBool::new(false),
                state: Mutex::new(SpinnerState::default()),
            }),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Whether a frame write is in progress right now.
    pub fn is_writing(&self) -> bool {
        self.inner.writing.load(Ordering::SeqCst)
    }

    /// Whether both handles drive the same spinner.
    pub fn same_as(&self, other: &Spinner) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Start animating. No-op if already running.
    pub fn start(&self) {
        let mut state = lock(&self.inner.state);
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let (cancel, cancelled) = mpsc::channel::<()>();
        let weak: Weak<SpinnerInner> = Arc::downgrade(&self.inner);
        let interval = self.inner.interval;
        let handle = thread::spawn(move || loop {
            match cancelled.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => match weak.upgrade() {
                    Some(inner) => inner.tick(),
                    None => break,
                },
                _ => break,
            }
        });
        state.timer = Some(Timer { cancel, handle });
    }

    /// Stop animating. No-op (and no output) if not running.
    ///
    /// Clears the glyph, then writes and clears any deferred payload.
    pub fn stop(&self) {
        let timer = {
            let mut state = lock(&self.inner.state);
            if !self.inner.running.swap(false, Ordering::SeqCst) {
                return;
            }
            self.inner.emit(ERASE);
            if let Some(payload) = state.write_on_stop.take() {
                self.inner.emit(&payload);
            }
            state.timer.take()
        };

        if let Some(timer) = timer {
            timer.cancel.send(()).ok();
            if timer.handle.thread().id() != thread::current().id() {
                timer.handle.join().ok();
            }
        }
    }

    /// The payload queued for the next [`stop`](Self::stop).
    pub fn write_on_stop(&self) -> Option<String> {
        lock(&self.inner.state).write_on_stop.clone()
    }

    /// Queue (or clear) a payload for the next [`stop`](Self::stop).
    pub fn set_write_on_stop(&self, payload: Option<String>) {
        lock(&self.inner.state).write_on_stop = payload;
    }

    #[cfg(test)]
    pub(crate) fn tick(&self) {
        self.inner.tick();
    }
}

impl std::fmt::Debug for Spinner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spinner")
            .field("stream", &self.inner.stream)
            .field("running", &self.is_running())
            .finish()
    }
}
