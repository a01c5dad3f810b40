//! Bordered output sections.
//!
//! A [`Bracket`] prints a header, then decorates its target stream so every
//! line written to it (by anyone holding the stream) is prefixed with a body
//! glyph, and finally restores the stream and prints a footer:
//!
//! ```text
//! ┌ Deploy
//! │ host: web-1
//! │ • Upload artifacts
//! │ uploading 3 files
//! └
//! ```
//!
//! Tasks inside a bracket may show a [`Spinner`]. The decorator stops the
//! spinner before any textual write, waiting for a frame in flight, and
//! restarts it once the written line is closed, so animation frames never land
//! in the middle of a line.

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::spinner::{Spinner, BACKSPACE, DEFAULT_INTERVAL, ERASE};
use super::stream::{interception_suppressed, lock, OutputStream, Payload, Writer};
use super::theme::Theme;

/// Options for a [`Bracket`].
#[derive(Debug, Clone)]
pub struct BracketOptions {
    /// Lines printed under the header before capture begins.
    pub details: Vec<String>,
    /// Show a spinner after each task description (interactive streams only).
    pub spinners: bool,
    /// Separate consecutive tasks with a blank line.
    pub task_gap: bool,
    /// Spinner tick interval.
    pub spinner_interval: Duration,
    /// Theme override; chosen from the stream when `None`.
    pub theme: Option<Theme>,
}

impl Default for BracketOptions {
    fn default() -> Self {
        Self {
            details: Vec::new(),
            spinners: true,
            task_gap: false,
            spinner_interval: DEFAULT_INTERVAL,
            theme: None,
        }
    }
}

impl BracketOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detail(mut self, line: impl Into<String>) -> Self {
        self.details.push(line.into());
        self
    }

    pub fn spinners(mut self, enabled: bool) -> Self {
        self.spinners = enabled;
        self
    }

    pub fn task_gap(mut self, enabled: bool) -> Self {
        self.task_gap = enabled;
        self
    }

    pub fn spinner_interval(mut self, interval: Duration) -> Self {
        self.spinner_interval = interval;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }
}

/// Payload that finishes a task line once its spinner stops: step back over
/// the trailing space, clear to end of line, and break the line.
fn task_stop_payload() -> String {
    format!("{}{}\n", BACKSPACE, ERASE)
}

type TaskSlot = Arc<Mutex<Option<Spinner>>>;

/// Writer installed on the target stream while a bracket is capturing.
struct LinePrefixer {
    inner: Arc<dyn Writer>,
    prefix: String,
    continuation: AtomicBool,
    serial: Mutex<()>,
    task: TaskSlot,
    /// Spinner paused by a write that left its line open.
    held: Mutex<Option<Spinner>>,
}

impl LinePrefixer {
    /// Stop the task spinner, waiting out any frame the timer is writing.
    fn pause_spinner(&self) -> Option<Spinner> {
        let spinner = lock(&self.task).clone()?;
        if spinner.is_running() {
            spinner.stop();
            Some(spinner)
        } else {
            None
        }
    }

    /// Restart `spinner` once the current line is closed, unless a newer
    /// task has replaced it.
    fn resume_spinner(&self, spinner: Spinner) {
        if self.continuation.load(Ordering::SeqCst) {
            *lock(&self.held) = Some(spinner);
            return;
        }
        let current = lock(&self.task)
            .as_ref()
            .is_some_and(|task| task.same_as(&spinner));
        if current {
            spinner.start();
        }
    }

    fn write_segments(&self, text: &str) -> io::Result<()> {
        for segment in text.split_inclusive('\n') {
            if !self.continuation.load(Ordering::SeqCst) {
                self.inner.write(Payload::Text(&self.prefix))?;
            }
            self.inner.write(Payload::Text(segment))?;
            self.continuation
                .store(!segment.ends_with('\n'), Ordering::SeqCst);
        }
        Ok(())
    }
}

impl Writer for LinePrefixer {
    fn write(&self, payload: Payload<'_>) -> io::Result<()> {
        let text = match payload {
            Payload::Bytes(_) => return self.inner.write(payload),
            Payload::Text(text) => text,
        };

        if interception_suppressed() {
            self.inner.write(payload)?;
            if text.contains('\n') {
                self.continuation
                    .store(!text.ends_with('\n'), Ordering::SeqCst);
            }
            return Ok(());
        }

        let _serial = lock(&self.serial);
        let paused = self.pause_spinner().or_else(|| lock(&self.held).take());
        let result = self.write_segments(text);
        if let Some(spinner) = paused {
            self.resume_spinner(spinner);
        }
        result
    }
}

#[derive(Default)]
struct BracketState {
    started: bool,
    finalized: bool,
    has_task: bool,
    saved: Option<Arc<dyn Writer>>,
}

struct BracketInner {
    title: String,
    stream: OutputStream,
    options: BracketOptions,
    theme: Theme,
    state: Mutex<BracketState>,
    task: TaskSlot,
}

impl BracketInner {
    fn start(&self) {
        let mut state = lock(&self.state);
        if state.finalized || state.saved.is_some() {
            return;
        }

        if !state.started {
            state.started = true;
            self.stream
                .write_line(&self.theme.format_header(&self.title))
                .ok();
            for detail in &self.options.details {
                self.stream
                    .write_line(&self.theme.format_detail(detail))
                    .ok();
            }
        }

        let prefix = self.theme.body_prefix();
        let task = self.task.clone();
        let saved = self.stream.decorate(move |inner| {
            Arc::new(LinePrefixer {
                inner,
                prefix,
                continuation: AtomicBool::new(false),
                serial: Mutex::new(()),
                task,
                held: Mutex::new(None),
            })
        });
        state.saved = Some(saved);
        tracing::debug!(bracket = %self.title, stream = self.stream.name(), "capture installed");
    }

    fn stop_task(&self) {
        let previous = lock(&self.task).take();
        if let Some(spinner) = previous {
            spinner.stop();
        }
    }

    fn finalize(&self) {
        let mut state = lock(&self.state);
        if state.finalized {
            return;
        }
        state.finalized = true;

        self.stop_task();

        if let Some(saved) = state.saved.take() {
            self.stream.restore(saved);
            tracing::debug!(bracket = %self.title, stream = self.stream.name(), "capture restored");
        }

        if state.started {
            self.stream.write_line(&self.theme.format_footer()).ok();
        }
    }
}

impl Drop for BracketInner {
    fn drop(&mut self) {
        self.finalize();
    }
}

/// A titled, bordered section on an output stream.
///
/// Cloning yields another handle to the same section. The section finalizes
/// when [`finalize`](Self::finalize) is called or the last handle drops.
#[derive(Clone)]
pub struct Bracket {
    inner: Arc<BracketInner>,
}

/// Finalizes the bracket when a scope exits, including by panic.
struct FinalizeOnDrop(Bracket);

impl Drop for FinalizeOnDrop {
    fn drop(&mut self) {
        self.0.finalize();
    }
}

impl Bracket {
    /// Create a bracket with default options.
    pub fn new(title: impl Into<String>, stream: OutputStream) -> Self {
        Self::with_options(title, stream, BracketOptions::default())
    }

    pub fn with_options(
        title: impl Into<String>,
        stream: OutputStream,
        options: BracketOptions,
    ) -> Self {
        let theme = options
            .theme
            .clone()
            .unwrap_or_else(|| Theme::for_stream(&stream));
        Self {
            inner: Arc::new(BracketInner {
                title: title.into(),
                stream,
                options,
                theme,
                state: Mutex::new(BracketState::default()),
                task: Arc::new(Mutex::new(None)),
            }),
        }
    }

    pub fn title(&self) -> &str {
        &self.inner.title
    }

    pub fn stream(&self) -> &OutputStream {
        &self.inner.stream
    }

    /// Whether the stream is currently decorated by this bracket.
    pub fn is_capturing(&self) -> bool {
        lock(&self.inner.state).saved.is_some()
    }

    /// Whether a task has been started in this bracket.
    pub fn has_task(&self) -> bool {
        lock(&self.inner.state).has_task
    }

    /// The spinner of the current task, if one is showing.
    pub fn task_spinner(&self) -> Option<Spinner> {
        lock(&self.inner.task).clone()
    }

    /// Print the header and details, then start decorating the stream.
    ///
    /// Calling this again while capturing keeps the original saved writer.
    pub fn start(&self) {
        self.inner.start();
    }

    /// Stop the task spinner, restore the stream, and print the footer.
    ///
    /// Only the first call has any effect.
    pub fn finalize(&self) {
        self.inner.finalize();
    }

    /// Begin a task: finish the previous one and print a bulleted description.
    pub fn task(&self, description: &str) {
        let inner = &self.inner;
        let mut state = lock(&inner.state);

        inner.stop_task();

        if inner.options.task_gap && state.has_task {
            inner.stream.write_str("\n").ok();
        }
        state.has_task = true;

        let line = inner.theme.format_task(description);
        if inner.options.spinners && inner.stream.is_interactive() {
            inner.stream.write_str(&format!("{} ", line)).ok();
            let spinner =
                Spinner::with_interval(inner.stream.clone(), inner.options.spinner_interval);
            spinner.set_write_on_stop(Some(task_stop_payload()));
            *lock(&inner.task) = Some(spinner.clone());
            spinner.start();
        } else {
            inner.stream.write_line(&line).ok();
        }
    }

    /// Run `body` inside the bracket, finalizing on every exit path.
    pub fn using_sync<F, T>(self, body: F) -> T
    where
        F: FnOnce(&Bracket) -> T,
    {
        self.start();
        let guard = FinalizeOnDrop(self.clone());
        let out = body(&self);
        drop(guard);
        out
    }

    /// Run the future produced by `body` inside the bracket, finalizing on
    /// every exit path (including cancellation of the returned future).
    pub async fn using<F, Fut, T>(self, body: F) -> T
    where
        F: FnOnce(Bracket) -> Fut,
        Fut: Future<Output = T>,
    {
        self.start();
        let guard = FinalizeOnDrop(self.clone());
        let out = body(self.clone()).await;
        drop(guard);
        out
    }
}

impl std::fmt::Debug for Bracket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bracket")
            .field("title", &self.inner.title)
            .field("stream", &self.inner.stream)
            .finish()
    }
}
