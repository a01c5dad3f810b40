//! Output streams with a replaceable writer.
//!
//! An [`OutputStream`] is a shared handle around a single writer slot. Writes
//! go to whatever [`Writer`] currently occupies the slot, which lets a
//! [`Bracket`](super::Bracket) decorate a stream for a scoped duration and put
//! the previous writer back afterwards.

use std::cell::Cell;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use console::Term;

/// A chunk handed to a [`Writer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    /// UTF-8 text, subject to line decoration.
    Text(&'a str),
    /// Raw bytes, always passed through untouched.
    Bytes(&'a [u8]),
}

impl Payload<'_> {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}

/// Destination for stream output.
///
/// Writers are shared between the application and a spinner's timer thread,
/// so they take `&self` and synchronize internally.
pub trait Writer: Send + Sync {
    fn write(&self, payload: Payload<'_>) -> io::Result<()>;
}

/// Writer backed by a terminal handle (stdout or stderr).
pub struct TermWriter {
    term: Term,
}

impl TermWriter {
    pub fn new(term: Term) -> Self {
        Self { term }
    }
}

impl Writer for TermWriter {
    fn write(&self, payload: Payload<'_>) -> io::Result<()> {
        let mut term = &self.term;
        term.write_all(payload.as_bytes())?;
        term.flush()
    }
}

/// In-memory writer that records every byte written to it.
#[derive(Clone, Default)]
pub struct CaptureWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CaptureWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, decoded lossily.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&lock(&self.buf)).into_owned()
    }

    pub fn bytes(&self) -> Vec<u8> {
        lock(&self.buf).clone()
    }

    pub fn clear(&self) {
        lock(&self.buf).clear();
    }
}

impl Writer for CaptureWriter {
    fn write(&self, payload: Payload<'_>) -> io::Result<()> {
        lock(&self.buf).extend_from_slice(payload.as_bytes());
        Ok(())
    }
}

thread_local! {
    static SUPPRESSED: Cell<bool> = const { Cell::new(false) };
}

/// Scoped flag marking writes on this thread as exempt from decoration.
///
/// Spinners hold one of these around their own frame writes so a bracket
/// decorating the same stream passes them through untouched instead of
/// stopping the spinner that is writing.
pub struct SuppressGuard {
    previous: bool,
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        SUPPRESSED.with(|flag| flag.set(self.previous));
    }
}

/// Mark writes on the current thread as exempt until the guard drops.
pub fn suppress_interception() -> SuppressGuard {
    let previous = SUPPRESSED.with(|flag| flag.replace(true));
    SuppressGuard { previous }
}

/// Whether the current thread is inside a [`suppress_interception`] scope.
pub fn interception_suppressed() -> bool {
    SUPPRESSED.with(Cell::get)
}

struct StreamInner {
    name: String,
    interactive: bool,
    slot: Mutex<Arc<dyn Writer>>,
}

/// A named output stream with a single replaceable writer slot.
#[derive(Clone)]
pub struct OutputStream {
    inner: Arc<StreamInner>,
}

impl fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputStream")
            .field("name", &self.inner.name)
            .field("interactive", &self.inner.interactive)
            .finish()
    }
}

impl OutputStream {
    /// Create a stream around `writer`.
    pub fn new(name: impl Into<String>, writer: Arc<dyn Writer>, interactive: bool) -> Self {
        Self {
            inner: Arc::new(StreamInner {
                name: name.into(),
                interactive,
                slot: Mutex::new(writer),
            }),
        }
    }

    /// Create a stream recording into a fresh [`CaptureWriter`].
    pub fn capture(interactive: bool) -> (Self, CaptureWriter) {
        let capture = CaptureWriter::new();
        let stream = Self::new("capture", Arc::new(capture.clone()), interactive);
        (stream, capture)
    }

    /// The process-wide standard output stream.
    pub fn stdout() -> Self {
        static STDOUT: OnceLock<OutputStream> = OnceLock::new();
        STDOUT
            .get_or_init(|| {
                let term = Term::stdout();
                let interactive = term.is_term();
                Self::new("stdout", Arc::new(TermWriter::new(term)), interactive)
            })
            .clone()
    }

    /// The process-wide diagnostic stream.
    pub fn stderr() -> Self {
        static STDERR: OnceLock<OutputStream> = OnceLock::new();
        STDERR
            .get_or_init(|| {
                let term = Term::stderr();
                let interactive = term.is_term();
                Self::new("stderr", Arc::new(TermWriter::new(term)), interactive)
            })
            .clone()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether the stream is attached to an interactive terminal.
    pub fn is_interactive(&self) -> bool {
        self.inner.interactive
    }

    /// The writer currently occupying the slot.
    pub fn writer(&self) -> Arc<dyn Writer> {
        lock(&self.inner.slot).clone()
    }

    /// Replace the current writer with one built around it.
    ///
    /// `wrap` receives the writer present at the moment of the swap, and the
    /// same writer is returned so the caller can [`restore`](Self::restore) it.
    pub fn decorate<F>(&self, wrap: F) -> Arc<dyn Writer>
    where
        F: FnOnce(Arc<dyn Writer>) -> Arc<dyn Writer>,
    {
        let mut slot = lock(&self.inner.slot);
        let previous = slot.clone();
        *slot = wrap(previous.clone());
        previous
    }

    /// Put `writer` back into the slot.
    pub fn restore(&self, writer: Arc<dyn Writer>) {
        *lock(&self.inner.slot) = writer;
    }

    pub fn write(&self, payload: Payload<'_>) -> io::Result<()> {
        // Release the slot before writing so decorators may write re-entrantly.
        let writer = self.writer();
        writer.write(payload)
    }

    pub fn write_str(&self, text: &str) -> io::Result<()> {
        self.write(Payload::Text(text))
    }

    pub fn write_line(&self, text: &str) -> io::Result<()> {
        self.write_str(&format!("{}\n", text))
    }

    pub fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        self.write(Payload::Bytes(bytes))
    }

    /// Whether two handles refer to the same stream.
    pub fn same_stream(&self, other: &OutputStream) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Write for OutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match std::str::from_utf8(buf) {
            Ok(text) => self.write_str(text)?,
            Err(_) => self.write_bytes(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Lock a mutex, recovering the data if a panicking thread poisoned it.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
