//! Duplicating writer behind all core command output.
//!
//! Every byte written to an [`OutputSink`] is appended to an in-memory
//! buffer and, unless terminal output is disabled, forwarded to the real
//! terminal stream. The buffer is drained as lines by the host call surface
//! after a plugin-requested core command has run.

use std::io::{self, Write};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

/// Shared handle to the capture buffer and terminal stream.
///
/// Clones share the same buffer, so a core command writing through one
/// handle is observed by a drain through another.
#[derive(Clone)]
pub struct OutputSink {
    inner: Arc<SinkInner>,
}

struct SinkInner {
    buffer: Mutex<Vec<u8>>,
    terminal: Mutex<Box<dyn Write + Send>>,
    terminal_disabled: AtomicBool,
}

impl OutputSink {
    /// Creates a sink forwarding to `terminal`.
    #[must_use]
    pub fn new(terminal: impl Write + Send + 'static) -> Self {
        Self {
            inner: Arc::new(SinkInner {
                buffer: Mutex::new(Vec::new()),
                terminal: Mutex::new(Box::new(terminal)),
                terminal_disabled: AtomicBool::new(false),
            }),
        }
    }

    /// Creates a sink forwarding to the process's standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Creates a sink that only captures.
    #[must_use]
    pub fn capture_only() -> Self {
        Self::new(io::sink())
    }

    /// Writes `line` followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal stream rejects the write.
    pub fn say(&self, line: impl AsRef<str>) -> io::Result<()> {
        let mut bytes = line.as_ref().as_bytes().to_vec();
        bytes.push(b'\n');
        self.write_bytes(&bytes)
    }

    /// Stops or resumes forwarding to the terminal. Capture is unaffected.
    pub fn disable_terminal_output(&self, disable: bool) {
        self.inner.terminal_disabled.store(disable, Ordering::SeqCst);
    }

    /// Returns `true` while terminal forwarding is disabled.
    #[must_use]
    pub fn terminal_output_disabled(&self) -> bool {
        self.inner.terminal_disabled.load(Ordering::SeqCst)
    }

    /// Discards everything captured so far.
    pub fn reset(&self) {
        self.buffer().clear();
    }

    /// Returns the captured lines and clears the buffer.
    ///
    /// A single trailing newline does not produce an empty final line, and
    /// an empty buffer yields no lines at all.
    #[must_use]
    pub fn drain_lines(&self) -> Vec<String> {
        let bytes = std::mem::take(&mut *self.buffer());
        if bytes.is_empty() {
            return Vec::new();
        }
        let text = String::from_utf8_lossy(&bytes);
        let trimmed = text.strip_suffix('\n').unwrap_or(&text);
        trimmed.split('\n').map(str::to_owned).collect()
    }

    fn write_bytes(&self, bytes: &[u8]) -> io::Result<()> {
        self.buffer().extend_from_slice(bytes);
        if self.terminal_output_disabled() {
            return Ok(());
        }
        let mut terminal = self
            .inner
            .terminal
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        terminal.write_all(bytes)?;
        terminal.flush()
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<u8>> {
        self.inner
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink")
            .field("terminal_disabled", &self.terminal_output_disabled())
            .finish_non_exhaustive()
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests;
