//! Destinations for access-log lines.
//!
//! A [`LogSink`] is shared by every request and every background logging
//! task. Each line goes out in one `write_all` under the sink's lock, so
//! concurrent writers never interleave inside a line. Writes are best-effort:
//! a failing sink is reported through `tracing` and otherwise ignored.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Target name for lines forwarded by [`LogSink::tracing`].
pub const ACCESS_TARGET: &str = "tether::access";

/// Append-only line sink. Cheap to clone.
#[derive(Clone)]
pub struct LogSink {
    target: Arc<Target>,
}

enum Target {
    Writer(Mutex<Box<dyn Write + Send>>),
    Tracing,
}

impl LogSink {
    /// Writes lines to any byte sink: a file, a socket, a pipe.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self { target: Arc::new(Target::Writer(Mutex::new(Box::new(writer)))) }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Forwards each line as an `info` event on the [`ACCESS_TARGET`] target,
    /// for hosts that already route everything through a subscriber.
    pub fn tracing() -> Self {
        Self { target: Arc::new(Target::Tracing) }
    }

    /// An in-memory sink and a handle to read back what was written.
    pub fn memory() -> (Self, MemoryBuffer) {
        let buffer = MemoryBuffer::default();
        (Self::new(buffer.clone()), buffer)
    }

    /// Appends one line. Never fails; errors are logged and dropped.
    pub fn write_line(&self, line: &str) {
        match self.target.as_ref() {
            Target::Writer(writer) => {
                let mut writer = writer.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(e) = writer.write_all(line.as_bytes()).and_then(|()| writer.flush()) {
                    tracing::warn!(error = %e, "access log write failed");
                }
            }
            Target::Tracing => {
                tracing::info!(target: ACCESS_TARGET, "{}", line.trim_end_matches('\n'));
            }
        }
    }
}

/// Shared growable buffer behind [`LogSink::memory`].
#[derive(Clone, Default)]
pub struct MemoryBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemoryBuffer {
    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Write for MemoryBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
