use crate::error::{TelemetryError, TelemetryResult};
use crate::types::{MetricSet, TagSet};
use std::fmt::{self, Write as _};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Fallback backend that writes one line per key to a diagnostic stream.
///
/// Line formats are `tag:<key>=<value>` and `metric:<key>=<value>`. A batch is formatted
/// up front and written under a single lock, so concurrent callers never interleave lines.
pub struct LocalBackend {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl LocalBackend {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self { writer: Mutex::new(Box::new(writer)) }
    }

    /// Backend writing to the process stderr.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Backend writing into memory, plus a handle to read what was written.
    pub fn capture() -> (Self, CaptureBuffer) {
        let buffer = CaptureBuffer::default();
        (Self::new(buffer.clone()), buffer)
    }

    pub fn write_tags(&self, tags: &TagSet) -> TelemetryResult<()> {
        let mut block = String::new();
        for (key, value) in tags.iter() {
            let _ = writeln!(block, "tag:{key}={value}");
        }
        self.write_block(&block)
    }

    pub fn write_metrics(&self, metrics: &MetricSet) -> TelemetryResult<()> {
        let mut block = String::new();
        for (key, value) in metrics.iter() {
            let _ = writeln!(block, "metric:{key}={value}");
        }
        self.write_block(&block)
    }

    pub fn flush(&self) -> TelemetryResult<()> {
        self.lock()?.flush()?;
        Ok(())
    }

    fn write_block(&self, block: &str) -> TelemetryResult<()> {
        if block.is_empty() {
            return Ok(());
        }
        let mut writer = self.lock()?;
        writer.write_all(block.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn lock(&self) -> TelemetryResult<MutexGuard<'_, Box<dyn Write + Send>>> {
        self.writer.lock().map_err(|_| {
            TelemetryError::LocalWrite(io::Error::other("diagnostic stream lock poisoned"))
        })
    }
}

impl fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBackend").finish_non_exhaustive()
    }
}

/// Shared in-memory writer used to inspect local telemetry output.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes =
            self.bytes.lock().map_err(|_| io::Error::other("capture buffer lock poisoned"))?;
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
