//! Hosts file writer with bounded retry.
//!
//! The hosts file is often held open by other processes (antivirus, editors,
//! the resolver cache on Windows), so a failed write is retried a fixed
//! number of times with a fixed delay before giving up.
//!
//! The write itself goes through [`FileSink`]. Production uses
//! [`StdFileSink`]; tests inject a sink that fails on demand.

use std::future::Future;
use std::io;
use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use hostsync_core::metrics as m;

use crate::error::HostsFileError;

/// Default number of extra attempts after the first write fails.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default wait between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Line ending used when writing the hosts file.
#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
/// Line ending used when writing the hosts file.
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Destination of a full-file overwrite.
pub trait FileSink: Send + Sync {
    /// Replaces the contents of `path` with `contents`.
    fn write(&self, path: &Path, contents: &[u8]) -> impl Future<Output = io::Result<()>> + Send;
}

/// Writes with `tokio::fs::write` (truncate + write, not atomic).
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSink;

impl FileSink for StdFileSink {
    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        tokio::fs::write(path, contents).await
    }
}

/// Joins lines with the platform line ending, terminating the last line.
///
/// Line bytes are copied as they are; nothing is re-encoded.
pub fn join_lines<S: AsRef<[u8]>>(lines: &[S]) -> Vec<u8> {
    let mut out = Vec::with_capacity(lines.iter().map(|l| l.as_ref().len() + 2).sum());
    for line in lines {
        out.extend_from_slice(line.as_ref());
        out.extend_from_slice(LINE_ENDING.as_bytes());
    }
    out
}

/// Overwrites a file, retrying failed attempts.
#[derive(Debug, Clone)]
pub struct RetryWriter<S = StdFileSink> {
    sink: S,
    max_retries: u32,
    delay: Duration,
}

impl RetryWriter<StdFileSink> {
    /// Creates a writer backed by the real filesystem.
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self::with_sink(StdFileSink, max_retries, delay)
    }
}

impl Default for RetryWriter<StdFileSink> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

impl<S: FileSink> RetryWriter<S> {
    /// Creates a writer over an arbitrary sink.
    pub fn with_sink(sink: S, max_retries: u32, delay: Duration) -> Self {
        Self {
            sink,
            max_retries,
            delay,
        }
    }

    /// Extra attempts after the first failed write.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait between two attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The sink every attempt writes through.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Overwrites `path` with `lines`.
    ///
    /// Returns the number of attempts it took.
    pub async fn write_lines<L: AsRef<[u8]>>(
        &self,
        path: &Path,
        lines: &[L],
    ) -> Result<u32, HostsFileError> {
        self.write_lines_cancellable(path, lines, &CancellationToken::new())
            .await
    }

    /// Overwrites `path` with `lines`, aborting a retry wait on cancellation.
    ///
    /// Makes at most `max_retries + 1` attempts. After the last failure the
    /// error of that attempt is returned as [`HostsFileError::WriteFailed`].
    pub async fn write_lines_cancellable<L: AsRef<[u8]>>(
        &self,
        path: &Path,
        lines: &[L],
        cancel: &CancellationToken,
    ) -> Result<u32, HostsFileError> {
        let contents = join_lines(lines);
        let max_attempts = self.max_retries.saturating_add(1);
        let mut attempt: u32 = 1;

        loop {
            match self.sink.write(path, &contents).await {
                Ok(()) => {
                    debug!(path = %path.display(), attempt, "hosts file written");
                    return Ok(attempt);
                }
                Err(e) if attempt >= max_attempts => {
                    return Err(HostsFileError::WriteFailed {
                        path: path.display().to_string(),
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        attempt,
                        max_attempts,
                        error = %e,
                        "failed to write hosts file, retrying in {:?}",
                        self.delay
                    );
                    metrics::counter!(m::HOSTS_WRITE_RETRIES_TOTAL).increment(1);
                }
            }

            tokio::select! {
                () = cancel.cancelled() => return Err(HostsFileError::Cancelled),
                () = tokio::time::sleep(self.delay) => {}
            }
            attempt += 1;
        }
    }
}
