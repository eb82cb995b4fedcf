//! The hosts file on disk.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use hostsync_core::table::HostSnapshot;

use crate::block::{self, data_line};
use crate::error::HostsFileError;
use crate::writer::{FileSink, RetryWriter};

/// A hosts file location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostsFile {
    path: PathBuf,
}

impl HostsFile {
    /// Points at `path`. Nothing is touched until the first read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the managed file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fails with [`HostsFileError::NotFound`] if the file does not exist.
    pub async fn ensure_exists(&self) -> Result<(), HostsFileError> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => Ok(()),
            Ok(_) => Err(self.not_found()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(self.not_found()),
            Err(e) => Err(HostsFileError::Read {
                path: self.path.display().to_string(),
                source: e,
            }),
        }
    }

    /// Reads the file as lines, without line endings.
    ///
    /// Accepts both `\n` and `\r\n` endings. Lines are kept as raw bytes,
    /// so content in other encodings survives a rewrite.
    pub async fn read_lines(&self) -> Result<Vec<Vec<u8>>, HostsFileError> {
        let content = tokio::fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                self.not_found()
            } else {
                HostsFileError::Read {
                    path: self.path.display().to_string(),
                    source: e,
                }
            }
        })?;
        Ok(split_lines(&content))
    }

    /// Reads the file and renders it with `snapshot` in memory.
    pub async fn render_with(
        &self,
        snapshot: &HostSnapshot,
    ) -> Result<Vec<Vec<u8>>, HostsFileError> {
        let existing = self.read_lines().await?;
        Ok(block::render(&existing, snapshot))
    }

    /// Rewrites the managed block from `snapshot`.
    ///
    /// Reads the current file, renders, and writes through `writer`.
    /// Returns the number of data lines in the new block.
    pub async fn sync<S: FileSink>(
        &self,
        snapshot: &HostSnapshot,
        writer: &RetryWriter<S>,
        cancel: &CancellationToken,
    ) -> Result<usize, HostsFileError> {
        let lines = self.render_with(snapshot).await?;

        let mut entries = 0;
        for (container_id, network, record) in snapshot.records() {
            if let Some(line) = data_line(record) {
                info!(
                    container_id = %short_id(container_id),
                    network,
                    entry = %line,
                    "adding hosts entry"
                );
                entries += 1;
            }
        }

        writer
            .write_lines_cancellable(&self.path, &lines, cancel)
            .await?;
        debug!(
            path = %self.path.display(),
            entries,
            table = %snapshot.to_json(),
            "hosts file updated"
        );
        Ok(entries)
    }

    fn not_found(&self) -> HostsFileError {
        HostsFileError::NotFound {
            path: self.path.display().to_string(),
        }
    }
}

fn split_lines(content: &[u8]) -> Vec<Vec<u8>> {
    if content.is_empty() {
        return Vec::new();
    }
    let content = content.strip_suffix(b"\n").unwrap_or(content);
    content
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line).to_vec())
        .collect()
}

/// First 12 characters of a container id, as the engine CLI prints them.
pub fn short_id(container_id: &str) -> &str {
    match container_id.char_indices().nth(12) {
        Some((idx, _)) => &container_id[..idx],
        None => container_id,
    }
}
