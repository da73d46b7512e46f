//! Dual append-only sink: the full log and the alert log
//!
//! Each file sits behind its own `tokio::sync::Mutex`, so a full-log writer
//! never waits on an alert-log writer. One locked section covers opening
//! (on first use), writing and flushing a single entry, which keeps entries
//! from different watchers whole within a file.

use crate::error::{MonitorError, Result};
use crate::timestamp;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// One line as it is written to a sink file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkEntry {
    /// UTC timestamp, `YYYY-MM-DD HH:MM:SS UTC`
    pub timestamp: String,
    /// Originating source; `None` only for marker lines
    pub tag: Option<String>,
    /// Original line text without its newline
    pub text: String,
}

impl SinkEntry {
    /// Entry for a line read from a tagged source, stamped now
    pub fn tagged(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp::utc_now(),
            tag: Some(tag.into()),
            text: text.into(),
        }
    }

    /// Untagged entry, used for the start marker
    pub fn marker(text: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp::utc_now(),
            tag: None,
            text: text.into(),
        }
    }
}

impl fmt::Display for SinkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "[{}] [{}] {}", self.timestamp, tag, self.text),
            None => write!(f, "[{}] {}", self.timestamp, self.text),
        }
    }
}

/// A single append-only file with a lazily opened, lock-protected handle
struct LogFile {
    path: PathBuf,
    handle: Mutex<Option<File>>,
}

impl LogFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            handle: Mutex::new(None),
        }
    }

    async fn ensure_open(&self) -> Result<()> {
        let mut guard = self.handle.lock().await;
        if guard.is_none() {
            let file = open_append(&self.path)
                .await
                .map_err(|e| MonitorError::sink(&self.path, e))?;
            *guard = Some(file);
        }
        Ok(())
    }

    async fn append(&self, entry: &SinkEntry) -> Result<()> {
        let mut line = entry.to_string();
        line.push('\n');

        let mut guard = self.handle.lock().await;
        let mut file = match guard.take() {
            Some(file) => file,
            None => open_append(&self.path)
                .await
                .map_err(|e| MonitorError::sink(&self.path, e))?,
        };

        match write_line(&mut file, line.as_bytes()).await {
            Ok(()) => {
                *guard = Some(file);
                Ok(())
            }
            // Handle is dropped; the next append reopens the file.
            Err(e) => Err(MonitorError::sink(&self.path, e)),
        }
    }
}

async fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path).await
}

async fn write_line(file: &mut File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await
}

/// Append-only writer for the full log and the alert log
///
/// Shared by every watcher through an `Arc`.
pub struct DualSink {
    full: LogFile,
    alert: LogFile,
}

impl DualSink {
    /// Create a sink over the two files; nothing is opened until first use
    pub fn new(full_log: impl Into<PathBuf>, alert_log: impl Into<PathBuf>) -> Self {
        Self {
            full: LogFile::new(full_log.into()),
            alert: LogFile::new(alert_log.into()),
        }
    }

    pub fn full_path(&self) -> &Path {
        &self.full.path
    }

    pub fn alert_path(&self) -> &Path {
        &self.alert.path
    }

    /// Create both files (and their directories) if absent, never truncating
    pub async fn ensure_files(&self) -> Result<()> {
        self.full.ensure_open().await?;
        self.alert.ensure_open().await?;
        tracing::debug!(
            full = %self.full.path.display(),
            alert = %self.alert.path.display(),
            "Sink files ready"
        );
        Ok(())
    }

    /// Append a tagged line to the full log
    pub async fn append_full(&self, tag: &str, text: &str) -> Result<()> {
        self.full.append(&SinkEntry::tagged(tag, text)).await
    }

    /// Append a tagged line to the alert log
    pub async fn append_alert(&self, tag: &str, text: &str) -> Result<()> {
        self.alert.append(&SinkEntry::tagged(tag, text)).await
    }

    /// Append an untagged marker line to both files
    ///
    /// Both files are attempted even if the first write fails; the first
    /// error is returned.
    pub async fn append_marker(&self, text: &str) -> Result<()> {
        let entry = SinkEntry::marker(text);
        let full = self.full.append(&entry).await;
        let alert = self.alert.append(&entry).await;
        full.and(alert)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_format_tagged() {
        let entry = SinkEntry {
            timestamp: "2024-05-01 13:07:42 UTC".to_string(),
            tag: Some("auth".to_string()),
            text: "Failed password for root".to_string(),
        };
        assert_eq!(
            entry.to_string(),
            "[2024-05-01 13:07:42 UTC] [auth] Failed password for root"
        );
    }

    #[test]
    fn test_entry_format_marker() {
        let entry = SinkEntry {
            timestamp: "2024-05-01 13:07:42 UTC".to_string(),
            tag: None,
            text: "===== CloudSec Monitor Started =====".to_string(),
        };
        assert_eq!(
            entry.to_string(),
            "[2024-05-01 13:07:42 UTC] ===== CloudSec Monitor Started ====="
        );
    }

    #[tokio::test]
    async fn test_append_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("nested/logs/full.log");
        let alert = dir.path().join("nested/logs/alert.log");
        let sink = DualSink::new(&full, &alert);

        sink.append_full("syslog", "hello").await.unwrap();

        let content = std::fs::read_to_string(&full).unwrap();
        assert!(content.ends_with("] [syslog] hello\n"));
        // alert file untouched until it is used or ensured
        assert!(!alert.exists());
    }

    #[tokio::test]
    async fn test_ensure_files_preserves_content() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("full.log");
        let alert = dir.path().join("alert.log");
        std::fs::write(&full, "previous run\n").unwrap();

        let sink = DualSink::new(&full, &alert);
        sink.ensure_files().await.unwrap();
        sink.append_full("auth", "next").await.unwrap();

        let content = std::fs::read_to_string(&full).unwrap();
        assert!(content.starts_with("previous run\n"));
        assert!(content.ends_with("[auth] next\n"));
        assert_eq!(std::fs::read_to_string(&alert).unwrap(), "");
    }

    #[tokio::test]
    async fn test_marker_goes_to_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DualSink::new(dir.path().join("f.log"), dir.path().join("a.log"));

        sink.append_marker("===== start =====").await.unwrap();

        for path in [sink.full_path(), sink.alert_path()] {
            let content = std::fs::read_to_string(path).unwrap();
            assert_eq!(content.lines().count(), 1);
            assert!(content.ends_with("UTC] ===== start =====\n"));
        }
    }

    #[tokio::test]
    async fn test_unwritable_path_is_sink_error() {
        let dir = tempfile::tempdir().unwrap();
        // a regular file where the log directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let sink = DualSink::new(blocker.join("full.log"), blocker.join("alert.log"));

        let err = sink.append_full("auth", "line").await.unwrap_err();
        assert!(matches!(err, MonitorError::Sink { .. }));

        // still failing, but not panicking or poisoning anything
        assert!(sink.append_full("auth", "line").await.is_err());
    }
}
