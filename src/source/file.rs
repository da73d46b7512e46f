//! Tailed file: an existing file followed from its current end

use super::{CommandSpec, StreamSource, SubprocessStream};
use crate::error::{MonitorError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Program used to follow files
pub const FOLLOW_PROGRAM: &str = "tail";

/// `tail -n 0 -F <path>`: start at the current end, reopen on rotation or truncation
pub fn follow_command(path: &Path) -> CommandSpec {
    let path = path.to_string_lossy().into_owned();
    CommandSpec::new(FOLLOW_PROGRAM, ["-n".to_string(), "0".to_string(), "-F".to_string(), path])
}

/// A file followed through the file-follow command
pub struct TailedFile {
    path: PathBuf,
    inner: SubprocessStream,
}

impl TailedFile {
    /// Start following `path`, which must already exist
    pub fn open(tag: &str, path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MonitorError::unavailable(
                tag,
                format!("file not found: {}", path.display()),
            ));
        }
        let inner = SubprocessStream::spawn(tag, &follow_command(path))?;
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }
}

#[async_trait]
impl StreamSource for TailedFile {
    async fn next_line(&mut self) -> Result<Option<String>> {
        self.inner.next_line().await
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
