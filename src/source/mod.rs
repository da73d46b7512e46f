//! Stream sources: live, line-oriented text streams
//!
//! A `StreamSource` yields lines until the underlying stream closes. Two
//! variants exist:
//!
//! - **subprocess** — stdout and stderr of a long-running command, merged
//! - **tailed file** — an existing file followed from its current end
//!
//! `SourceDescriptor` is the static description of a source. It is resolved
//! into a `SourcePlan` (pure, filesystem checks only) and then opened.

use crate::error::{MonitorError, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

pub mod file;
pub mod process;

pub use file::TailedFile;
pub use process::SubprocessStream;

/// A lazy, unbounded, non-restartable sequence of text lines
///
/// `next_line` suspends until a line is available and returns `Ok(None)`
/// once the stream has closed for good.
#[async_trait]
pub trait StreamSource: Send {
    /// Receive the next line, without its trailing newline
    async fn next_line(&mut self) -> Result<Option<String>>;

    /// Human-readable description for diagnostics
    fn describe(&self) -> String;
}

/// Program and arguments for a subprocess stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Where a source's lines come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Follow an existing file
    File(PathBuf),
    /// Stream the output of a command
    Command(CommandSpec),
    /// Follow the first existing candidate, else stream the fallback command
    FirstAvailable {
        candidates: Vec<PathBuf>,
        fallback: CommandSpec,
    },
}

/// A source kind resolved against the current filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePlan {
    /// Follow this file
    Tail(PathBuf),
    /// Spawn this command
    Spawn(CommandSpec),
    /// The file does not exist
    Missing(PathBuf),
}

impl SourceKind {
    /// Decide how this source would be opened right now
    pub fn plan(&self) -> SourcePlan {
        match self {
            SourceKind::File(path) if path.exists() => SourcePlan::Tail(path.clone()),
            SourceKind::File(path) => SourcePlan::Missing(path.clone()),
            SourceKind::Command(spec) => SourcePlan::Spawn(spec.clone()),
            SourceKind::FirstAvailable {
                candidates,
                fallback,
            } => candidates
                .iter()
                .find(|p| p.exists())
                .map(|p| SourcePlan::Tail(p.clone()))
                .unwrap_or_else(|| SourcePlan::Spawn(fallback.clone())),
        }
    }
}

/// What a watcher does when its source cannot be acquired
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingSourcePolicy {
    /// Stop without writing anything
    Skip,
    /// Write this message to the full log under the source's tag, then stop
    RecordInFullLog(String),
}

/// Static configuration of one monitored source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub tag: String,
    pub kind: SourceKind,
    pub on_missing: MissingSourcePolicy,
}

impl SourceDescriptor {
    /// Follow a file; skipped silently when it does not exist
    pub fn file(tag: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            tag: tag.into(),
            kind: SourceKind::File(path.into()),
            on_missing: MissingSourcePolicy::Skip,
        }
    }

    /// Stream a command's output; skipped silently when it cannot be spawned
    pub fn command(tag: impl Into<String>, spec: CommandSpec) -> Self {
        Self {
            tag: tag.into(),
            kind: SourceKind::Command(spec),
            on_missing: MissingSourcePolicy::Skip,
        }
    }

    /// Follow the first existing candidate path, else stream `fallback`
    pub fn first_available<I, P>(
        tag: impl Into<String>,
        candidates: I,
        fallback: CommandSpec,
    ) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            tag: tag.into(),
            kind: SourceKind::FirstAvailable {
                candidates: candidates.into_iter().map(Into::into).collect(),
                fallback,
            },
            on_missing: MissingSourcePolicy::Skip,
        }
    }

    /// Replace the missing-source policy
    pub fn on_missing(mut self, policy: MissingSourcePolicy) -> Self {
        self.on_missing = policy;
        self
    }
}

/// Open a resolved plan as a live stream
pub fn open(tag: &str, plan: &SourcePlan) -> Result<Box<dyn StreamSource>> {
    match plan {
        SourcePlan::Tail(path) => Ok(Box::new(TailedFile::open(tag, path)?)),
        SourcePlan::Spawn(spec) => Ok(Box::new(SubprocessStream::spawn(tag, spec)?)),
        SourcePlan::Missing(path) => Err(MonitorError::unavailable(
            tag,
            format!("file not found: {}", path.display()),
        )),
    }
}

/// Longest line read in one piece; longer lines are split
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Line reader that decodes bytes permissively
///
/// Invalid UTF-8 is replaced with U+FFFD instead of failing the read. A
/// trailing `\n` (and a `\r` before it) is stripped. A final line without a
/// newline is still returned. A line longer than the cap is returned as
/// several consecutive lines of at most `max_line` bytes each.
pub struct LossyLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
    max_line: usize,
}

impl<R: AsyncRead + Unpin> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self::with_max_line(reader, MAX_LINE_BYTES)
    }

    pub fn with_max_line(reader: R, max_line: usize) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
            max_line: max_line.max(1),
        }
    }

    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        let limit = self.max_line as u64;
        if (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.buf)
            .await?
            == 0
        {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}
