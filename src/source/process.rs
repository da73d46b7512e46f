//! Subprocess stream: stdout and stderr of a long-running command, merged

use super::{CommandSpec, LossyLines, StreamSource};
use crate::error::{MonitorError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::os::fd::OwnedFd;
use std::process::Stdio;
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};

/// Output of a spawned command, read line by line
///
/// The child's stdout and stderr share the write end of one pipe, so lines
/// arrive in the order the child wrote them regardless of stream. The
/// stream ends once every write end has closed. The child is killed when
/// this value is dropped.
pub struct SubprocessStream {
    tag: String,
    spec: CommandSpec,
    child: Child,
    lines: LossyLines<pipe::Receiver>,
}

impl SubprocessStream {
    /// Spawn the command
    ///
    /// A missing binary, or any other spawn failure, is reported as
    /// `SourceUnavailable`.
    pub fn spawn(tag: &str, spec: &CommandSpec) -> Result<Self> {
        let unavailable = |what: &str, e: std::io::Error| {
            MonitorError::unavailable(tag, format!("{} for '{}': {}", what, spec, e))
        };

        let (reader, writer) =
            std::io::pipe().map_err(|e| unavailable("failed to create pipe", e))?;
        let stderr = writer
            .try_clone()
            .map_err(|e| unavailable("failed to clone pipe", e))?;

        // The Command (holding the parent's write ends) is dropped at the end
        // of this statement, so EOF only depends on the child.
        let child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    MonitorError::unavailable(tag, format!("program not found: {}", spec.program))
                }
                _ => unavailable("failed to spawn", e),
            })?;

        let receiver = pipe::Receiver::from_owned_fd(OwnedFd::from(reader))
            .map_err(|e| unavailable("failed to register pipe", e))?;

        tracing::debug!(tag = %tag, command = %spec, pid = ?child.id(), "Spawned source command");

        Ok(Self {
            tag: tag.to_string(),
            spec: spec.clone(),
            child,
            lines: LossyLines::new(receiver),
        })
    }
}

#[async_trait]
impl StreamSource for SubprocessStream {
    async fn next_line(&mut self) -> Result<Option<String>> {
        match self.lines.next_line().await {
            Ok(Some(line)) => Ok(Some(line)),
            Err(e) => Err(MonitorError::Stream {
                tag: self.tag.clone(),
                source: e,
            }),
            Ok(None) => {
                // Pipe closed; reap the child so it does not linger.
                match self.child.wait().await {
                    Ok(status) => tracing::debug!(
                        tag = %self.tag,
                        command = %self.spec,
                        %status,
                        "Source command exited"
                    ),
                    Err(e) => tracing::debug!(
                        tag = %self.tag,
                        command = %self.spec,
                        error = %e,
                        "Failed to reap source command"
                    ),
                }
                Ok(None)
            }
        }
    }

    fn describe(&self) -> String {
        format!("command `{}`", self.spec)
    }
}
