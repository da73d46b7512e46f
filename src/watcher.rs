//! Watcher: one tagged source feeding the dual sink
//!
//! A watcher moves through `Idle → Starting → Streaming → Terminated`.
//! While streaming, every line goes to the full log and, when it contains
//! an alert keyword, to the alert log as well. Failures stay local: sink
//! errors are logged and skipped, and an unavailable or ended source only
//! terminates this watcher.

use crate::keywords::KeywordSet;
use crate::sink::DualSink;
use crate::source::{self, MissingSourcePolicy, SourceDescriptor, StreamSource};
use std::sync::Arc;
use tokio::sync::watch;

/// Lifecycle state of a watcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Starting,
    Streaming,
    Terminated,
}

/// Why a watcher stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherOutcome {
    /// The source could not be acquired
    Skipped { reason: String },
    /// The source's stream closed
    Ended,
    /// Reading the stream failed
    Failed { reason: String },
}

/// Summary returned when a watcher terminates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherReport {
    pub tag: String,
    pub outcome: WatcherOutcome,
    /// Lines read from the source
    pub lines: u64,
    /// Lines that matched a keyword
    pub alerts: u64,
    /// Appends that failed
    pub sink_errors: u64,
}

impl WatcherReport {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            outcome: WatcherOutcome::Ended,
            lines: 0,
            alerts: 0,
            sink_errors: 0,
        }
    }
}

/// Binds one source descriptor to the shared keyword set and sink
pub struct Watcher {
    descriptor: SourceDescriptor,
    keywords: Arc<KeywordSet>,
    sink: Arc<DualSink>,
    state: watch::Sender<WatcherState>,
}

impl Watcher {
    pub fn new(
        descriptor: SourceDescriptor,
        keywords: Arc<KeywordSet>,
        sink: Arc<DualSink>,
    ) -> Self {
        let (state, _) = watch::channel(WatcherState::Idle);
        Self {
            descriptor,
            keywords,
            sink,
            state,
        }
    }

    pub fn tag(&self) -> &str {
        &self.descriptor.tag
    }

    /// Observe state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<WatcherState> {
        self.state.subscribe()
    }

    /// Acquire the source and stream it until it ends
    pub async fn run(self) -> WatcherReport {
        let mut report = WatcherReport::new(self.tag());
        self.state.send_replace(WatcherState::Starting);

        let plan = self.descriptor.kind.plan();
        let stream = match source::open(self.tag(), &plan) {
            Ok(stream) => stream,
            Err(e) => {
                self.record_missing(&e.to_string(), &mut report).await;
                report.outcome = WatcherOutcome::Skipped {
                    reason: e.to_string(),
                };
                self.state.send_replace(WatcherState::Terminated);
                return report;
            }
        };

        self.stream(stream, &mut report).await;
        self.state.send_replace(WatcherState::Terminated);
        report
    }

    /// Route every line of `stream` until it ends or fails
    async fn stream(&self, mut stream: Box<dyn StreamSource>, report: &mut WatcherReport) {
        tracing::info!(tag = %self.tag(), source = %stream.describe(), "Watcher streaming");
        self.state.send_replace(WatcherState::Streaming);

        loop {
            match stream.next_line().await {
                Ok(Some(line)) => self.process_line(&line, report).await,
                Ok(None) => {
                    tracing::info!(tag = %self.tag(), lines = report.lines, "Source stream ended");
                    report.outcome = WatcherOutcome::Ended;
                    break;
                }
                Err(e) => {
                    tracing::warn!(tag = %self.tag(), error = %e, "Source stream failed");
                    report.outcome = WatcherOutcome::Failed {
                        reason: e.to_string(),
                    };
                    break;
                }
            }
        }
    }

    async fn process_line(&self, line: &str, report: &mut WatcherReport) {
        report.lines += 1;
        let matched = self.keywords.first_match(line);

        if let Err(e) = self.sink.append_full(self.tag(), line).await {
            report.sink_errors += 1;
            tracing::warn!(tag = %self.tag(), error = %e, "Full log append failed");
        }

        if let Some(keyword) = matched {
            report.alerts += 1;
            tracing::debug!(tag = %self.tag(), keyword = %keyword, "Alert keyword matched");
            if let Err(e) = self.sink.append_alert(self.tag(), line).await {
                report.sink_errors += 1;
                tracing::warn!(tag = %self.tag(), error = %e, "Alert log append failed");
            }
        }
    }

    async fn record_missing(&self, reason: &str, report: &mut WatcherReport) {
        match &self.descriptor.on_missing {
            MissingSourcePolicy::Skip => {
                tracing::debug!(
                    tag = %self.tag(),
                    reason = %reason,
                    "Source unavailable, skipping"
                );
            }
            MissingSourcePolicy::RecordInFullLog(message) => {
                tracing::info!(
                    tag = %self.tag(),
                    reason = %reason,
                    "Source unavailable, recording"
                );
                if let Err(e) = self.sink.append_full(self.tag(), message).await {
                    report.sink_errors += 1;
                    tracing::warn!(tag = %self.tag(), error = %e, "Full log append failed");
                }
            }
        }
    }
}
