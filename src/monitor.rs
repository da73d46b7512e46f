//! Orchestrator: start marker, one watcher task per source, run forever

use crate::config::MonitorConfig;
use crate::keywords::KeywordSet;
use crate::sink::DualSink;
use crate::watcher::{Watcher, WatcherReport, WatcherState};
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Written untagged to both logs on every start
pub const START_MARKER: &str = "===== CloudSec Monitor Started =====";

/// Owns the shared sink and keyword set and launches watchers
pub struct Monitor {
    config: MonitorConfig,
    keywords: Arc<KeywordSet>,
    sink: Arc<DualSink>,
}

/// A launched watcher task
pub struct WatcherHandle {
    pub tag: String,
    pub state: watch::Receiver<WatcherState>,
    pub task: JoinHandle<WatcherReport>,
}

/// Handles for every watcher started by [`Monitor::start`]
pub struct MonitorHandle {
    watchers: Vec<WatcherHandle>,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Self {
        let keywords = Arc::new(config.keyword_set());
        let sink = Arc::new(DualSink::new(&config.full_log, &config.alert_log));
        Self {
            config,
            keywords,
            sink,
        }
    }

    pub fn sink(&self) -> &Arc<DualSink> {
        &self.sink
    }

    /// Prepare the logs, write the start marker and spawn every watcher
    ///
    /// Sink failures here are logged, not returned: watchers still start and
    /// retry opening the files on each append.
    pub async fn start(&self) -> MonitorHandle {
        if let Err(e) = self.sink.ensure_files().await {
            tracing::error!(error = %e, "Failed to prepare log files");
        }
        if let Err(e) = self.sink.append_marker(START_MARKER).await {
            tracing::error!(error = %e, "Failed to write start marker");
        }

        let watchers = self
            .config
            .sources
            .iter()
            .cloned()
            .map(|descriptor| {
                let watcher = Watcher::new(descriptor, self.keywords.clone(), self.sink.clone());
                let tag = watcher.tag().to_string();
                let state = watcher.subscribe_state();
                let task = tokio::spawn(watcher.run());
                WatcherHandle { tag, state, task }
            })
            .collect::<Vec<_>>();

        tracing::info!(
            full = %self.sink.full_path().display(),
            alert = %self.sink.alert_path().display(),
            watchers = watchers.len(),
            keywords = self.keywords.len(),
            "Monitor started"
        );

        MonitorHandle { watchers }
    }

    /// Start and block forever
    ///
    /// Watcher terminations are logged as they happen; the monitor keeps
    /// running after the last one ends, until the process is killed.
    pub async fn run(&self) {
        let handle = self.start().await;

        let mut running: FuturesUnordered<_> = handle
            .watchers
            .into_iter()
            .map(|w| async move { (w.tag, w.task.await) })
            .collect();

        while let Some((tag, joined)) = running.next().await {
            match joined {
                Ok(report) => tracing::info!(
                    tag = %report.tag,
                    outcome = ?report.outcome,
                    lines = report.lines,
                    alerts = report.alerts,
                    sink_errors = report.sink_errors,
                    "Watcher terminated"
                ),
                Err(e) => tracing::error!(tag = %tag, error = %e, "Watcher task aborted"),
            }
        }

        tracing::warn!("All watchers terminated; monitor stays up");
        futures::future::pending::<()>().await;
    }
}

impl MonitorHandle {
    pub fn tags(&self) -> Vec<&str> {
        self.watchers.iter().map(|w| w.tag.as_str()).collect()
    }

    /// Current state of every watcher, in source order
    pub fn states(&self) -> Vec<(String, WatcherState)> {
        self.watchers
            .iter()
            .map(|w| (w.tag.clone(), *w.state.borrow()))
            .collect()
    }

    /// Abort every watcher task; their child processes are killed on drop
    pub fn abort_all(&self) {
        for w in &self.watchers {
            w.task.abort();
        }
    }

    /// Wait for every watcher to terminate, in source order
    ///
    /// Aborted or panicked tasks are logged and left out of the result.
    pub async fn join_all(self) -> Vec<WatcherReport> {
        let mut reports = Vec::with_capacity(self.watchers.len());
        for w in self.watchers {
            match w.task.await {
                Ok(report) => reports.push(report),
                Err(e) => tracing::warn!(tag = %w.tag, error = %e, "Watcher task did not complete"),
            }
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CommandSpec, SourceDescriptor};

    #[tokio::test]
    async fn test_start_with_no_sources_writes_markers() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = Monitor::new(
            MonitorConfig::default()
                .with_log_dir(dir.path())
                .with_sources(vec![]),
        );

        let handle = monitor.start().await;
        assert!(handle.tags().is_empty());
        assert!(handle.join_all().await.is_empty());

        for path in [monitor.sink().full_path(), monitor.sink().alert_path()] {
            let content = std::fs::read_to_string(path).unwrap();
            assert!(content.ends_with(&format!("UTC] {}\n", START_MARKER)));
        }
    }

    #[tokio::test]
    async fn test_handle_reports_in_source_order() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = Monitor::new(
            MonitorConfig::default()
                .with_log_dir(dir.path())
                .with_sources(vec![
                    SourceDescriptor::command("a", CommandSpec::new("sh", ["-c", "echo 1"])),
                    SourceDescriptor::file("b", dir.path().join("missing.log")),
                ]),
        );

        let handle = monitor.start().await;
        assert_eq!(handle.tags(), vec!["a", "b"]);

        let reports = handle.join_all().await;
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].tag, "a");
        assert_eq!(reports[0].lines, 1);
        assert_eq!(reports[1].tag, "b");
        assert_eq!(reports[1].lines, 0);
    }

    #[tokio::test]
    async fn test_abort_all_stops_long_running_sources() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = Monitor::new(
            MonitorConfig::default()
                .with_log_dir(dir.path())
                .with_sources(vec![SourceDescriptor::command(
                    "forever",
                    CommandSpec::new("sleep", ["600"]),
                )]),
        );

        let handle = monitor.start().await;
        handle.abort_all();
        // aborted tasks are dropped from the reports
        assert!(handle.join_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_states_report_live_sources_as_streaming() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = Monitor::new(
            MonitorConfig::default()
                .with_log_dir(dir.path())
                .with_sources(vec![
                    SourceDescriptor::command("live", CommandSpec::new("sleep", ["600"])),
                    SourceDescriptor::file("gone", dir.path().join("missing.log")),
                ]),
        );

        let handle = monitor.start().await;
        let expected = vec![
            ("live".to_string(), WatcherState::Streaming),
            ("gone".to_string(), WatcherState::Terminated),
        ];
        let settled = tokio::time::timeout(std::time::Duration::from_secs(10), async {
            while handle.states() != expected {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            }
        })
        .await;
        assert!(settled.is_ok(), "states never settled: {:?}", handle.states());

        handle.abort_all();
        let reports = handle.join_all().await;
        // only the skipped source completed on its own
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].tag, "gone");
    }
}
