//! # cloudsec-monitor
//!
//! Concurrent security log aggregation with keyword-based alert triage.
//!
//! ## Overview
//!
//! `cloudsec-monitor` follows several independent log sources (files and
//! long-running commands) at once, tags every line with its source and
//! appends it to a unified full log. Lines containing a suspicious-activity
//! keyword are also appended to a separate alert log.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cloudsec_monitor::{CommandSpec, Monitor, MonitorConfig, SourceDescriptor};
//!
//! # async fn example() {
//! let config = MonitorConfig::default()
//!     .with_log_dir("/tmp/cloudsec")
//!     .with_sources(vec![
//!         SourceDescriptor::file("auth", "/var/log/auth.log"),
//!         SourceDescriptor::command("kernel", CommandSpec::new("dmesg", ["-w"])),
//!     ]);
//!
//! let monitor = Monitor::new(config);
//! let reports = monitor.start().await.join_all().await;
//! println!("{} watchers finished", reports.len());
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **StreamSource** trait — a live line stream (tailed file or subprocess)
//! - **Watcher** — one per source; tags lines and triages them
//! - **DualSink** — the full log and the alert log, each behind its own lock
//! - **KeywordSet** — immutable lowercase substrings shared by all watchers
//! - **Monitor** — writes the start marker and launches the watchers

pub mod config;
pub mod error;
pub mod keywords;
pub mod monitor;
pub mod sink;
pub mod source;
pub mod timestamp;
pub mod watcher;

// Re-export core types
pub use config::{default_sources, MonitorConfig};
pub use error::{MonitorError, Result};
pub use keywords::{KeywordSet, DEFAULT_KEYWORDS};
pub use monitor::{Monitor, MonitorHandle, WatcherHandle, START_MARKER};
pub use sink::{DualSink, SinkEntry};
pub use source::{
    CommandSpec, MissingSourcePolicy, SourceDescriptor, SourceKind, SourcePlan, StreamSource,
    SubprocessStream, TailedFile,
};
pub use watcher::{Watcher, WatcherOutcome, WatcherReport, WatcherState};
