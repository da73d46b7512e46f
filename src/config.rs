//! Monitor configuration
//!
//! Built once at startup and never mutated. `MonitorConfig::default()` is the
//! production layout under `/var/log/cloudsec` with the five standard
//! sources; the `with_*` builders exist for embedding and tests.

use crate::keywords::{KeywordSet, DEFAULT_KEYWORDS};
use crate::source::{CommandSpec, MissingSourcePolicy, SourceDescriptor};
use std::path::{Path, PathBuf};

pub const LOG_DIR: &str = "/var/log/cloudsec";
pub const FULL_LOG_NAME: &str = "cloudsec-full.log";
pub const ALERT_LOG_NAME: &str = "cloudsec-alerts.log";

/// Container whose logs are followed by the `dvwa-docker` source
pub const DOCKER_CONTAINER: &str = "youthful_benz";

/// Written to the full log when the container runtime is missing
pub const DOCKER_MISSING_MESSAGE: &str = "docker not found on system";

/// Audit log locations, in order of preference
pub const AUDIT_LOG_CANDIDATES: &[&str] = &["/var/log/audit/audit.log", "/var/log/audit.log"];

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Every observed line
    pub full_log: PathBuf,
    /// Lines matching a keyword
    pub alert_log: PathBuf,
    pub keywords: Vec<String>,
    /// One watcher is started per entry
    pub sources: Vec<SourceDescriptor>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let dir = Path::new(LOG_DIR);
        Self {
            full_log: dir.join(FULL_LOG_NAME),
            alert_log: dir.join(ALERT_LOG_NAME),
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            sources: default_sources(),
        }
    }
}

impl MonitorConfig {
    /// Place both log files in `dir`, keeping the standard file names
    pub fn with_log_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.full_log = dir.join(FULL_LOG_NAME);
        self.alert_log = dir.join(ALERT_LOG_NAME);
        self
    }

    pub fn with_sources(mut self, sources: Vec<SourceDescriptor>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn keyword_set(&self) -> KeywordSet {
        KeywordSet::new(&self.keywords)
    }
}

/// syslog, auth, auditd, network and dvwa-docker
pub fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::file("syslog", "/var/log/syslog"),
        SourceDescriptor::file("auth", "/var/log/auth.log"),
        SourceDescriptor::first_available(
            "auditd",
            AUDIT_LOG_CANDIDATES.iter().copied(),
            CommandSpec::new("journalctl", ["-f", "-u", "auditd.service"]),
        ),
        SourceDescriptor::command(
            "network",
            CommandSpec::new("sudo", ["conntrack", "-E", "-o", "extended"]),
        ),
        SourceDescriptor::command(
            "dvwa-docker",
            CommandSpec::new("sudo", ["docker", "logs", "-f", DOCKER_CONTAINER]),
        )
        .on_missing(MissingSourcePolicy::RecordInFullLog(
            DOCKER_MISSING_MESSAGE.to_string(),
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceKind;

    #[test]
    fn test_default_layout() {
        let config = MonitorConfig::default();
        assert_eq!(
            config.full_log,
            PathBuf::from("/var/log/cloudsec/cloudsec-full.log")
        );
        assert_eq!(
            config.alert_log,
            PathBuf::from("/var/log/cloudsec/cloudsec-alerts.log")
        );
        assert_eq!(config.keyword_set(), KeywordSet::default());
    }

    #[test]
    fn test_default_sources() {
        let sources = default_sources();
        let tags: Vec<&str> = sources.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, ["syslog", "auth", "auditd", "network", "dvwa-docker"]);

        match &sources[2].kind {
            SourceKind::FirstAvailable { candidates, fallback } => {
                assert_eq!(candidates[0], PathBuf::from("/var/log/audit/audit.log"));
                assert_eq!(candidates[1], PathBuf::from("/var/log/audit.log"));
                assert_eq!(fallback.to_string(), "journalctl -f -u auditd.service");
            }
            other => panic!("unexpected auditd kind: {:?}", other),
        }
    }

    #[test]
    fn test_only_container_source_records_missing() {
        let sources = default_sources();
        for source in &sources[..4] {
            assert_eq!(source.on_missing, MissingSourcePolicy::Skip, "{}", source.tag);
        }
        assert_eq!(
            sources[4].on_missing,
            MissingSourcePolicy::RecordInFullLog("docker not found on system".into())
        );
    }

    #[test]
    fn test_builders() {
        let config = MonitorConfig::default()
            .with_log_dir("/tmp/cs")
            .with_keywords(["Panic"])
            .with_sources(vec![]);
        assert_eq!(config.full_log, PathBuf::from("/tmp/cs/cloudsec-full.log"));
        assert_eq!(config.alert_log, PathBuf::from("/tmp/cs/cloudsec-alerts.log"));
        assert!(config.keyword_set().matches("kernel PANIC"));
        assert!(config.sources.is_empty());
    }
}
