use cloudsec_monitor::{Monitor, MonitorConfig};

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr; the monitored trails are the two sink files.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    Monitor::new(MonitorConfig::default()).run().await;
}
