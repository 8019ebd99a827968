use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use openvpn_exporter::source::{FileSource, StatusSource};
use openvpn_exporter::{logging, ConfigOverrides, ExporterConfig, Poller};
use ovpn_metrics::{MetricsPublisher, MetricsRegistry, MetricsServer};
use ovpn_status::{parse_status, StatusSnapshot};

#[derive(Parser, Debug)]
#[command(name = "openvpn-exporter")]
#[command(about = "Prometheus exporter for OpenVPN server status files")]
#[command(version)]
struct Args {
    /// Address to listen on for the web interface and telemetry [default: :9509]
    #[arg(long = "listenaddr", value_name = "ADDR")]
    listen_addr: Option<String>,

    /// Path under which to expose metrics [default: /metrics]
    #[arg(long = "metricspath", value_name = "PATH")]
    metrics_path: Option<String>,

    /// Absolute path of the OpenVPN status log [default: /var/log/status.log]
    #[arg(long = "ovpn.log", value_name = "FILE")]
    status_path: Option<PathBuf>,

    /// Poll interval in milliseconds [default: 1000]
    #[arg(long = "interval-ms", value_name = "MS")]
    interval_ms: Option<u64>,

    /// Optional config file (TOML, YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Parse the status file once, print it as JSON and exit
    #[arg(long)]
    dump: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            listen_addr: self.listen_addr.clone(),
            metrics_path: self.metrics_path.clone(),
            status_path: self.status_path.clone(),
            poll_interval_ms: self.interval_ms,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level)?;

    let config = ExporterConfig::load(args.config.as_deref(), &args.overrides())
        .context("failed to load configuration")?;
    config.validate()?;

    // Handle dump mode (non-serving)
    if args.dump {
        return dump_snapshot(&config.status_path);
    }

    run(config).await
}

/// Serve metrics until interrupted.
async fn run(config: ExporterConfig) -> Result<()> {
    let registry = MetricsRegistry::new();
    let publisher = Arc::new(MetricsPublisher::new(registry.clone()));

    let server = MetricsServer::new(config.prometheus(), registry)
        .bind()
        .await
        .context("failed to start metrics server")?;

    info!(
        listen_addr = %config.listen_addr,
        metrics_path = %config.metrics_path,
        status_path = %config.status_path.display(),
        "Starting OpenVPN exporter"
    );

    let poller = Poller::builder(Box::new(FileSource::new(&config.status_path)), publisher)
        .interval(config.poll_interval())
        .build()
        .start();

    tokio::select! {
        _ = server.serve() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!("Shutting down");
        }
    }

    poller.stop().await;
    Ok(())
}

/// Print one parsed snapshot with a short summary as pretty JSON.
fn dump_snapshot(status_path: &Path) -> Result<()> {
    let mut source = FileSource::new(status_path);
    let text = source.read_status()?;
    let snapshot = parse_status(&text)
        .with_context(|| format!("failed to parse {}", status_path.display()))?;

    let export = serde_json::json!({
        "summary": summary(&snapshot),
        "snapshot": snapshot,
    });
    println!("{}", serde_json::to_string_pretty(&export)?);
    Ok(())
}

fn summary(snapshot: &StatusSnapshot) -> serde_json::Value {
    serde_json::json!({
        "updated_at": snapshot.updated_at,
        "clients": snapshot.clients.len(),
        "routes": snapshot.routes.len(),
        "total_bytes_received": snapshot.total_bytes_received(),
        "total_bytes_sent": snapshot.total_bytes_sent(),
    })
}
