//! # openvpn-exporter
//!
//! Prometheus exporter for the status file written by an OpenVPN server
//! (`status` directive, version 1 format).
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Exporter                              │
//! │  ┌─────────┐    ┌──────────┐    ┌───────────┐    ┌────────────┐  │
//! │  │ source  │───▶│  poller  │───▶│ publisher │───▶│  registry  │  │
//! │  │ (file)  │    │(interval)│    │ (gauges)  │    │  (shared)  │  │
//! │  └─────────┘    └────┬─────┘    └───────────┘    └─────┬──────┘  │
//! │                      │                                 │         │
//! │                      ▼                                 ▼         │
//! │              ovpn_status::parse_status           MetricsServer   │
//! │                                                  (HTTP scrape)   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: [`StatusSource`] trait and the [`FileSource`] that reads
//!   the status file on every cycle
//! - **[`poller`]**: fixed-interval read → parse → publish loop with a
//!   start/stop handle
//! - **[`config`]**: layered configuration (defaults, file, environment,
//!   command line)
//! - **[`logging`]**: `tracing` subscriber setup
//!
//! Parsing lives in [`ovpn_status`], the gauges and the HTTP endpoint in
//! [`ovpn_metrics`].
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Serve metrics on :9509/metrics
//! openvpn-exporter --ovpn.log /var/log/openvpn/status.log
//!
//! # Parse once and print the snapshot as JSON
//! openvpn-exporter --ovpn.log /var/log/openvpn/status.log --dump
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use openvpn_exporter::{FileSource, Poller};
//! use ovpn_metrics::{MetricsPublisher, MetricsRegistry};
//!
//! let registry = MetricsRegistry::new();
//! let publisher = Arc::new(MetricsPublisher::new(registry.clone()));
//! let mut poller = Poller::builder(Box::new(FileSource::new("status.log")), publisher).build();
//!
//! let summary = poller.run_cycle()?;
//! println!("{} clients, {} routes", summary.clients, summary.routes);
//! print!("{}", registry.render());
//! # Ok::<(), openvpn_exporter::ExporterError>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod poller;
pub mod source;

// Re-export main types for convenience
pub use config::{ConfigOverrides, ExporterConfig};
pub use error::ExporterError;
pub use poller::{CycleSummary, PollHandle, Poller, PollerBuilder};
pub use source::{FileSource, StatusSource};
