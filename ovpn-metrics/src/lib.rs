//! # ovpn-metrics
//!
//! Prometheus metrics for OpenVPN status snapshots.
//!
//! - [`MetricsRegistry`]: shared, internally synchronized set of gauges
//! - [`MetricsPublisher`]: maps each [`StatusSnapshot`] onto the
//!   `ovpn_*` gauges, replacing the previous values
//! - [`prometheus`] (`server` feature, on by default): HTTP endpoint with a
//!   landing page and the metrics in text exposition format
//!
//! ## Example
//!
//! ```rust
//! use ovpn_metrics::{MetricsPublisher, MetricsRegistry};
//! use ovpn_status::parse_status;
//!
//! let registry = MetricsRegistry::new();
//! let publisher = MetricsPublisher::new(registry.clone());
//!
//! let text = "OpenVPN CLIENT LIST\nUpdated,Mon Jan  2 15:04:05 2006\n\
//!     Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since\n\
//!     ROUTING TABLE\nVirtual Address,Common Name,Real Address,Last Ref\n\
//!     GLOBAL STATS\nMax bcast/mcast queue length,0\nEND\n";
//!
//! publisher.publish(parse_status(text).unwrap());
//! assert!(registry.render().contains("ovpn_clients_count 0"));
//! ```

mod publisher;
mod registry;

#[cfg(feature = "server")]
pub mod prometheus;

pub use publisher::{
    empty_families, snapshot_families, MetricsPublisher, SnapshotSink, BYTES_RECEIVED, BYTES_SENT,
    CLIENTS_COUNT, MAX_BCAST_MCAST_QUEUE, REMOTE, ROUTING,
};
pub use registry::{GaugeFamily, MetricsRegistry, Sample};

#[cfg(feature = "server")]
pub use prometheus::{MetricsServer, PrometheusConfig, ServerError};

// Re-export types for convenience
pub use ovpn_status::StatusSnapshot;
