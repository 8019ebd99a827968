//! Mapping of status snapshots onto the exporter's gauges.

use ovpn_status::StatusSnapshot;

use crate::registry::{GaugeFamily, MetricsRegistry};

pub const CLIENTS_COUNT: &str = "ovpn_clients_count";
pub const MAX_BCAST_MCAST_QUEUE: &str = "ovpn_maxmacatbcastqueue";
pub const REMOTE: &str = "ovpn_remote";
pub const BYTES_RECEIVED: &str = "ovpn_bytesr";
pub const BYTES_SENT: &str = "ovpn_bytess";
pub const ROUTING: &str = "ovpn_routing";

const REMOTE_LABELS: &[&str] = &["client", "ip"];
const BYTES_LABELS: &[&str] = &["client", "number"];
const ROUTING_LABELS: &[&str] = &["record_number", "client", "local_ip", "remote_ip"];

/// Destination for the snapshot produced by each poll cycle.
pub trait SnapshotSink: Send + Sync {
    /// Take ownership of a freshly parsed snapshot.
    fn publish(&self, snapshot: StatusSnapshot);
}

/// Publishes snapshots into a [`MetricsRegistry`].
///
/// Each publish replaces every exporter metric, so clients and routes that
/// are gone from the status file disappear from the registry with the next
/// snapshot.
///
/// # Example
///
/// ```rust
/// use ovpn_metrics::{MetricsPublisher, MetricsRegistry};
/// use ovpn_status::StatusSnapshot;
///
/// let registry = MetricsRegistry::new();
/// let publisher = MetricsPublisher::new(registry.clone());
///
/// publisher.publish(StatusSnapshot::new("now", Vec::new(), Vec::new(), 3.0));
///
/// assert_eq!(registry.value("ovpn_clients_count", &[]), Some(0.0));
/// assert_eq!(registry.value("ovpn_maxmacatbcastqueue", &[]), Some(3.0));
/// ```
#[derive(Debug, Clone)]
pub struct MetricsPublisher {
    registry: MetricsRegistry,
}

impl MetricsPublisher {
    /// Create a publisher and register the exporter metrics, all at zero or
    /// without samples, in `registry`.
    pub fn new(registry: MetricsRegistry) -> Self {
        registry.replace_all(empty_families());
        Self { registry }
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    /// Replace the published metrics with the content of `snapshot`.
    pub fn publish(&self, snapshot: StatusSnapshot) {
        self.registry.replace_all(snapshot_families(&snapshot));
    }
}

impl SnapshotSink for MetricsPublisher {
    fn publish(&self, snapshot: StatusSnapshot) {
        MetricsPublisher::publish(self, snapshot);
    }
}

/// Build the full metric set for one snapshot.
///
/// Clients and routes are numbered from 1 in file order. The routing gauge
/// carries its record number as value.
pub fn snapshot_families(snapshot: &StatusSnapshot) -> Vec<GaugeFamily> {
    let [clients_count, max_queue, mut remote, mut bytes_received, mut bytes_sent, mut routing] =
        families(snapshot.clients.len() as f64, snapshot.max_queue_length);

    for (i, client) in snapshot.clients.iter().enumerate() {
        let number = i + 1;
        remote.set(
            vec![client.name.clone(), client.real_address.clone()],
            number as f64,
        );
        bytes_received.set(
            vec![client.name.clone(), number.to_string()],
            client.bytes_received as f64,
        );
        bytes_sent.set(
            vec![client.name.clone(), number.to_string()],
            client.bytes_sent as f64,
        );
    }

    for (i, route) in snapshot.routes.iter().enumerate() {
        let number = i + 1;
        routing.set(
            vec![
                number.to_string(),
                route.client.clone(),
                route.local_virtual_ip.clone(),
                route.real_address.clone(),
            ],
            number as f64,
        );
    }

    vec![
        clients_count,
        max_queue,
        remote,
        bytes_received,
        bytes_sent,
        routing,
    ]
}

/// The metric set before any snapshot was published.
pub fn empty_families() -> Vec<GaugeFamily> {
    families(0.0, 0.0).into()
}

fn families(clients_count: f64, max_queue_length: f64) -> [GaugeFamily; 6] {
    [
        GaugeFamily::gauge(CLIENTS_COUNT, "Current OpenVPN logged in users", clients_count),
        GaugeFamily::gauge(
            MAX_BCAST_MCAST_QUEUE,
            "Current Max Broadcast/Multicast queue",
            max_queue_length,
        ),
        GaugeFamily::new(REMOTE, "OpenVPN users statistics", REMOTE_LABELS),
        GaugeFamily::new(BYTES_RECEIVED, "OpenVPN user Bytes Received", BYTES_LABELS),
        GaugeFamily::new(BYTES_SENT, "OpenVPN user Bytes Sent", BYTES_LABELS),
        GaugeFamily::new(ROUTING, "OpenVPN Routing Table", ROUTING_LABELS),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ovpn_status::{ClientRecord, RouteRecord};

    fn client(name: &str, address: &str, received: u64, sent: u64) -> ClientRecord {
        ClientRecord {
            name: name.to_string(),
            real_address: address.to_string(),
            real_port: "1194".to_string(),
            bytes_received: received,
            bytes_sent: sent,
        }
    }

    fn route(ip: &str, name: &str, address: &str) -> RouteRecord {
        RouteRecord {
            local_virtual_ip: ip.to_string(),
            client: name.to_string(),
            real_address: address.to_string(),
            real_port: "1194".to_string(),
        }
    }

    fn laptop_snapshot() -> StatusSnapshot {
        StatusSnapshot::new(
            "Mon Jan  2 15:04:05 2006",
            vec![client("laptop1", "198.51.100.9", 1024, 2048)],
            vec![route("10.8.0.6", "laptop1", "198.51.100.9")],
            5.0,
        )
    }

    #[test]
    fn test_new_registers_empty_metric_set() {
        let registry = MetricsRegistry::new();
        let _publisher = MetricsPublisher::new(registry.clone());

        assert_eq!(
            registry.names(),
            vec![CLIENTS_COUNT, MAX_BCAST_MCAST_QUEUE, REMOTE, BYTES_RECEIVED, BYTES_SENT, ROUTING]
        );
        assert_eq!(registry.value(CLIENTS_COUNT, &[]), Some(0.0));
        assert_eq!(registry.value(MAX_BCAST_MCAST_QUEUE, &[]), Some(0.0));
        assert!(registry.family(REMOTE).unwrap().samples().is_empty());
    }

    #[test]
    fn test_publish_end_to_end_example() {
        let registry = MetricsRegistry::new();
        let publisher = MetricsPublisher::new(registry.clone());

        publisher.publish(laptop_snapshot());

        assert_eq!(registry.value(CLIENTS_COUNT, &[]), Some(1.0));
        assert_eq!(registry.value(MAX_BCAST_MCAST_QUEUE, &[]), Some(5.0));
        assert_eq!(registry.value(REMOTE, &["laptop1", "198.51.100.9"]), Some(1.0));
        assert_eq!(registry.value(BYTES_RECEIVED, &["laptop1", "1"]), Some(1024.0));
        assert_eq!(registry.value(BYTES_SENT, &["laptop1", "1"]), Some(2048.0));
        assert_eq!(
            registry.value(ROUTING, &["1", "laptop1", "10.8.0.6", "198.51.100.9"]),
            Some(1.0)
        );

        let rendered = registry.render();
        assert!(rendered.contains("ovpn_clients_count 1\n"));
        assert!(rendered.contains("ovpn_bytesr{client=\"laptop1\",number=\"1\"} 1024\n"));
        assert!(rendered.contains(
            "ovpn_routing{record_number=\"1\",client=\"laptop1\",local_ip=\"10.8.0.6\",remote_ip=\"198.51.100.9\"} 1\n"
        ));
    }

    #[test]
    fn test_positions_follow_file_order() {
        let registry = MetricsRegistry::new();
        let publisher = MetricsPublisher::new(registry.clone());

        publisher.publish(StatusSnapshot::new(
            "now",
            vec![
                client("b", "192.0.2.2", 1, 2),
                client("a", "192.0.2.1", 3, 4),
            ],
            vec![
                route("10.8.0.10", "b", "192.0.2.2"),
                route("10.8.0.6", "a", "192.0.2.1"),
            ],
            0.0,
        ));

        assert_eq!(registry.value(REMOTE, &["b", "192.0.2.2"]), Some(1.0));
        assert_eq!(registry.value(REMOTE, &["a", "192.0.2.1"]), Some(2.0));
        assert_eq!(registry.value(BYTES_SENT, &["a", "2"]), Some(4.0));
        assert_eq!(registry.value(ROUTING, &["2", "a", "10.8.0.6", "192.0.2.1"]), Some(2.0));
    }

    #[test]
    fn publishing_twice_is_idempotent() {
        let registry = MetricsRegistry::new();
        let publisher = MetricsPublisher::new(registry.clone());

        publisher.publish(laptop_snapshot());
        let first = registry.render();
        publisher.publish(laptop_snapshot());

        assert_eq!(registry.render(), first);
    }

    #[test]
    fn disconnected_clients_are_cleared() {
        let registry = MetricsRegistry::new();
        let publisher = MetricsPublisher::new(registry.clone());

        publisher.publish(laptop_snapshot());
        publisher.publish(StatusSnapshot::new("later", Vec::new(), Vec::new(), 0.0));

        assert_eq!(registry.value(CLIENTS_COUNT, &[]), Some(0.0));
        assert_eq!(registry.value(BYTES_RECEIVED, &["laptop1", "1"]), None);
        assert!(registry.family(ROUTING).unwrap().samples().is_empty());
    }

    #[test]
    fn duplicate_remote_keeps_last_position() {
        let snapshot = StatusSnapshot::new(
            "now",
            vec![
                client("laptop1", "198.51.100.9", 1, 1),
                client("laptop1", "198.51.100.9", 2, 2),
            ],
            Vec::new(),
            0.0,
        );
        let families = snapshot_families(&snapshot);
        let remote = families.iter().find(|f| f.name() == REMOTE).unwrap();

        assert_eq!(remote.samples().len(), 1);
        assert_eq!(remote.get(&["laptop1", "198.51.100.9"]), Some(2.0));

        // Byte counters are keyed by position and stay distinct.
        let received = families.iter().find(|f| f.name() == BYTES_RECEIVED).unwrap();
        assert_eq!(received.samples().len(), 2);
    }

    #[test]
    fn test_publish_through_sink_trait() {
        let registry = MetricsRegistry::new();
        let sink: Box<dyn SnapshotSink> = Box::new(MetricsPublisher::new(registry.clone()));

        sink.publish(laptop_snapshot());

        assert_eq!(registry.value(CLIENTS_COUNT, &[]), Some(1.0));
    }
}
