//! StatusSnapshot - one parsed status dump.

use crate::error::{ParseError, Segment};
use crate::extract::{extract_clients, extract_routes};
use crate::tokenizer::StatusSegments;

/// A connected client, as listed in the `OpenVPN CLIENT LIST` table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientRecord {
    /// Common name of the client certificate.
    pub name: String,
    /// Host part of the client's real address.
    pub real_address: String,
    /// Port part of the client's real address; empty when none was listed.
    pub real_port: String,
    pub bytes_received: u64,
    pub bytes_sent: u64,
}

/// An entry of the `ROUTING TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteRecord {
    /// Virtual address routed to the client.
    pub local_virtual_ip: String,
    /// Common name of the client owning the route.
    pub client: String,
    pub real_address: String,
    pub real_port: String,
}

/// The parsed content of one status dump.
///
/// A snapshot is built in one step from the segments of a dump and is never
/// partially populated. Clients and routes keep the order in which they
/// appear in the file; that order is their 1-based record number.
///
/// # Example
///
/// ```rust
/// use ovpn_status::parse_status;
///
/// let text = "OpenVPN CLIENT LIST\n\
///     Updated,Mon Jan  2 15:04:05 2006\n\
///     Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since\n\
///     laptop1,198.51.100.9:44291,1024,2048,Mon Jan  2 15:04:05 2006\n\
///     ROUTING TABLE\n\
///     Virtual Address,Common Name,Real Address,Last Ref\n\
///     10.8.0.6,laptop1,198.51.100.9:44291,Mon Jan  2 15:04:05 2006\n\
///     GLOBAL STATS\n\
///     Max bcast/mcast queue length,5\n\
///     END\n";
///
/// let snapshot = parse_status(text).unwrap();
/// assert_eq!(snapshot.len(), 1);
/// assert_eq!(snapshot.clients[0].bytes_sent, 2048);
/// assert_eq!(snapshot.max_queue_length, 5.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusSnapshot {
    /// Value of the `Updated,` header, verbatim.
    pub updated_at: String,
    pub clients: Vec<ClientRecord>,
    pub routes: Vec<RouteRecord>,
    /// `Max bcast/mcast queue length` from the global stats.
    pub max_queue_length: f64,
}

impl StatusSnapshot {
    /// Create a snapshot from already extracted parts.
    pub fn new(
        updated_at: impl Into<String>,
        clients: Vec<ClientRecord>,
        routes: Vec<RouteRecord>,
        max_queue_length: f64,
    ) -> Self {
        Self {
            updated_at: updated_at.into(),
            clients,
            routes,
            max_queue_length,
        }
    }

    /// Extract records from the segments of a dump and assemble a snapshot.
    ///
    /// Fails on the first malformed row or non-numeric value; nothing is
    /// returned for the dump in that case.
    pub fn from_segments(segments: StatusSegments<'_>) -> Result<Self, ParseError> {
        let clients = extract_clients(segments.client_list)?;
        let routes = extract_routes(segments.routing_table)?;
        let max_queue_length = segments.max_queue_length.parse::<f64>().map_err(|_| {
            ParseError::InvalidNumericField {
                segment: Segment::GlobalStats,
                field: "max bcast/mcast queue length",
                value: segments.max_queue_length.to_string(),
            }
        })?;

        Ok(Self::new(
            segments.updated_at,
            clients,
            routes,
            max_queue_length,
        ))
    }

    /// Number of connected clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Check if no client is connected.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Look up the first client with the given common name.
    pub fn client(&self, name: &str) -> Option<&ClientRecord> {
        self.clients.iter().find(|c| c.name == name)
    }

    /// Total bytes received from all clients.
    pub fn total_bytes_received(&self) -> u64 {
        self.clients.iter().map(|c| c.bytes_received).sum()
    }

    /// Total bytes sent to all clients.
    pub fn total_bytes_sent(&self) -> u64 {
        self.clients.iter().map(|c| c.bytes_sent).sum()
    }
}
