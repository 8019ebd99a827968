//! Record extraction from the client list and routing table segments.
//!
//! Both tables end every row with a timestamp (`Connected Since` for clients,
//! `Last Ref` for routes). Commas also appear inside addresses, so rows are
//! cut at those timestamp tokens first and only then split into fields.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ParseError, Segment};
use crate::snapshot::{ClientRecord, RouteRecord};

/// Matches the ctime-style timestamps that close every table row, e.g.
/// `Mon Jan  2 15:04:05 2006`. Single-digit days are space padded.
static ROW_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:Mon|Tue|Wed|Thu|Fri|Sat|Sun) +(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec) +\d{1,2} +\d{2}:\d{2}:\d{2} +\d{4}",
    )
    .expect("row timestamp pattern is valid")
});

const CLIENT_FIELDS: usize = 4;
const ROUTE_FIELDS: usize = 3;

/// Extract the client rows of a client list segment, in file order.
pub fn extract_clients(body: &str) -> Result<Vec<ClientRecord>, ParseError> {
    split_records(body)
        .map(|record| {
            let [name, address, received, sent] =
                split_fields::<CLIENT_FIELDS>(record, Segment::ClientList)?;
            let (real_address, real_port) = split_host_port(address);

            Ok(ClientRecord {
                name: name.to_string(),
                real_address: real_address.to_string(),
                real_port: real_port.to_string(),
                bytes_received: parse_counter(received, "bytes received")?,
                bytes_sent: parse_counter(sent, "bytes sent")?,
            })
        })
        .collect()
}

/// Extract the rows of a routing table segment, in file order.
pub fn extract_routes(body: &str) -> Result<Vec<RouteRecord>, ParseError> {
    split_records(body)
        .map(|record| {
            let [local_virtual_ip, client, address] =
                split_fields::<ROUTE_FIELDS>(record, Segment::RoutingTable)?;
            let (real_address, real_port) = split_host_port(address);

            Ok(RouteRecord {
                local_virtual_ip: local_virtual_ip.to_string(),
                client: client.to_string(),
                real_address: real_address.to_string(),
                real_port: real_port.to_string(),
            })
        })
        .collect()
}

/// Split an `address:port` field into host and port.
///
/// The split happens at the last colon, and only when everything after it is
/// a non-empty run of digits. Otherwise the whole field is the host and the
/// port is empty. Square brackets around an IPv6 host are removed in both
/// cases.
///
/// ```rust
/// use ovpn_status::split_host_port;
///
/// assert_eq!(split_host_port("203.0.113.5:1194"), ("203.0.113.5", "1194"));
/// assert_eq!(split_host_port("203.0.113.5"), ("203.0.113.5", ""));
/// assert_eq!(split_host_port("2001:db8::7:1194"), ("2001:db8::7", "1194"));
/// ```
pub fn split_host_port(address: &str) -> (&str, &str) {
    match address.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            (strip_brackets(host), port)
        }
        _ => (strip_brackets(address), ""),
    }
}

fn strip_brackets(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

/// Cut a table segment into rows at each row timestamp.
///
/// The timestamp itself is dropped. Whatever follows the last timestamp must
/// be blank; if it is not, it is yielded as a row and fails field splitting.
fn split_records(body: &str) -> impl Iterator<Item = &str> {
    let mut chunks: Vec<&str> = ROW_TIMESTAMP.split(body).map(str::trim).collect();
    if chunks.last().is_some_and(|last| last.is_empty()) {
        chunks.pop();
    }
    chunks
        .into_iter()
        .map(|chunk| chunk.strip_suffix(',').unwrap_or(chunk))
}

fn split_fields<const N: usize>(record: &str, segment: Segment) -> Result<[&str; N], ParseError> {
    let fields: Vec<&str> = record.split(',').map(str::trim).collect();
    let found = fields.len();

    <[&str; N]>::try_from(fields).map_err(|_| ParseError::RecordFieldCountMismatch {
        segment,
        expected: N,
        found,
        record: record.to_string(),
    })
}

fn parse_counter(value: &str, field: &'static str) -> Result<u64, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidNumericField {
        segment: Segment::ClientList,
        field,
        value: value.to_string(),
    })
}
