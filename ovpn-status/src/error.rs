//! Error types for status parsing.

use std::fmt;

use thiserror::Error;

/// The part of the status file a record or value was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// The `Updated,` header line.
    Header,
    /// The `OpenVPN CLIENT LIST` rows.
    ClientList,
    /// The `ROUTING TABLE` rows.
    RoutingTable,
    /// The `GLOBAL STATS` block.
    GlobalStats,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Segment::Header => "header",
            Segment::ClientList => "client list",
            Segment::RoutingTable => "routing table",
            Segment::GlobalStats => "global stats",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while parsing a status dump.
///
/// Every variant aborts the whole parse; a snapshot is never returned
/// partially populated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A fixed anchor was not found where the format requires it.
    #[error("malformed status text: missing anchor {anchor:?} ({segment})")]
    MalformedStatusText {
        anchor: &'static str,
        segment: Segment,
    },

    /// A record did not split into the expected number of fields.
    #[error("{segment}: expected {expected} fields, found {found} in record {record:?}")]
    RecordFieldCountMismatch {
        segment: Segment,
        expected: usize,
        found: usize,
        record: String,
    },

    /// A field that must be numeric could not be parsed.
    #[error("{segment}: invalid {field} value {value:?}")]
    InvalidNumericField {
        segment: Segment,
        field: &'static str,
        value: String,
    },
}

impl ParseError {
    /// The segment the error was raised in.
    pub fn segment(&self) -> Segment {
        match self {
            ParseError::MalformedStatusText { segment, .. }
            | ParseError::RecordFieldCountMismatch { segment, .. }
            | ParseError::InvalidNumericField { segment, .. } => *segment,
        }
    }
}
