//! Anchor-based segmentation of the raw status dump.
//!
//! The status file is first flattened into a single line (see [`normalize`])
//! and then cut into segments at fixed header strings. Anchors are searched
//! strictly in file order, each one after the end of the previous.

use crate::error::{ParseError, Segment};

/// Header line carrying the file's update timestamp.
pub const UPDATED_ANCHOR: &str = "OpenVPN CLIENT LIST Updated,";

/// Column header that precedes the client rows.
pub const CLIENT_LIST_ANCHOR: &str =
    "Common Name,Real Address,Bytes Received,Bytes Sent,Connected Since";

/// Section and column header that precedes the routing rows.
pub const ROUTING_TABLE_ANCHOR: &str =
    "ROUTING TABLE Virtual Address,Common Name,Real Address,Last Ref";

/// Section header and key that precede the queue length value.
pub const GLOBAL_STATS_ANCHOR: &str = "GLOBAL STATS Max bcast/mcast queue length,";

/// Terminator of the status dump.
pub const END_ANCHOR: &str = "END";

/// The raw text of each logical part of a status dump.
///
/// All slices borrow from the normalized text and are trimmed of
/// surrounding whitespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSegments<'a> {
    /// Value of the `Updated,` header.
    pub updated_at: &'a str,
    /// Client rows, still joined on one line.
    pub client_list: &'a str,
    /// Routing rows, still joined on one line.
    pub routing_table: &'a str,
    /// Value of `Max bcast/mcast queue length`.
    pub max_queue_length: &'a str,
}

/// Join all lines of `text` into one string, each line prefixed by a space.
///
/// Carriage returns left over from `\r\n` line endings are dropped.
pub fn normalize(text: &str) -> String {
    let mut joined = String::with_capacity(text.len() + 1);
    for line in text.split('\n') {
        joined.push(' ');
        joined.push_str(line.strip_suffix('\r').unwrap_or(line));
    }
    joined
}

/// Split normalized status text into its segments.
///
/// Returns [`ParseError::MalformedStatusText`] naming the first anchor that
/// could not be found.
pub fn tokenize(normalized: &str) -> Result<StatusSegments<'_>, ParseError> {
    let mut cursor = AnchorCursor::new(normalized);

    cursor.take_until(UPDATED_ANCHOR, Segment::Header)?;
    let updated_at = cursor.take_until(CLIENT_LIST_ANCHOR, Segment::ClientList)?;
    let client_list = cursor.take_until(ROUTING_TABLE_ANCHOR, Segment::RoutingTable)?;
    let routing_table = cursor.take_until(GLOBAL_STATS_ANCHOR, Segment::GlobalStats)?;
    let max_queue_length = cursor.take_until(END_ANCHOR, Segment::GlobalStats)?;

    Ok(StatusSegments {
        updated_at,
        client_list,
        routing_table,
        max_queue_length,
    })
}

/// Forward-only scanner over the normalized text.
struct AnchorCursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> AnchorCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Return the trimmed text between the cursor and `anchor`, then move
    /// the cursor past the anchor.
    fn take_until(&mut self, anchor: &'static str, segment: Segment) -> Result<&'a str, ParseError> {
        let rest = &self.text[self.pos..];
        let offset = rest
            .find(anchor)
            .ok_or(ParseError::MalformedStatusText { anchor, segment })?;
        self.pos += offset + anchor.len();
        Ok(rest[..offset].trim())
    }
}
