//! # ovpn-status
//!
//! Parser and data model for the status file an OpenVPN server writes with
//! `--status <file>` (version 1 format).
//!
//! The file mixes three tables and reuses commas and colons both as
//! separators and inside values, so parsing happens in explicit phases:
//!
//! 1. [`tokenizer`]: flatten the lines and cut the text at fixed anchors into
//!    the update timestamp, client list, routing table and queue length.
//! 2. [`extract`]: cut each table at the timestamp that closes every row, then
//!    split each row into a fixed number of fields.
//! 3. [`StatusSnapshot::from_segments`]: assemble the records and parse the
//!    numeric values.
//!
//! Any failure aborts the whole parse with a [`ParseError`].
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` for the snapshot types
//!
//! ## Example
//!
//! ```rust
//! use ovpn_status::{parse_status, ParseError};
//!
//! let text = std::fs::read_to_string("/var/log/openvpn/status.log")
//!     .unwrap_or_default();
//!
//! match parse_status(&text) {
//!     Ok(snapshot) => println!("{} clients connected", snapshot.len()),
//!     Err(ParseError::MalformedStatusText { anchor, .. }) => {
//!         eprintln!("not a status file, missing {anchor:?}")
//!     }
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

mod error;
pub mod extract;
mod render;
mod snapshot;
pub mod tokenizer;

pub use error::{ParseError, Segment};
pub use extract::split_host_port;
pub use render::render_status_text;
pub use snapshot::{ClientRecord, RouteRecord, StatusSnapshot};
pub use tokenizer::StatusSegments;

/// Parse the full text of a status file into a snapshot.
pub fn parse_status(text: &str) -> Result<StatusSnapshot, ParseError> {
    let normalized = tokenizer::normalize(text);
    let segments = tokenizer::tokenize(&normalized)?;
    StatusSnapshot::from_segments(segments)
}
