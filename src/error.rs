//! Error types for the exporter.

use std::io;
use std::path::PathBuf;

use ovpn_status::{ParseError, Segment};
use thiserror::Error;

/// Errors raised while configuring the exporter or running a poll cycle.
///
/// `MissingStatusPath`, `FileNotFound`, `InvalidConfig` and `Config` are
/// startup errors. `Read` and `Parse` only ever fail a single poll cycle.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// No status file path was configured.
    #[error("OpenVPN status log absolute path must be set with '--ovpn.log'")]
    MissingStatusPath,

    /// The configured status file does not exist.
    #[error("file {} does not exist", .0.display())]
    FileNotFound(PathBuf),

    /// A configured value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration sources could not be loaded.
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    /// The status file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The status file content could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl ExporterError {
    /// The status file segment a parse failure was raised in.
    pub fn segment(&self) -> Option<Segment> {
        match self {
            ExporterError::Parse(e) => Some(e.segment()),
            _ => None,
        }
    }
}
