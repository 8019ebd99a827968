//! Status text sources.
//!
//! The poller only needs the raw status text once per cycle. Keeping the
//! read behind a trait lets tests feed scripted contents without touching
//! the filesystem.

mod file;

pub use file::FileSource;

use std::fmt::Debug;

use crate::error::ExporterError;

/// Trait for reading the OpenVPN status text.
///
/// # Example
///
/// ```no_run
/// use openvpn_exporter::source::{FileSource, StatusSource};
///
/// let mut source = FileSource::new("/var/log/status.log");
/// let text = source.read_status()?;
/// println!("read {} bytes from {}", text.len(), source.description());
/// # Ok::<(), openvpn_exporter::ExporterError>(())
/// ```
pub trait StatusSource: Send + Debug {
    /// Read the full, current status text.
    fn read_status(&mut self) -> Result<String, ExporterError>;

    /// Returns a human-readable description of the source.
    ///
    /// Used in log lines.
    fn description(&self) -> &str;
}
