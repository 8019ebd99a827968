//! File-based status source.

use std::fs;
use std::path::{Path, PathBuf};

use super::StatusSource;
use crate::error::ExporterError;

/// Reads the status file written by the OpenVPN server.
///
/// OpenVPN rewrites the whole file on every status interval, so the file is
/// read in full on each call and nothing is cached between reads.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self { path, description }
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StatusSource for FileSource {
    fn read_status(&mut self) -> Result<String, ExporterError> {
        fs::read_to_string(&self.path).map_err(|source| ExporterError::Read {
            path: self.path.clone(),
            source,
        })
    }

    fn description(&self) -> &str {
        &self.description
    }
}
