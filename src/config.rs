//! Exporter configuration.
//!
//! Values are layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. an optional config file (format picked from its extension)
//! 3. `OVPN_EXPORTER_*` environment variables
//! 4. command-line flags

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use ovpn_metrics::prometheus::{PrometheusConfig, DEFAULT_LISTEN_ADDR, DEFAULT_METRICS_PATH};
use serde::{Deserialize, Serialize};

use crate::error::ExporterError;

/// Prefix of the environment variables read by [`ExporterConfig::load`].
pub const ENV_PREFIX: &str = "OVPN_EXPORTER";

/// Default location of the OpenVPN status file.
pub const DEFAULT_STATUS_PATH: &str = "/var/log/status.log";

/// Default poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Resolved exporter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Address the metrics server listens on.
    pub listen_addr: String,
    /// URL path of the metrics endpoint.
    pub metrics_path: String,
    /// OpenVPN status file to poll.
    pub status_path: PathBuf,
    /// Delay between two polls of the status file.
    pub poll_interval_ms: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            status_path: PathBuf::from(DEFAULT_STATUS_PATH),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Values given on the command line; `None` leaves lower layers in effect.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub listen_addr: Option<String>,
    pub metrics_path: Option<String>,
    pub status_path: Option<PathBuf>,
    pub poll_interval_ms: Option<u64>,
}

impl ExporterConfig {
    /// Load the configuration from all layers.
    pub fn load(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ExporterError> {
        Self::load_from(file, Environment::with_prefix(ENV_PREFIX), overrides)
    }

    fn load_from(
        file: Option<&Path>,
        environment: Environment,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ExporterError> {
        let defaults = ExporterConfig::default();

        let mut builder = Config::builder()
            .set_default("listen_addr", defaults.listen_addr)?
            .set_default("metrics_path", defaults.metrics_path)?
            .set_default("status_path", path_string(&defaults.status_path))?
            .set_default("poll_interval_ms", defaults.poll_interval_ms)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(environment.try_parsing(true))
            .set_override_option("listen_addr", overrides.listen_addr.clone())?
            .set_override_option("metrics_path", overrides.metrics_path.clone())?
            .set_override_option("status_path", overrides.status_path.as_deref().map(path_string))?
            .set_override_option("poll_interval_ms", overrides.poll_interval_ms)?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Check the settings the exporter cannot start without.
    ///
    /// The status file must be named and must exist.
    pub fn validate(&self) -> Result<(), ExporterError> {
        if self.status_path.as_os_str().is_empty() {
            return Err(ExporterError::MissingStatusPath);
        }
        if !self.status_path.exists() {
            return Err(ExporterError::FileNotFound(self.status_path.clone()));
        }
        if !self.metrics_path.starts_with('/') {
            return Err(ExporterError::InvalidConfig(format!(
                "metrics path {:?} must start with '/'",
                self.metrics_path
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ExporterError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings for the metrics HTTP server.
    pub fn prometheus(&self) -> PrometheusConfig {
        PrometheusConfig::builder()
            .listen_addr(self.listen_addr.clone())
            .metrics_path(self.metrics_path.clone())
            .build()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn environment(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config =
            ExporterConfig::load_from(None, environment(&[]), &ConfigOverrides::default()).unwrap();

        assert_eq!(config, ExporterConfig::default());
        assert_eq!(config.listen_addr, ":9509");
        assert_eq!(config.metrics_path, "/metrics");
        assert_eq!(config.status_path, PathBuf::from("/var/log/status.log"));
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_file_environment_and_flags_are_layered() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "listen_addr = \"127.0.0.1:9000\"\nmetrics_path = \"/from-file\"\npoll_interval_ms = 250"
        )
        .unwrap();

        let overrides = ConfigOverrides {
            metrics_path: Some("/from-flag".to_string()),
            ..ConfigOverrides::default()
        };
        let config = ExporterConfig::load_from(
            Some(file.path()),
            environment(&[
                ("OVPN_EXPORTER_LISTEN_ADDR", "127.0.0.1:9100"),
                ("OVPN_EXPORTER_STATUS_PATH", "/run/openvpn/server.status"),
            ]),
            &overrides,
        )
        .unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9100");
        assert_eq!(config.metrics_path, "/from-flag");
        assert_eq!(config.status_path, PathBuf::from("/run/openvpn/server.status"));
        assert_eq!(config.poll_interval_ms, 250);
    }

    #[test]
    fn test_flags_override_everything() {
        let overrides = ConfigOverrides {
            listen_addr: Some(":9999".to_string()),
            metrics_path: None,
            status_path: Some(PathBuf::from("/tmp/status.log")),
            poll_interval_ms: Some(5000),
        };
        let config = ExporterConfig::load_from(
            None,
            environment(&[("OVPN_EXPORTER_LISTEN_ADDR", "127.0.0.1:9100")]),
            &overrides,
        )
        .unwrap();

        assert_eq!(config.listen_addr, ":9999");
        assert_eq!(config.metrics_path, "/metrics");
        assert_eq!(config.status_path, PathBuf::from("/tmp/status.log"));
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let result = ExporterConfig::load_from(
            Some(Path::new("/nonexistent/exporter.toml")),
            environment(&[]),
            &ConfigOverrides::default(),
        );
        assert!(matches!(result, Err(ExporterError::Config(_))));
    }

    #[test]
    fn test_validate_accepts_existing_file() {
        let file = NamedTempFile::new().unwrap();
        let config = ExporterConfig {
            status_path: file.path().to_path_buf(),
            ..ExporterConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_file() {
        let config = ExporterConfig {
            status_path: PathBuf::from("/nonexistent/status.log"),
            ..ExporterConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ExporterError::FileNotFound(path)) if path == Path::new("/nonexistent/status.log")
        ));
    }

    #[test]
    fn validate_rejects_empty_path() {
        let config = ExporterConfig {
            status_path: PathBuf::new(),
            ..ExporterConfig::default()
        };
        assert!(matches!(config.validate(), Err(ExporterError::MissingStatusPath)));
    }

    #[test]
    fn validate_rejects_bad_metrics_path_and_interval() {
        let file = NamedTempFile::new().unwrap();
        let base = ExporterConfig {
            status_path: file.path().to_path_buf(),
            ..ExporterConfig::default()
        };

        let relative = ExporterConfig {
            metrics_path: "metrics".to_string(),
            ..base.clone()
        };
        assert!(matches!(relative.validate(), Err(ExporterError::InvalidConfig(_))));

        let zero = ExporterConfig {
            poll_interval_ms: 0,
            ..base
        };
        assert!(matches!(zero.validate(), Err(ExporterError::InvalidConfig(_))));
    }

    #[test]
    fn test_prometheus_config() {
        let config = ExporterConfig {
            listen_addr: "127.0.0.1:9509".to_string(),
            metrics_path: "/stats".to_string(),
            ..ExporterConfig::default()
        };
        let prometheus = config.prometheus();

        assert_eq!(prometheus.listen_addr, "127.0.0.1:9509");
        assert_eq!(prometheus.metrics_path, "/stats");
    }
}
