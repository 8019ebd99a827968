//! HTTP endpoint serving the registry in the Prometheus exposition format.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ovpn_metrics::prometheus::{MetricsServer, PrometheusConfig};
//! use ovpn_metrics::{MetricsPublisher, MetricsRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PrometheusConfig::builder()
//!         .listen_addr(":9509")
//!         .metrics_path("/metrics")
//!         .build();
//!
//!     let registry = MetricsRegistry::new();
//!     let _publisher = MetricsPublisher::new(registry.clone());
//!
//!     // Metrics available at http://localhost:9509/metrics
//!     MetricsServer::new(config, registry).run().await?;
//!     Ok(())
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, warn};

use crate::registry::MetricsRegistry;

/// Default listen address: all interfaces, port 9509.
pub const DEFAULT_LISTEN_ADDR: &str = ":9509";

/// Default path of the metrics endpoint.
pub const DEFAULT_METRICS_PATH: &str = "/metrics";

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Errors raised by the metrics HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration for the metrics endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrometheusConfig {
    /// Address to listen on (e.g., ":9509" or "127.0.0.1:9509")
    pub listen_addr: String,
    /// Path for metrics endpoint (e.g., "/metrics")
    pub metrics_path: String,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
        }
    }
}

impl PrometheusConfig {
    /// Create a new builder for PrometheusConfig.
    pub fn builder() -> PrometheusConfigBuilder {
        PrometheusConfigBuilder::default()
    }

    /// The listen address in a form `TcpListener::bind` accepts.
    ///
    /// A bare `:port` means all interfaces.
    pub fn bind_addr(&self) -> String {
        match self.listen_addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => self.listen_addr.clone(),
        }
    }
}

/// Builder for PrometheusConfig.
#[derive(Debug, Default)]
pub struct PrometheusConfigBuilder {
    listen_addr: Option<String>,
    metrics_path: Option<String>,
}

impl PrometheusConfigBuilder {
    /// Set the listen address.
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = Some(addr.into());
        self
    }

    /// Set the metrics path.
    pub fn metrics_path(mut self, path: impl Into<String>) -> Self {
        self.metrics_path = Some(path.into());
        self
    }

    /// Build the PrometheusConfig.
    pub fn build(self) -> PrometheusConfig {
        PrometheusConfig {
            listen_addr: self
                .listen_addr
                .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            metrics_path: self
                .metrics_path
                .unwrap_or_else(|| DEFAULT_METRICS_PATH.to_string()),
        }
    }
}

/// HTTP server exposing a [`MetricsRegistry`].
///
/// Routes:
/// - the configured metrics path: the registry in exposition format
/// - `/healthz`: `OK`
/// - anything else: a landing page linking to the metrics path
#[derive(Debug, Clone)]
pub struct MetricsServer {
    config: PrometheusConfig,
    registry: MetricsRegistry,
}

impl MetricsServer {
    pub fn new(config: PrometheusConfig, registry: MetricsRegistry) -> Self {
        Self { config, registry }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PrometheusConfig {
        &self.config
    }

    /// Bind the listen address without accepting connections yet.
    pub async fn bind(self) -> Result<BoundMetricsServer, ServerError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(addr.as_str())
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        Ok(BoundMetricsServer {
            listener,
            routes: Routes::new(self.config.metrics_path, self.registry),
        })
    }

    /// Bind and serve until the task is dropped.
    pub async fn run(self) -> Result<(), ServerError> {
        self.bind().await?.serve().await;
        Ok(())
    }
}

/// A metrics server whose listener is bound.
#[derive(Debug)]
pub struct BoundMetricsServer {
    listener: TcpListener,
    routes: Routes,
}

impl BoundMetricsServer {
    /// The address actually bound, useful with port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, one task per connection.
    pub async fn serve(self) {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    // Typically out of file descriptors; back off and retry.
                    warn!(error = %e, "Failed to accept metrics connection");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let routes = self.routes.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                    let routes = routes.clone();
                    async move { routes.handle(req) }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!(%peer, error = %e, "Metrics connection error");
                }
            });
        }
    }
}

#[derive(Debug, Clone)]
struct Routes {
    metrics_path: String,
    landing_page: Bytes,
    registry: MetricsRegistry,
}

impl Routes {
    fn new(metrics_path: String, registry: MetricsRegistry) -> Self {
        let landing_page = Bytes::from(landing_page(&metrics_path));
        Self {
            metrics_path,
            landing_page,
            registry,
        }
    }

    fn handle<B>(&self, req: Request<B>) -> Result<Response<Full<Bytes>>, Infallible> {
        let path = req.uri().path();

        let response = if path == self.metrics_path {
            respond(EXPOSITION_CONTENT_TYPE, self.registry.render())
        } else if path == "/healthz" {
            respond("text/plain", "OK")
        } else {
            respond("text/html; charset=utf-8", self.landing_page.clone())
        };
        Ok(response)
    }
}

fn respond(content_type: &'static str, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = StatusCode::OK;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// HTML page served on every path other than the metrics and health paths.
pub fn landing_page(metrics_path: &str) -> String {
    format!(
        "<html><head><title>OpenVPN exporter</title></head><body>\
         <h1>OpenVPN server stats exporter</h1>\
         <p><a href='{metrics_path}'>Metrics</a></p>\
         </body></html>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetricsPublisher;
    use ovpn_status::{ClientRecord, StatusSnapshot};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    async fn start(config: PrometheusConfig, registry: MetricsRegistry) -> SocketAddr {
        let server = MetricsServer::new(config, registry).bind().await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.serve());
        addr
    }

    fn local_config(metrics_path: &str) -> PrometheusConfig {
        PrometheusConfig::builder()
            .listen_addr("127.0.0.1:0")
            .metrics_path(metrics_path)
            .build()
    }

    #[test]
    fn test_prometheus_config_defaults() {
        let config = PrometheusConfig::default();

        assert_eq!(config.listen_addr, ":9509");
        assert_eq!(config.metrics_path, "/metrics");
        assert_eq!(config, PrometheusConfig::builder().build());
    }

    #[test]
    fn test_bind_addr_expands_bare_port() {
        assert_eq!(PrometheusConfig::default().bind_addr(), "0.0.0.0:9509");

        let config = PrometheusConfig::builder().listen_addr("127.0.0.1:8080").build();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_landing_page_links_metrics_path() {
        let page = landing_page("/custom");
        assert!(page.contains("<a href='/custom'>Metrics</a>"));
        assert!(page.contains("<title>OpenVPN exporter</title>"));
    }

    #[tokio::test]
    async fn test_serves_metrics() {
        let registry = MetricsRegistry::new();
        let publisher = MetricsPublisher::new(registry.clone());
        publisher.publish(StatusSnapshot::new(
            "now",
            vec![ClientRecord {
                name: "laptop1".to_string(),
                real_address: "198.51.100.9".to_string(),
                real_port: "44291".to_string(),
                bytes_received: 1024,
                bytes_sent: 2048,
            }],
            Vec::new(),
            0.0,
        ));

        let addr = start(local_config("/metrics"), registry).await;
        let response = get(addr, "/metrics").await;

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("text/plain; version=0.0.4"));
        assert!(response.contains("ovpn_clients_count 1"));
        assert!(response.contains("ovpn_bytesr{client=\"laptop1\",number=\"1\"} 1024"));
    }

    #[tokio::test]
    async fn test_custom_metrics_path_and_landing_page() {
        let registry = MetricsRegistry::new();
        let _publisher = MetricsPublisher::new(registry.clone());
        let addr = start(local_config("/custom-metrics"), registry).await;

        let metrics = get(addr, "/custom-metrics").await;
        assert!(metrics.contains("# TYPE ovpn_clients_count gauge"));

        let landing = get(addr, "/").await;
        assert!(landing.starts_with("HTTP/1.1 200 OK"));
        assert!(landing.contains("<a href='/custom-metrics'>Metrics</a>"));

        let other = get(addr, "/metrics").await;
        assert!(other.contains("OpenVPN server stats exporter"));
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let addr = start(local_config("/metrics"), MetricsRegistry::new()).await;
        let response = get(addr, "/healthz").await;

        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("OK"));
    }

    #[tokio::test]
    async fn bind_failure_is_reported() {
        let first = MetricsServer::new(local_config("/metrics"), MetricsRegistry::new())
            .bind()
            .await
            .unwrap();
        let taken = first.local_addr().unwrap();

        let config = PrometheusConfig::builder()
            .listen_addr(taken.to_string())
            .build();
        let err = MetricsServer::new(config, MetricsRegistry::new())
            .bind()
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::Bind { .. }));
        assert!(err.to_string().contains(&taken.to_string()));
    }
}
