//! Fixed-interval poll loop: read, parse, publish.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ovpn_metrics::SnapshotSink;
use ovpn_status::parse_status;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::config::DEFAULT_POLL_INTERVAL_MS;
use crate::error::ExporterError;
use crate::source::StatusSource;

/// Counts from one successful poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub clients: usize,
    pub routes: usize,
}

/// Reads the status text from a [`StatusSource`] and hands each parsed
/// snapshot to a [`SnapshotSink`].
///
/// A failed cycle publishes nothing, so the sink keeps whatever the last
/// good cycle produced.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use openvpn_exporter::poller::Poller;
/// use openvpn_exporter::source::FileSource;
/// use ovpn_metrics::{MetricsPublisher, MetricsRegistry};
///
/// #[tokio::main]
/// async fn main() {
///     let registry = MetricsRegistry::new();
///     let publisher = Arc::new(MetricsPublisher::new(registry.clone()));
///
///     let handle = Poller::builder(Box::new(FileSource::new("/var/log/status.log")), publisher)
///         .interval(Duration::from_secs(5))
///         .build()
///         .start();
///
///     tokio::time::sleep(Duration::from_secs(30)).await;
///     handle.stop().await;
/// }
/// ```
pub struct Poller {
    source: Box<dyn StatusSource>,
    sink: Arc<dyn SnapshotSink>,
    interval: Duration,
}

impl fmt::Debug for Poller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poller")
            .field("source", &self.source)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl Poller {
    /// Create a builder for a poller reading `source` and publishing to `sink`.
    pub fn builder(source: Box<dyn StatusSource>, sink: Arc<dyn SnapshotSink>) -> PollerBuilder {
        PollerBuilder {
            source,
            sink,
            interval: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one read, parse and publish cycle.
    pub fn run_cycle(&mut self) -> Result<CycleSummary, ExporterError> {
        let text = self.source.read_status()?;
        let snapshot = parse_status(&text)?;
        let summary = CycleSummary {
            clients: snapshot.clients.len(),
            routes: snapshot.routes.len(),
        };
        self.sink.publish(snapshot);
        Ok(summary)
    }

    /// Run one cycle and log its outcome.
    fn poll_once(&mut self) {
        match self.run_cycle() {
            Ok(summary) => debug!(
                clients = summary.clients,
                routes = summary.routes,
                "Published status snapshot"
            ),
            Err(e) => warn!(
                source = %self.source.description(),
                segment = ?e.segment(),
                error = %e,
                "Poll cycle failed, keeping previous metrics"
            ),
        }
    }

    /// Start polling on a background task.
    ///
    /// The first cycle runs immediately. A cycle that overruns the interval
    /// delays the next one instead of triggering a burst.
    pub fn start(mut self) -> PollHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(self.interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = timer.tick() => self.poll_once(),
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Poll loop stopped");
        });

        PollHandle { stop_tx, task }
    }
}

/// Builder for a [`Poller`].
pub struct PollerBuilder {
    source: Box<dyn StatusSource>,
    sink: Arc<dyn SnapshotSink>,
    interval: Option<Duration>,
}

impl PollerBuilder {
    /// Set the poll interval.
    ///
    /// Defaults to 1 second if not specified.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn build(self) -> Poller {
        Poller {
            source: self.source,
            sink: self.sink,
            interval: self
                .interval
                .unwrap_or(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)),
        }
    }
}

/// Handle for a running poll loop.
///
/// Dropping the handle also ends the loop.
#[derive(Debug)]
pub struct PollHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Signal the loop to stop and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Poll task ended abnormally");
        }
    }
}
