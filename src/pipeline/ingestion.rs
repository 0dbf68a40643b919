// Ingestion pipeline
//
// Disconnected -> Connecting -> Connected -> Disconnected -> (fixed delay) -> Connecting ...
//
// One task owns the connection, the timing marks and the write side of every
// channel. Messages are handled strictly one at a time in arrival order, and
// publishing never waits on the consumer, so the link is always being read.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::FeedConfig;
use crate::error::SimulatorError;
use crate::orderbook::{parse_message, FeedMessage, OrderBookSnapshot};
use crate::pipeline::connector::{Connector, FeedConnection};
use crate::pipeline::latency::TickTiming;
use crate::pipeline::status::{ConnectionStatus, PipelineStatus};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Fixed wait after a drop or failed connect; never grows
    pub reconnect_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

impl From<&FeedConfig> for PipelineConfig {
    fn from(feed: &FeedConfig) -> Self {
        Self {
            reconnect_delay: feed.reconnect_delay(),
        }
    }
}

/// A freshly built snapshot on its way to the consumer
#[derive(Debug, Clone)]
pub struct PublishedTick {
    pub snapshot: Arc<OrderBookSnapshot>,
    pub timing: TickTiming,
}

/// Consumer end of the tick stream.
///
/// Latest-wins: a consumer that falls behind skips straight to the newest
/// tick, and the pipeline never waits on it.
pub struct TickReceiver {
    rx: watch::Receiver<Option<PublishedTick>>,
}

impl TickReceiver {
    /// Wait for a tick newer than the last one returned.
    /// `None` once the pipeline has stopped and every tick has been seen.
    pub async fn next(&mut self) -> Option<PublishedTick> {
        loop {
            self.rx.changed().await.ok()?;
            if let Some(tick) = self.rx.borrow_and_update().clone() {
                return Some(tick);
            }
        }
    }

    /// Newest tick if it has not been returned yet
    pub fn try_next(&mut self) -> Option<PublishedTick> {
        if !self.rx.has_changed().unwrap_or(false) {
            return None;
        }
        self.rx.borrow_and_update().clone()
    }
}

/// Why a connected session ended
enum SessionEnd {
    Shutdown,
    RemoteClosed,
    LinkError(SimulatorError),
}

pub struct IngestionPipeline<C: Connector> {
    connector: C,
    config: PipelineConfig,
    status_tx: watch::Sender<PipelineStatus>,
    tick_tx: watch::Sender<Option<PublishedTick>>,
}

/// Owner-side handle of a running pipeline.
///
/// Dropping the handle tears the pipeline down as well: the task sees the
/// shutdown channel close, releases the connection and stops retrying.
pub struct PipelineHandle {
    status_rx: watch::Receiver<PipelineStatus>,
    tick_rx: watch::Receiver<Option<PublishedTick>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl<C: Connector> IngestionPipeline<C> {
    /// Start the pipeline on the current tokio runtime.
    ///
    /// Returns the control handle and the receiving end of the tick stream.
    pub fn spawn(connector: C, config: PipelineConfig) -> (PipelineHandle, TickReceiver) {
        let (status_tx, status_rx) = watch::channel(PipelineStatus::default());
        let (tick_tx, tick_rx) = watch::channel(None);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let pipeline = IngestionPipeline {
            connector,
            config,
            status_tx,
            tick_tx,
        };
        let task = tokio::spawn(pipeline.run(shutdown_rx));

        let handle = PipelineHandle {
            status_rx,
            tick_rx: tick_rx.clone(),
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        };
        (handle, TickReceiver { rx: tick_rx })
    }

    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        info!(source = %self.connector.describe(), "🚀 Starting ingestion pipeline");

        loop {
            self.set_connection(ConnectionStatus::Connecting);
            self.status_tx.send_modify(|s| s.connect_attempts += 1);

            let connected = tokio::select! {
                _ = &mut shutdown => break,
                result = self.connector.connect() => result,
            };

            match connected {
                Ok(mut connection) => {
                    self.set_connection(ConnectionStatus::Connected);

                    match self.pump(&mut connection, &mut shutdown).await {
                        SessionEnd::Shutdown => {
                            connection.close().await;
                            break;
                        }
                        SessionEnd::RemoteClosed => {
                            warn!("⚠️ Market-data link closed by remote");
                            self.mark_disconnected(None);
                        }
                        SessionEnd::LinkError(e) => {
                            error!(error = %e, category = e.category(), "Market-data link failed");
                            self.mark_disconnected(Some(e));
                        }
                    }
                }
                Err(e) => {
                    error!(error = %e, category = e.category(), "Connect attempt failed");
                    self.status_tx.send_modify(|s| s.connection_failures += 1);
                    self.mark_disconnected(Some(e));
                }
            }

            info!(delay_secs = self.config.reconnect_delay.as_secs_f64(), "Reconnecting after fixed delay");
            tokio::select! {
                _ = &mut shutdown => break,
                _ = sleep(self.config.reconnect_delay) => {}
            }
        }

        self.set_connection(ConnectionStatus::Disconnected);
        info!("🛑 Ingestion pipeline stopped");
    }

    /// Read frames until the link ends or shutdown is requested
    async fn pump(
        &mut self,
        connection: &mut C::Connection,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> SessionEnd {
        loop {
            let next = tokio::select! {
                _ = &mut *shutdown => return SessionEnd::Shutdown,
                next = connection.next_message() => next,
            };
            let tick_start = Instant::now();

            match next {
                Some(Ok(text)) => self.process_message(&text, tick_start),
                Some(Err(e @ SimulatorError::MalformedTick(_))) => {
                    self.status_tx.send_modify(|s| s.messages_received += 1);
                    self.record_malformed(e);
                }
                Some(Err(e)) => return SessionEnd::LinkError(e),
                None => return SessionEnd::RemoteClosed,
            }
        }
    }

    /// Parse one frame and publish it, replacing whatever tick was current
    fn process_message(&self, text: &str, tick_start: Instant) {
        self.status_tx.send_modify(|s| s.messages_received += 1);

        let processing_start = Instant::now();
        let snapshot = match parse_message(text, Utc::now()) {
            Ok(FeedMessage::Book(snapshot)) => Arc::new(snapshot),
            Ok(FeedMessage::Ignored(kind)) => {
                debug!(kind = %kind, "Ignoring non-book message");
                return;
            }
            Err(e) => {
                self.record_malformed(e);
                return;
            }
        };
        let processing_end = Instant::now();

        // Never blocks: an unread tick is simply superseded
        self.tick_tx.send_replace(Some(PublishedTick {
            snapshot,
            timing: TickTiming {
                tick_start,
                processing_start,
                processing_end,
            },
        }));
        self.status_tx.send_modify(|s| s.snapshots_published += 1);
    }

    fn record_malformed(&self, error: SimulatorError) {
        warn!(error = %error, "Dropping malformed tick");
        self.status_tx.send_modify(|s| {
            s.error_count += 1;
            s.last_error = Some(error.to_string());
        });
    }

    fn mark_disconnected(&self, error: Option<SimulatorError>) {
        self.status_tx.send_modify(|s| {
            s.connection = ConnectionStatus::Disconnected;
            if let Some(e) = error {
                s.last_error = Some(e.to_string());
            }
        });
    }

    fn set_connection(&self, connection: ConnectionStatus) {
        self.status_tx.send_if_modified(|s| {
            if s.connection == connection {
                return false;
            }
            debug!(from = %s.connection, to = %connection, "Connection state change");
            s.connection = connection;
            true
        });
    }
}

impl PipelineHandle {
    /// Latest status; `changed()` on the receiver wakes on every update
    pub fn status(&self) -> watch::Receiver<PipelineStatus> {
        self.status_rx.clone()
    }

    pub fn current_status(&self) -> PipelineStatus {
        self.status_rx.borrow().clone()
    }

    /// Most recently published snapshot, if any
    pub fn latest_snapshot(&self) -> Option<Arc<OrderBookSnapshot>> {
        self.tick_rx
            .borrow()
            .as_ref()
            .map(|tick| Arc::clone(&tick.snapshot))
    }

    /// Stop the pipeline: closes the live connection (if any), cancels a
    /// pending reconnect and waits for the task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Ingestion task ended abnormally");
            }
        }
    }
}
