// Common test utilities and helpers
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch, Mutex as AsyncMutex};
use tokio::time::Instant;
use trade_simulator::{
    Config, Connector, FeeTier, FeedConnection, OrderBookSnapshot, PipelineStatus,
    SimulationParams, SimulatorError, SimulatorResult,
};

pub const SCENARIO_A_BIDS: [(f64, f64); 2] = [(19500.0, 2.5), (19450.0, 3.2)];
pub const SCENARIO_A_ASKS: [(f64, f64); 2] = [(19550.0, 1.9), (19600.0, 2.8)];

/// The two-level BTC book used across the estimator tests
pub fn scenario_a_snapshot() -> OrderBookSnapshot {
    OrderBookSnapshot::from_levels(
        SCENARIO_A_BIDS.to_vec(),
        SCENARIO_A_ASKS.to_vec(),
        Utc.with_ymd_and_hms(2025, 5, 4, 10, 39, 13).unwrap(),
    )
    .expect("scenario A book is well formed")
}

/// Same book as a raw feed message
pub fn scenario_a_message() -> String {
    book_message(&SCENARIO_A_BIDS, &SCENARIO_A_ASKS)
}

/// Build a typed snapshot message with string-encoded levels, the way the feed sends them
pub fn book_message(bids: &[(f64, f64)], asks: &[(f64, f64)]) -> String {
    let encode = |levels: &[(f64, f64)]| -> serde_json::Value {
        levels
            .iter()
            .map(|(price, qty)| serde_json::json!([price.to_string(), qty.to_string()]))
            .collect()
    };

    serde_json::json!({
        "type": "snapshot",
        "data": {
            "timestamp": "2025-05-04T10:39:13Z",
            "exchange": "OKX",
            "symbol": "BTC-USDT-SWAP",
            "bids": encode(bids),
            "asks": encode(asks),
        }
    })
    .to_string()
}

pub fn scenario_a_params() -> SimulationParams {
    SimulationParams::new(100.0, 50.0, FeeTier::Tier1)
}

pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.feed.ws_url = "wss://feed.test/ws/l2-orderbook/okx/BTC-USDT-SWAP".to_string();
    config.feed.reconnect_delay_secs = 5;
    config.simulation.quantity = 250.0;
    config.simulation.volatility = 20.0;
    config.simulation.fee_tier = FeeTier::Tier3;
    config
}

/// Wait until the pipeline status satisfies `predicate`
pub async fn wait_for_status<F>(status: &mut watch::Receiver<PipelineStatus>, predicate: F) -> PipelineStatus
where
    F: FnMut(&PipelineStatus) -> bool,
{
    status
        .wait_for(predicate)
        .await
        .expect("pipeline dropped its status sender")
        .clone()
}

/// What the next connect attempt should do
enum Session {
    Accept(mpsc::UnboundedReceiver<String>),
    Refuse(String),
}

/// In-memory connector driven by the test.
///
/// Each connect attempt takes the next queued session; with none queued the
/// attempt waits until the test queues one.
pub struct ScriptedConnector {
    sessions: AsyncMutex<mpsc::UnboundedReceiver<Session>>,
    connect_times: Arc<Mutex<Vec<Instant>>>,
    closed: Arc<AtomicUsize>,
}

/// Test-side control for a [`ScriptedConnector`]
#[derive(Clone)]
pub struct ScriptControl {
    sessions_tx: mpsc::UnboundedSender<Session>,
    connect_times: Arc<Mutex<Vec<Instant>>>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new() -> (Self, ScriptControl) {
        let (sessions_tx, sessions_rx) = mpsc::unbounded_channel();
        let connect_times = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicUsize::new(0));

        let connector = Self {
            sessions: AsyncMutex::new(sessions_rx),
            connect_times: Arc::clone(&connect_times),
            closed: Arc::clone(&closed),
        };
        let control = ScriptControl {
            sessions_tx,
            connect_times,
            closed,
        };
        (connector, control)
    }
}

impl ScriptControl {
    /// Queue a session that accepts; dropping the returned sender ends it
    /// the way an abrupt remote close would.
    pub fn accept(&self) -> mpsc::UnboundedSender<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.sessions_tx
            .send(Session::Accept(rx))
            .expect("connector dropped");
        tx
    }

    /// Queue a connect attempt that fails
    pub fn refuse(&self, reason: &str) {
        self.sessions_tx
            .send(Session::Refuse(reason.to_string()))
            .expect("connector dropped");
    }

    /// When each connect attempt started
    pub fn connect_times(&self) -> Vec<Instant> {
        self.connect_times.lock().unwrap().clone()
    }

    /// Number of connections the pipeline closed itself
    pub fn closed_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct ScriptedConnection {
    messages: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicUsize>,
    done: AtomicBool,
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Connection = ScriptedConnection;

    async fn connect(&self) -> SimulatorResult<ScriptedConnection> {
        self.connect_times.lock().unwrap().push(Instant::now());

        let mut sessions = self.sessions.lock().await;
        match sessions.recv().await {
            Some(Session::Accept(messages)) => Ok(ScriptedConnection {
                messages,
                closed: Arc::clone(&self.closed),
                done: AtomicBool::new(false),
            }),
            Some(Session::Refuse(reason)) => Err(SimulatorError::Connection(reason)),
            None => Err(SimulatorError::Connection("script exhausted".to_string())),
        }
    }

    fn describe(&self) -> String {
        "scripted://test".to_string()
    }
}

#[async_trait]
impl FeedConnection for ScriptedConnection {
    async fn next_message(&mut self) -> Option<SimulatorResult<String>> {
        self.messages.recv().await.map(Ok)
    }

    async fn close(&mut self) {
        if !self.done.swap(true, Ordering::SeqCst) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
