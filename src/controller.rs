// Simulation controller
// Holds the current snapshot and parameters and decides when to recompute

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::estimator::{estimate_costs, SimulationParams, TradingMetricsResult};
use crate::orderbook::OrderBookSnapshot;
use crate::pipeline::{LatencyRecord, LatencyStats, LatencySummary, PublishedTick};

/// Recomputes cost estimates on demand or, with auto-run on, whenever the
/// snapshot or parameters change.
///
/// Both inputs are replaced whole, never edited in place, so every estimate
/// reads a consistent snapshot/params pair. Results go out on a watch channel.
#[derive(Debug)]
pub struct SimulationController {
    snapshot: Option<Arc<OrderBookSnapshot>>,
    params: SimulationParams,
    auto_run: bool,
    latency: LatencyStats,
    results_tx: watch::Sender<Option<TradingMetricsResult>>,
}

impl SimulationController {
    pub fn new(params: SimulationParams, auto_run: bool) -> Self {
        let (results_tx, _) = watch::channel(None);
        Self {
            snapshot: None,
            params: sanitize(params),
            auto_run,
            latency: LatencyStats::default(),
            results_tx,
        }
    }

    /// Receiver for every published estimate
    pub fn subscribe(&self) -> watch::Receiver<Option<TradingMetricsResult>> {
        self.results_tx.subscribe()
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn snapshot(&self) -> Option<&Arc<OrderBookSnapshot>> {
        self.snapshot.as_ref()
    }

    pub fn auto_run(&self) -> bool {
        self.auto_run
    }

    pub fn set_auto_run(&mut self, enabled: bool) {
        self.auto_run = enabled;
    }

    pub fn latest_result(&self) -> Option<TradingMetricsResult> {
        self.results_tx.borrow().clone()
    }

    pub fn latest_latency(&self) -> Option<&LatencyRecord> {
        self.latency.latest()
    }

    pub fn latency_summary(&self) -> LatencySummary {
        self.latency.summary()
    }

    /// Replace the parameters; recomputes when auto-run is on.
    ///
    /// Out-of-range values are corrected once here, so later estimates
    /// run on the stored copy without re-checking.
    pub fn set_params(&mut self, params: SimulationParams) -> Option<TradingMetricsResult> {
        self.params = sanitize(params);
        self.auto_recompute()
    }

    /// Replace the snapshot; recomputes when auto-run is on
    pub fn update_snapshot(&mut self, snapshot: Arc<OrderBookSnapshot>) -> Option<TradingMetricsResult> {
        self.snapshot = Some(snapshot);
        self.auto_recompute()
    }

    /// Apply a tick from the pipeline and close out its latency measurement.
    ///
    /// The render stage covers swapping the snapshot in and, with auto-run on,
    /// the recompute and publish.
    pub fn apply_tick(&mut self, tick: PublishedTick) -> LatencyRecord {
        let render = tick.timing.begin_render();
        self.update_snapshot(tick.snapshot);
        let record = render.finish();

        self.latency.record(record);
        record
    }

    /// Estimate against the current inputs and publish the result.
    ///
    /// Without a snapshot yet, estimates against an empty book.
    pub fn recompute(&mut self) -> TradingMetricsResult {
        let result = match &self.snapshot {
            Some(snapshot) => estimate_costs(snapshot, &self.params),
            None => estimate_costs(&OrderBookSnapshot::empty(Utc::now()), &self.params),
        };

        debug!(
            net_cost = result.net_cost,
            slippage = result.slippage,
            impact = result.market_impact,
            "Recomputed cost estimate"
        );
        self.results_tx.send_replace(Some(result.clone()));
        result
    }

    fn auto_recompute(&mut self) -> Option<TradingMetricsResult> {
        self.auto_run.then(|| self.recompute())
    }
}

fn sanitize(params: SimulationParams) -> SimulationParams {
    let clean = params.sanitized();
    if clean != params {
        warn!(
            quantity = params.quantity,
            volatility = params.volatility,
            "⚠️ Simulation parameters out of range, using quantity={} volatility={}",
            clean.quantity,
            clean.volatility
        );
    }
    clean
}
