//! Cost estimation for a hypothetical market order
//!
//! Every function here is pure: the same snapshot and parameters always give
//! bit-identical results, and degenerate books (one or both sides empty) map to
//! documented fallbacks rather than errors.

pub mod fees;
pub mod slippage;
pub mod market_impact;
pub mod maker_taker;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::orderbook::OrderBookSnapshot;

pub use fees::{fee_cost, FeeTier};
pub use maker_taker::{maker_taker_split, MakerTakerSplit};
pub use market_impact::{market_impact, normalized_spread, MAX_MARKET_IMPACT, MIN_MARKET_IMPACT};
pub use slippage::{round_trip_slippage, side_slippage, walk_book, FillEstimate, LIQUIDITY_EXHAUSTION_PENALTY};

/// Caller-supplied inputs for one estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub quantity: f64,          // Notional in quote currency
    pub volatility: f64,        // 0..=100
    pub fee_tier: FeeTier,
    pub base_asset: String,
    pub quote_asset: String,
}

impl SimulationParams {
    pub fn new(quantity: f64, volatility: f64, fee_tier: FeeTier) -> Self {
        Self {
            quantity,
            volatility,
            fee_tier,
            base_asset: "BTC".to_string(),
            quote_asset: "USDT".to_string(),
        }
    }

    pub fn with_assets(mut self, base: impl Into<String>, quote: impl Into<String>) -> Self {
        self.base_asset = base.into();
        self.quote_asset = quote.into();
        self
    }

    /// Copy with out-of-range inputs replaced by safe defaults.
    ///
    /// Non-finite or negative quantity becomes 0; volatility is clamped to
    /// 0..=100 with NaN mapped to 0. Silent: callers that own the params
    /// decide whether a change is worth logging.
    pub fn sanitized(&self) -> Self {
        let mut params = self.clone();

        if !params.quantity.is_finite() || params.quantity < 0.0 {
            params.quantity = 0.0;
        }

        if params.volatility.is_nan() {
            params.volatility = 0.0;
        } else {
            params.volatility = params.volatility.clamp(0.0, 100.0);
        }

        params
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self::new(100.0, 50.0, FeeTier::Tier1)
    }
}

/// Cost breakdown handed to the presentation layer.
///
/// All costs are fractions of notional; `net_cost` is always
/// `slippage + fees + market_impact`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingMetricsResult {
    pub slippage: f64,
    pub fees: f64,
    pub market_impact: f64,
    pub net_cost: f64,
    pub maker_proportion: f64,
    pub taker_proportion: f64,
    pub base_asset: String,
    pub quote_asset: String,
    pub quantity: f64,
    pub mid_price: Option<f64>,
    pub snapshot_time: DateTime<Utc>,
}

impl TradingMetricsResult {
    /// Net cost in quote-currency units
    pub fn net_cost_notional(&self) -> f64 {
        self.net_cost * self.quantity
    }
}

/// Estimate the full cost of a market order of `params.quantity` against `snapshot`
pub fn estimate_costs(snapshot: &OrderBookSnapshot, params: &SimulationParams) -> TradingMetricsResult {
    let params = params.sanitized();

    let slippage = round_trip_slippage(snapshot, params.quantity);
    let fees = fee_cost(params.fee_tier);
    let market_impact = market_impact(snapshot, params.quantity, params.volatility);
    let split = maker_taker_split(snapshot, params.volatility);

    TradingMetricsResult {
        slippage,
        fees,
        market_impact,
        net_cost: slippage + fees + market_impact,
        maker_proportion: split.maker,
        taker_proportion: split.taker,
        base_asset: params.base_asset,
        quote_asset: params.quote_asset,
        quantity: params.quantity,
        mid_price: snapshot.mid_price(),
        snapshot_time: snapshot.timestamp(),
    }
}
