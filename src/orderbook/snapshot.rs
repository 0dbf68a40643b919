// Order Book Snapshot
// Normalized, immutable view of both sides of the book at one point in time

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{SimulatorError, SimulatorResult};
use crate::types::Side;

/// A single price level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub quantity: f64,
}

/// Wrapper for f64 to use as BTreeMap key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedFloat(pub f64);

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Full book state for one tick.
///
/// Bids are strictly descending and asks strictly ascending by price, with
/// unique prices on each side. An empty side is legal and means "no liquidity".
/// Snapshots are never patched in place: every tick builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
    timestamp: DateTime<Utc>,
}

impl OrderBookSnapshot {
    /// Book with no liquidity on either side
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            bids: Vec::new(),
            asks: Vec::new(),
            timestamp,
        }
    }

    /// Build a snapshot from numeric (price, quantity) pairs in any order.
    ///
    /// Duplicate prices resolve to the last pair seen. Zero-quantity levels
    /// are dropped since they carry no liquidity.
    pub fn from_levels(
        bids: Vec<(f64, f64)>,
        asks: Vec<(f64, f64)>,
        timestamp: DateTime<Utc>,
    ) -> SimulatorResult<Self> {
        let bids = normalize_side(bids, Side::Sell)?;
        let asks = normalize_side(asks, Side::Buy)?;
        Ok(Self { bids, asks, timestamp })
    }

    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Levels an order of `side` executes against (asks for buys, bids for sells)
    pub fn levels_for(&self, side: Side) -> &[PriceLevel] {
        match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        }
    }

    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    pub fn has_both_sides(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Get mid price (requires both sides)
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / 2.0),
            _ => None,
        }
    }

    /// Mid price when both sides exist, otherwise the best price of whichever side does
    pub fn reference_price(&self) -> Option<f64> {
        self.mid_price()
            .or_else(|| self.best_bid().map(|l| l.price))
            .or_else(|| self.best_ask().map(|l| l.price))
    }

    /// Get bid-ask spread
    pub fn spread(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Total quantity resting within `band` (fraction of `center`) on both sides
    pub fn depth_within(&self, center: f64, band: f64) -> f64 {
        let floor = center * (1.0 - band);
        let ceiling = center * (1.0 + band);

        let bid_depth: f64 = self.bids
            .iter()
            .take_while(|level| level.price >= floor)
            .map(|level| level.quantity)
            .sum();

        let ask_depth: f64 = self.asks
            .iter()
            .take_while(|level| level.price <= ceiling)
            .map(|level| level.quantity)
            .sum();

        bid_depth + ask_depth
    }

    /// Total quantity on one side
    pub fn total_quantity(&self, side: Side) -> f64 {
        self.levels_for(side).iter().map(|level| level.quantity).sum()
    }

    /// Get order book depth (number of price levels)
    pub fn depth(&self) -> (usize, usize) {
        (self.bids.len(), self.asks.len())
    }
}

/// Sort one side best-first and collapse duplicate prices.
///
/// `taker` is the side that consumes these levels: asks are walked by buyers
/// (ascending), bids by sellers (descending).
fn normalize_side(levels: Vec<(f64, f64)>, taker: Side) -> SimulatorResult<Vec<PriceLevel>> {
    let mut book: BTreeMap<OrderedFloat, f64> = BTreeMap::new();

    for (price, quantity) in levels {
        if !price.is_finite() || price <= 0.0 {
            return Err(SimulatorError::malformed(format!("invalid price level {}", price)));
        }
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(SimulatorError::malformed(format!(
                "invalid quantity {} at price {}",
                quantity, price
            )));
        }
        // Last write wins on duplicate prices
        book.insert(OrderedFloat(price), quantity);
    }

    let levels = book
        .into_iter()
        .filter(|(_, quantity)| *quantity > 0.0)
        .map(|(price, quantity)| PriceLevel { price: price.0, quantity });

    Ok(match taker {
        Side::Buy => levels.collect(),
        Side::Sell => levels.rev().collect(),
    })
}
