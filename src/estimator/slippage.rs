// Slippage estimation by walking the price ladder

use serde::{Deserialize, Serialize};

use crate::orderbook::{OrderBookSnapshot, PriceLevel};
use crate::types::Side;

/// Adverse price penalty applied to quantity the book cannot absorb
pub const LIQUIDITY_EXHAUSTION_PENALTY: f64 = 0.05;

/// Result of sweeping one side of the book
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillEstimate {
    pub side: Side,
    pub requested_quantity: f64,   // Base-asset units
    pub book_quantity: f64,        // Portion filled from resting levels
    pub total_cost: f64,           // Quote-asset units, penalty included
    pub average_price: f64,
    pub exhausted: bool,           // Book ran out before the order filled
}

/// Sweep `levels` best-first for `quantity` base units.
///
/// Quantity left after the last level is priced at that level's price moved
/// 5% against the taker. With no levels at all, `fallback_price` stands in
/// for the last available price.
pub fn walk_book(levels: &[PriceLevel], side: Side, quantity: f64, fallback_price: f64) -> FillEstimate {
    let mut remaining = quantity;
    let mut total_cost = 0.0;
    let mut last_price = fallback_price;

    for level in levels {
        if remaining <= 0.0 {
            break;
        }
        let take = remaining.min(level.quantity);
        total_cost += take * level.price;
        remaining -= take;
        last_price = level.price;
    }

    let exhausted = remaining > 0.0;
    if exhausted {
        let penalty = match side {
            Side::Buy => 1.0 + LIQUIDITY_EXHAUSTION_PENALTY,
            Side::Sell => 1.0 - LIQUIDITY_EXHAUSTION_PENALTY,
        };
        total_cost += remaining * last_price * penalty;
    }

    let average_price = if quantity > 0.0 { total_cost / quantity } else { 0.0 };

    FillEstimate {
        side,
        requested_quantity: quantity,
        book_quantity: quantity - remaining.max(0.0),
        total_cost,
        average_price,
        exhausted,
    }
}

/// Slippage for a market order of `notional` quote units on one side.
///
/// Returns a non-negative fraction of the reference price; a favorable fill
/// reports zero. An empty book or a non-positive notional yields zero.
pub fn side_slippage(snapshot: &OrderBookSnapshot, side: Side, notional: f64) -> f64 {
    match estimate_fill(snapshot, side, notional) {
        Some((fill, mid)) => {
            let slippage = match side {
                Side::Buy => (fill.average_price - mid) / mid,
                Side::Sell => (mid - fill.average_price) / mid,
            };
            slippage.max(0.0)
        }
        None => 0.0,
    }
}

/// Sweep result plus the reference price it was measured against
pub fn estimate_fill(snapshot: &OrderBookSnapshot, side: Side, notional: f64) -> Option<(FillEstimate, f64)> {
    let mid = snapshot.reference_price()?;
    if !(notional > 0.0) || mid <= 0.0 {
        return None;
    }

    let base_quantity = notional / mid;
    let fill = walk_book(snapshot.levels_for(side), side, base_quantity, mid);
    Some((fill, mid))
}

/// Mean of buy-side and sell-side slippage (a round trip)
pub fn round_trip_slippage(snapshot: &OrderBookSnapshot, notional: f64) -> f64 {
    let buy = side_slippage(snapshot, Side::Buy, notional);
    let sell = side_slippage(snapshot, Side::Sell, notional);
    (buy + sell) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn levels(pairs: &[(f64, f64)]) -> Vec<PriceLevel> {
        pairs.iter().map(|&(price, quantity)| PriceLevel { price, quantity }).collect()
    }

    #[test]
    fn test_walk_within_top_level() {
        let asks = levels(&[(101.0, 5.0), (102.0, 5.0)]);
        let fill = walk_book(&asks, Side::Buy, 2.0, 100.0);
        assert!(!fill.exhausted);
        assert_eq!(fill.total_cost, 202.0);
        assert_eq!(fill.average_price, 101.0);
    }

    #[test]
    fn test_walk_across_levels() {
        let asks = levels(&[(101.0, 1.0), (102.0, 1.0)]);
        let fill = walk_book(&asks, Side::Buy, 2.0, 100.0);
        assert!((fill.average_price - 101.5).abs() < 1e-12);
        assert_eq!(fill.book_quantity, 2.0);
    }

    #[test]
    fn test_exhaustion_penalty_is_adverse_per_side() {
        let asks = levels(&[(101.0, 1.0)]);
        let fill = walk_book(&asks, Side::Buy, 2.0, 100.0);
        assert!(fill.exhausted);
        // 101 + 101 * 1.05
        assert!((fill.total_cost - 207.05).abs() < 1e-9);

        let bids = levels(&[(99.0, 1.0)]);
        let fill = walk_book(&bids, Side::Sell, 2.0, 100.0);
        // 99 + 99 * 0.95
        assert!((fill.total_cost - 193.05).abs() < 1e-9);
    }

    #[test]
    fn test_empty_side_uses_reference_with_penalty() {
        let book = OrderBookSnapshot::from_levels(vec![(100.0, 1.0)], vec![], Utc::now()).unwrap();
        let buy = side_slippage(&book, Side::Buy, 50.0);
        assert!((buy - LIQUIDITY_EXHAUSTION_PENALTY).abs() < 1e-12);
    }

    #[test]
    fn test_empty_book_and_zero_notional_have_no_slippage() {
        let empty = OrderBookSnapshot::empty(Utc::now());
        assert_eq!(round_trip_slippage(&empty, 100.0), 0.0);

        let book = OrderBookSnapshot::from_levels(vec![(99.0, 1.0)], vec![(101.0, 1.0)], Utc::now()).unwrap();
        assert_eq!(round_trip_slippage(&book, 0.0), 0.0);
        assert_eq!(round_trip_slippage(&book, f64::NAN), 0.0);
    }
}
