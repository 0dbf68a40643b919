// Market impact heuristic (Almgren-Chriss inspired, not calibrated)
//
//   impact = sqrt(spread/mid * volatility/1000) * q * sqrt(q),  q = (notional/mid) / depth

use crate::orderbook::OrderBookSnapshot;

/// Band around mid, as a fraction, counted as usable depth
pub const DEPTH_BAND: f64 = 0.01;
/// Divisor turning the 0..=100 volatility input into the impact volatility factor
pub const IMPACT_VOLATILITY_SCALE: f64 = 1000.0;
/// Sanity bounds on the reported impact (1 bp to 5%)
pub const MIN_MARKET_IMPACT: f64 = 0.0001;
pub const MAX_MARKET_IMPACT: f64 = 0.05;

/// Spread as a fraction of mid. `None` unless both sides are populated.
pub fn normalized_spread(snapshot: &OrderBookSnapshot) -> Option<f64> {
    let mid = snapshot.mid_price()?;
    let spread = snapshot.spread()?;
    if mid <= 0.0 {
        return None;
    }
    // A crossed book would otherwise feed a negative value into sqrt
    Some((spread / mid).max(0.0))
}

/// Estimated price impact as a fraction of notional.
///
/// Zero when either side is empty; otherwise clamped to
/// [`MIN_MARKET_IMPACT`, `MAX_MARKET_IMPACT`].
pub fn market_impact(snapshot: &OrderBookSnapshot, notional: f64, volatility: f64) -> f64 {
    let (Some(mid), Some(spread)) = (snapshot.mid_price(), normalized_spread(snapshot)) else {
        return 0.0;
    };

    let depth = snapshot.depth_within(mid, DEPTH_BAND);
    let normalized_quantity = if depth > 0.0 {
        (notional.max(0.0) / mid) / depth
    } else {
        0.0
    };

    let volatility_factor = volatility.max(0.0) / IMPACT_VOLATILITY_SCALE;
    let impact_factor = (spread * volatility_factor).sqrt();
    let impact = impact_factor * normalized_quantity * normalized_quantity.sqrt();

    if impact.is_finite() {
        impact.clamp(MIN_MARKET_IMPACT, MAX_MARKET_IMPACT)
    } else {
        MAX_MARKET_IMPACT
    }
}
