// Maker/taker split via a logistic heuristic

use serde::{Deserialize, Serialize};

use crate::estimator::market_impact::normalized_spread;
use crate::orderbook::OrderBookSnapshot;

const MAKER_BIAS: f64 = 1.5;
const VOLATILITY_WEIGHT: f64 = 2.0;
const VOLATILITY_SCALE: f64 = 100.0;
const SPREAD_SCALE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MakerTakerSplit {
    pub maker: f64,
    pub taker: f64,
}

impl MakerTakerSplit {
    /// Used whenever the book cannot inform the split
    pub const EVEN: MakerTakerSplit = MakerTakerSplit { maker: 0.5, taker: 0.5 };

    fn from_maker(maker: f64) -> Self {
        Self { maker, taker: 1.0 - maker }
    }
}

/// Predicted share of the order filled passively vs. aggressively.
///
/// Higher volatility pushes towards taking, a wider spread towards making.
pub fn maker_taker_split(snapshot: &OrderBookSnapshot, volatility: f64) -> MakerTakerSplit {
    let Some(spread) = normalized_spread(snapshot) else {
        return MakerTakerSplit::EVEN;
    };

    let volatility_factor = volatility / VOLATILITY_SCALE;
    let spread_factor = (spread * SPREAD_SCALE).min(1.0);
    let z = MAKER_BIAS - VOLATILITY_WEIGHT * volatility_factor + spread_factor;

    MakerTakerSplit::from_maker(logistic(z))
}

fn logistic(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn book(bid: f64, ask: f64) -> OrderBookSnapshot {
        OrderBookSnapshot::from_levels(vec![(bid, 1.0)], vec![(ask, 1.0)], Utc::now()).unwrap()
    }

    #[test]
    fn test_empty_side_is_even_split() {
        let book = OrderBookSnapshot::from_levels(vec![], vec![(100.0, 1.0)], Utc::now()).unwrap();
        assert_eq!(maker_taker_split(&book, 30.0), MakerTakerSplit::EVEN);
    }

    #[test]
    fn test_known_value() {
        // Zero spread, volatility 75: z = 1.5 - 1.5 + 0 = 0
        let split = maker_taker_split(&book(100.0, 100.0), 75.0);
        assert!((split.maker - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_volatility_shifts_towards_taker() {
        let calm = maker_taker_split(&book(99.9, 100.1), 10.0);
        let wild = maker_taker_split(&book(99.9, 100.1), 90.0);
        assert!(wild.taker > calm.taker);
        assert!((wild.maker + wild.taker - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_spread_factor_saturates() {
        let wide = maker_taker_split(&book(90.0, 110.0), 50.0);
        let wider = maker_taker_split(&book(80.0, 120.0), 50.0);
        assert_eq!(wide, wider);
    }
}
