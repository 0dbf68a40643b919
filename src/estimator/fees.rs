// Fee tier schedule

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Exchange fee tier. Higher tiers (more volume) pay less.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum FeeTier {
    #[default]
    Tier1,
    Tier2,
    Tier3,
    Tier4,
    Tier5,
}

impl FeeTier {
    pub const ALL: [FeeTier; 5] = [
        FeeTier::Tier1,
        FeeTier::Tier2,
        FeeTier::Tier3,
        FeeTier::Tier4,
        FeeTier::Tier5,
    ];

    /// Taker fee as a fraction of notional
    pub fn rate(self) -> f64 {
        match self {
            FeeTier::Tier1 => 0.0010,   // 0.10%
            FeeTier::Tier2 => 0.0008,   // 0.08%
            FeeTier::Tier3 => 0.0006,   // 0.06%
            FeeTier::Tier4 => 0.0004,   // 0.04%
            FeeTier::Tier5 => 0.0002,   // 0.02%
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeeTier::Tier1 => "tier1",
            FeeTier::Tier2 => "tier2",
            FeeTier::Tier3 => "tier3",
            FeeTier::Tier4 => "tier4",
            FeeTier::Tier5 => "tier5",
        }
    }

    /// Strict lookup: `None` for anything that is not a known tier.
    ///
    /// Accepts "tier3", "Tier 3", "tier_3" and plain "3".
    pub fn from_label(label: &str) -> Option<FeeTier> {
        let normalized: String = label
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        let digit = normalized.strip_prefix("tier").unwrap_or(&normalized);

        match digit {
            "1" => Some(FeeTier::Tier1),
            "2" => Some(FeeTier::Tier2),
            "3" => Some(FeeTier::Tier3),
            "4" => Some(FeeTier::Tier4),
            "5" => Some(FeeTier::Tier5),
            _ => None,
        }
    }

    /// Lenient lookup: unknown labels fall back to the highest-fee tier
    pub fn from_label_or_default(label: &str) -> FeeTier {
        FeeTier::from_label(label).unwrap_or_else(|| {
            warn!(tier = %label, "unrecognized fee tier, falling back to tier1");
            FeeTier::Tier1
        })
    }
}

impl FromStr for FeeTier {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FeeTier::from_label_or_default(s))
    }
}

impl From<String> for FeeTier {
    fn from(label: String) -> Self {
        FeeTier::from_label_or_default(&label)
    }
}

impl fmt::Display for FeeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fee cost as a fraction of notional (flat, not scaled by fill fraction)
pub fn fee_cost(tier: FeeTier) -> f64 {
    tier.rate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_strictly_decrease() {
        let rates: Vec<f64> = FeeTier::ALL.iter().map(|t| t.rate()).collect();
        assert!(rates.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(fee_cost(FeeTier::Tier1), 0.001);
    }

    #[test]
    fn test_label_variants() {
        assert_eq!(FeeTier::from_label("tier3"), Some(FeeTier::Tier3));
        assert_eq!(FeeTier::from_label("Tier 4"), Some(FeeTier::Tier4));
        assert_eq!(FeeTier::from_label("5"), Some(FeeTier::Tier5));
        assert_eq!(FeeTier::from_label("vip"), None);
    }

    #[test]
    fn test_unknown_tier_falls_back_to_highest_fee() {
        let tier: FeeTier = "platinum".parse().unwrap();
        assert_eq!(tier, FeeTier::Tier1);
    }

    #[test]
    fn test_serde_roundtrip_uses_labels() {
        let json = serde_json::to_string(&FeeTier::Tier2).unwrap();
        assert_eq!(json, "\"tier2\"");
        let tier: FeeTier = serde_json::from_str("\"nonsense\"").unwrap();
        assert_eq!(tier, FeeTier::Tier1);
    }
}
