// Estimate command - one-shot cost estimate from a saved message
use chrono::Utc;
use std::fs;
use tracing::info;
use trade_simulator::{
    estimate_costs, parse_message, Config, FeeTier, FeedMessage, SimulatorError, SimulatorResult,
};

pub fn estimate_from_file(
    config: &Config,
    path: &str,
    quantity: Option<f64>,
    volatility: Option<f64>,
    fee_tier: Option<FeeTier>,
) -> SimulatorResult<()> {
    let text = fs::read_to_string(path)?;
    let snapshot = match parse_message(&text, Utc::now())? {
        FeedMessage::Book(snapshot) => snapshot,
        FeedMessage::Ignored(kind) => {
            return Err(SimulatorError::invalid_parameter(
                "snapshot",
                format!("{} holds a '{}' message, not an order book", path, kind),
            ));
        }
    };

    let mut params = config.simulation_params();
    params.quantity = quantity.unwrap_or(params.quantity);
    params.volatility = volatility.unwrap_or(params.volatility);
    params.fee_tier = fee_tier.unwrap_or(params.fee_tier);

    let (bids, asks) = snapshot.depth();
    info!("📖 Loaded {} bid / {} ask levels from {}", bids, asks, path);

    let result = estimate_costs(&snapshot, &params);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
