// Run command - stream ticks through the pipeline into the controller
use std::time::Duration;
use tracing::{info, warn};
use trade_simulator::{
    Config, Connector, FeeTier, IngestionPipeline, MockConnector, PipelineConfig,
    SimulationController, SimulatorResult, TradingMetricsResult, WebSocketConnector,
};

pub struct RunOptions {
    pub mock: bool,
    pub quantity: Option<f64>,
    pub volatility: Option<f64>,
    pub fee_tier: Option<FeeTier>,
    pub manual: bool,
    pub max_ticks: Option<u64>,
}

pub async fn run_simulation(config: Config, options: RunOptions) -> SimulatorResult<()> {
    let mut params = config.simulation_params();
    if let Some(quantity) = options.quantity {
        params.quantity = quantity;
    }
    if let Some(volatility) = options.volatility {
        params.volatility = volatility;
    }
    if let Some(tier) = options.fee_tier {
        params.fee_tier = tier;
    }

    let auto_run = config.simulation.auto_run && !options.manual;
    info!(
        exchange = %config.feed.exchange,
        symbol = %config.feed.symbol,
        quantity = params.quantity,
        volatility = params.volatility,
        fee_tier = %params.fee_tier,
        auto_run,
        "📊 Simulation parameters"
    );

    let controller = SimulationController::new(params, auto_run);
    let pipeline_config = PipelineConfig::from(&config.feed);

    if options.mock {
        info!("🧪 Using mock order book feed");
        drive(MockConnector::default(), pipeline_config, controller, &config, options.max_ticks).await
    } else {
        let connector = WebSocketConnector::new(config.feed.ws_url.clone())
            .with_subscription(config.feed.subscribe_message.clone());
        drive(connector, pipeline_config, controller, &config, options.max_ticks).await
    }
}

async fn drive<C: Connector>(
    connector: C,
    pipeline_config: PipelineConfig,
    mut controller: SimulationController,
    config: &Config,
    max_ticks: Option<u64>,
) -> SimulatorResult<()> {
    let (handle, mut ticks) = IngestionPipeline::spawn(connector, pipeline_config);
    let mut status = handle.status();
    let log_every = config.logging.log_every_n_ticks.max(1);
    let mut applied: u64 = 0;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut heartbeat = tokio::time::interval(Duration::from_secs(30));

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Ctrl-C received, shutting down");
                break;
            }
            tick = ticks.next() => {
                let Some(tick) = tick else { break };
                controller.apply_tick(tick);
                applied += 1;

                if applied % log_every == 0 {
                    let result = match controller.latest_result() {
                        Some(result) if controller.auto_run() => result,
                        // Manual mode: recompute on demand at each report
                        _ => controller.recompute(),
                    };
                    log_result(&result);
                    if let Some(latency) = controller.latest_latency() {
                        info!(
                            processing_us = latency.data_processing_latency.as_micros() as u64,
                            ui_update_us = latency.ui_update_latency.as_micros() as u64,
                            end_to_end_us = latency.end_to_end_latency.as_micros() as u64,
                            "⏱️  Tick latency"
                        );
                    }
                }

                if max_ticks.is_some_and(|max| applied >= max) {
                    info!(ticks = applied, "Tick limit reached");
                    break;
                }
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = status.borrow_and_update().clone();
                match &current.last_error {
                    Some(err) if !current.is_connected() => {
                        warn!(status = %current.connection, error = %err, "🔌 Connection status")
                    }
                    _ => info!(status = %current.connection, "🔌 Connection status"),
                }
            }
            _ = heartbeat.tick() => {
                let current = handle.current_status();
                info!(
                    status = %current.connection,
                    messages = current.messages_received,
                    snapshots = current.snapshots_published,
                    malformed = current.error_count,
                    "💓 Heartbeat"
                );
            }
        }
    }

    handle.shutdown().await;

    let summary = controller.latency_summary();
    info!(
        ticks = applied,
        samples = summary.samples,
        mean_processing_us = summary.mean_processing.as_micros() as u64,
        mean_ui_update_us = summary.mean_ui_update.as_micros() as u64,
        p50_end_to_end_us = summary.p50_end_to_end.as_micros() as u64,
        p99_end_to_end_us = summary.p99_end_to_end.as_micros() as u64,
        max_end_to_end_us = summary.max_end_to_end.as_micros() as u64,
        "📈 Latency summary"
    );
    Ok(())
}

fn log_result(result: &TradingMetricsResult) {
    info!(
        "💰 {:.2} {} of {}: slippage {:.4}% | fees {:.4}% | impact {:.4}% | net {:.4}% ({:.4} {}) | maker {:.1}% / taker {:.1}%",
        result.quantity,
        result.quote_asset,
        result.base_asset,
        result.slippage * 100.0,
        result.fees * 100.0,
        result.market_impact * 100.0,
        result.net_cost * 100.0,
        result.net_cost_notional(),
        result.quote_asset,
        result.maker_proportion * 100.0,
        result.taker_proportion * 100.0,
    );
}
