// Trade Simulator CLI
// Live cost estimation against a streaming order book

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use trade_simulator::{Config, ConfigError, FeeTier, SimulatorError};

#[path = "../cli/run_commands.rs"]
mod run_commands;
#[path = "../cli/estimate_commands.rs"]
mod estimate_commands;

#[derive(Parser)]
#[command(name = "trade-sim")]
#[command(version)]
#[command(about = "Market order cost estimator with tick latency tracking", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Stream the order book and estimate costs on every tick
    Run {
        /// Use the built-in random-walk feed instead of the WebSocket
        #[arg(long)]
        mock: bool,

        /// Order notional in quote currency
        #[arg(short, long)]
        quantity: Option<f64>,

        /// Volatility estimate (0-100)
        #[arg(long)]
        volatility: Option<f64>,

        /// Fee tier (tier1 .. tier5)
        #[arg(long)]
        fee_tier: Option<FeeTier>,

        /// Only recompute when a summary is logged
        #[arg(long)]
        manual: bool,

        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,
    },

    /// Estimate costs once against a saved order book message
    Estimate {
        /// JSON file holding one market-data message
        #[arg(short, long)]
        snapshot: String,

        /// Order notional in quote currency
        #[arg(short, long)]
        quantity: Option<f64>,

        /// Volatility estimate (0-100)
        #[arg(long)]
        volatility: Option<f64>,

        /// Fee tier (tier1 .. tier5)
        #[arg(long)]
        fee_tier: Option<FeeTier>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load config before logging so its level applies, but report errors after
    let loaded = match cli.command {
        Commands::Init { .. } => Ok(Config::default()),
        _ => Config::from_file(&cli.config),
    };
    let configured_level = loaded.as_ref().map(|c| c.logging.level.clone()).ok();
    init_logging(cli.verbose, configured_level.as_deref());

    info!("🚀 Trade Simulator v{}", env!("CARGO_PKG_VERSION"));
    info!("📁 Config: {}", cli.config);

    match cli.command {
        Commands::Init { force } => {
            init_config(&cli.config, force)?;
        }

        Commands::Run { mock, quantity, volatility, fee_tier, manual, ticks } => {
            let config = config_or_exit(loaded, &cli.config);
            let options = run_commands::RunOptions {
                mock,
                quantity,
                volatility,
                fee_tier,
                manual,
                max_ticks: ticks,
            };
            if let Err(e) = run_commands::run_simulation(config, options).await {
                exit_with(&e);
            }
        }

        Commands::Estimate { snapshot, quantity, volatility, fee_tier } => {
            // Offline estimates fall back to defaults when no config exists
            let config = loaded.unwrap_or_else(|e| {
                warn!("⚠️  {} - using defaults", e);
                Config::default()
            });
            if let Err(e) = estimate_commands::estimate_from_file(&config, &snapshot, quantity, volatility, fee_tier) {
                exit_with(&e);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, configured_level: Option<&str>) {
    let level = if verbose { "debug" } else { configured_level.unwrap_or("info") };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

/// Return the config or exit with a helpful error message
fn config_or_exit(loaded: Result<Config, ConfigError>, path: &str) -> Config {
    match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("❌ Configuration Error");
            error!("{}", e);

            if matches!(e, ConfigError::FileRead(_)) {
                error!("");
                error!("💡 Quick fix:");
                error!("   1. Run: trade-sim init");
                error!("   2. Edit {} with your feed URL", path);
                error!("   3. Try again (or use --mock)");
            }

            std::process::exit(1);
        }
    }
}

fn exit_with(e: &SimulatorError) -> ! {
    error!(category = e.category(), "❌ {}", e);
    if e.is_retryable() {
        error!("💡 Transient failure, rerunning may succeed");
    }
    std::process::exit(1);
}

fn init_config(path: &str, force: bool) -> Result<(), ConfigError> {
    if std::path::Path::new(path).exists() && !force {
        warn!("⚠️  {} already exists, skipping (use --force to overwrite)", path);
        return Ok(());
    }

    Config::default().to_file(path)?;
    info!("📝 Created {}", path);
    info!("💡 Next steps:");
    info!("   1. Point feed.ws_url at your order book stream");
    info!("   2. Run: trade-sim run   (or trade-sim run --mock)");
    Ok(())
}
