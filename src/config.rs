// Configuration management for the trade simulator

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::estimator::{FeeTier, SimulationParams};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    pub ws_url: String,
    pub exchange: String,
    pub symbol: String,
    pub base_asset: String,
    pub quote_asset: String,
    /// Fixed delay before reconnecting after the link drops
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    /// Raw text frame sent right after connecting, for feeds that need a subscription
    #[serde(default)]
    pub subscribe_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub quantity: f64,          // Notional in quote currency (e.g. USD)
    pub volatility: f64,        // External estimate, 0..=100
    pub fee_tier: FeeTier,
    #[serde(default = "default_true")]
    pub auto_run: bool,         // Recompute on every tick / parameter change
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            quantity: 100.0,
            volatility: 50.0,
            fee_tier: FeeTier::Tier1,
            auto_run: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit a cost estimate log line every N applied ticks
    #[serde(default = "default_log_every_n_ticks")]
    pub log_every_n_ticks: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_every_n_ticks: default_log_every_n_ticks(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub feed: FeedConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_reconnect_delay_secs() -> u64 { 5 }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_log_every_n_ticks() -> u64 { 10 }

impl Default for Config {
    fn default() -> Self {
        Self {
            feed: FeedConfig {
                ws_url: "wss://ws.gomarket-cpp.goquant.io/ws/l2-orderbook/okx/BTC-USDT-SWAP"
                    .to_string(),
                exchange: "OKX".to_string(),
                symbol: "BTC-USDT-SWAP".to_string(),
                base_asset: "BTC".to_string(),
                quote_asset: "USDT".to_string(),
                reconnect_delay_secs: default_reconnect_delay_secs(),
                subscribe_message: None,
            },
            simulation: SimulationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl FeedConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, content)
            .map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// Load configuration from file, or create default if file doesn't exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            let config = Self::default();
            config.to_file(&path)?;
            info!("📁 Created default config file: {}", path.as_ref().display());
            Ok(config)
        }
    }

    /// Parameters for the first estimate, before any user edit
    pub fn simulation_params(&self) -> SimulationParams {
        SimulationParams {
            quantity: self.simulation.quantity,
            volatility: self.simulation.volatility,
            fee_tier: self.simulation.fee_tier,
            base_asset: self.feed.base_asset.clone(),
            quote_asset: self.feed.quote_asset.clone(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.feed.ws_url.starts_with("ws://") || self.feed.ws_url.starts_with("wss://")) {
            return Err(ConfigError::Validation(format!(
                "ws_url must start with ws:// or wss:// (got '{}')",
                self.feed.ws_url
            )));
        }

        if self.feed.reconnect_delay_secs == 0 {
            return Err(ConfigError::Validation("reconnect_delay_secs must be greater than 0".to_string()));
        }

        if !self.simulation.quantity.is_finite() || self.simulation.quantity < 0.0 {
            return Err(ConfigError::Validation("quantity must be a non-negative number".to_string()));
        }

        if !(0.0..=100.0).contains(&self.simulation.volatility) {
            return Err(ConfigError::Validation("volatility must be within 0..=100".to_string()));
        }

        if self.logging.log_every_n_ticks == 0 {
            return Err(ConfigError::Validation("log_every_n_ticks must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
