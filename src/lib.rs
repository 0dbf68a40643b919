// Trade Simulator Library
//
// Estimates the execution cost of a hypothetical market order against a live
// order book and measures the latency of the tick-to-estimate pipeline

pub mod types;
pub mod config;
pub mod error;       // Unified error handling
pub mod orderbook;
pub mod estimator;
pub mod pipeline;
pub mod controller;

pub use types::Side;

// Re-export error types
pub use error::{SimulatorError, SimulatorResult};

// Re-export configuration
pub use config::{Config, ConfigError, FeedConfig, LoggingConfig, SimulationConfig};

// Re-export order book types
pub use orderbook::{parse_message, FeedMessage, OrderBookSnapshot, PriceLevel};

// Re-export estimator
pub use estimator::{estimate_costs, FeeTier, SimulationParams, TradingMetricsResult};

// Re-export pipeline components
pub use pipeline::{
    ConnectionStatus, Connector, FeedConnection, IngestionPipeline, LatencyRecord, LatencyStats,
    LatencySummary, MockConfig, MockConnector, PipelineConfig, PipelineHandle, PipelineStatus,
    PublishedTick, TickReceiver, WebSocketConnector,
};

pub use controller::SimulationController;
