// Market-data ingestion: transport, reconnect state machine, latency marks

pub mod connector;
pub mod mock;
pub mod latency;
pub mod status;
pub mod ingestion;

pub use connector::{Connector, FeedConnection, WebSocketConnector, WebSocketConnection};
pub use mock::{MockConfig, MockConnector};
pub use latency::{LatencyRecord, LatencyStats, LatencySummary, RenderTimer, TickTiming};
pub use status::{ConnectionStatus, PipelineStatus};
pub use ingestion::{IngestionPipeline, PipelineConfig, PipelineHandle, PublishedTick, TickReceiver};
