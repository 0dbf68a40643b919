// Connection status surface exposed to the caller

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
        }
    }
}

/// Snapshot of pipeline health, replaced wholesale on every change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub connection: ConnectionStatus,
    pub last_error: Option<String>,
    /// Messages dropped because they could not be parsed
    pub error_count: u64,
    pub connection_failures: u64,
    pub connect_attempts: u64,
    pub messages_received: u64,
    pub snapshots_published: u64,
}

impl PipelineStatus {
    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionStatus::Connected
    }
}
