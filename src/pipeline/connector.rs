// Market-data transports
//
// The pipeline only needs "open a link" and "give me the next text frame";
// the WebSocket client and the mock generator both plug in here.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info};

use crate::error::{SimulatorError, SimulatorResult};

/// Opens fresh connections to a market-data source
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Connection: FeedConnection + 'static;

    async fn connect(&self) -> SimulatorResult<Self::Connection>;

    /// Human-readable endpoint for logs
    fn describe(&self) -> String;
}

/// One live link
#[async_trait]
pub trait FeedConnection: Send {
    /// Next text payload. `None` once the remote side has closed the link.
    async fn next_message(&mut self) -> Option<SimulatorResult<String>>;

    /// Close the link; errors are ignored since the link is being discarded.
    async fn close(&mut self);
}

/// WebSocket market-data client
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
    subscribe_message: Option<String>,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subscribe_message: None,
        }
    }

    /// Text frame sent right after the handshake
    pub fn with_subscription(mut self, message: Option<String>) -> Self {
        self.subscribe_message = message;
        self
    }
}

pub struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connector for WebSocketConnector {
    type Connection = WebSocketConnection;

    async fn connect(&self) -> SimulatorResult<WebSocketConnection> {
        let (mut stream, _) = connect_async(self.url.as_str()).await?;
        info!(url = %self.url, "✅ Connected to market-data WebSocket");

        if let Some(subscribe) = &self.subscribe_message {
            stream.send(Message::Text(subscribe.clone())).await?;
            info!("📡 Subscription sent");
        }

        Ok(WebSocketConnection { stream })
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[async_trait]
impl FeedConnection for WebSocketConnection {
    async fn next_message(&mut self) -> Option<SimulatorResult<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => {
                    return Some(String::from_utf8(bytes).map_err(|e| {
                        SimulatorError::malformed(format!("binary frame is not UTF-8: {}", e))
                    }));
                }
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "remote closed the WebSocket");
                    return None;
                }
                // Ping/pong are answered by tungstenite itself
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
