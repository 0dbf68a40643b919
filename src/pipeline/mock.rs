// Mock market-data generator (random walk) for offline runs

use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::time::Duration;
use tokio::time::{interval, Interval, MissedTickBehavior};

use crate::error::SimulatorResult;
use crate::pipeline::connector::{Connector, FeedConnection};

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub start_price: f64,
    pub tick_size: f64,
    pub levels: usize,
    pub interval: Duration,
    /// End each session after this many messages (simulates a remote close)
    pub messages_per_session: Option<u64>,
    pub seed: Option<u64>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            start_price: 95_000.0,
            tick_size: 0.1,
            levels: 20,
            interval: Duration::from_millis(100),   // ~10 ticks/s
            messages_per_session: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    config: MockConfig,
}

impl MockConnector {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }
}

pub struct MockConnection {
    config: MockConfig,
    rng: StdRng,
    ticker: Interval,
    mid: f64,
    sent: u64,
}

#[async_trait]
impl Connector for MockConnector {
    type Connection = MockConnection;

    async fn connect(&self) -> SimulatorResult<MockConnection> {
        // StdRng rather than ThreadRng: the connection is held across awaits on other threads
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(MockConnection {
            config: self.config.clone(),
            rng,
            ticker,
            mid: self.config.start_price,
            sent: 0,
        })
    }

    fn describe(&self) -> String {
        format!("mock random walk @ {:?}", self.config.interval)
    }
}

impl MockConnection {
    fn next_book(&mut self) -> String {
        let tick = self.config.tick_size;
        let steps: i32 = self.rng.gen_range(-3..=3);
        self.mid = (self.mid + steps as f64 * tick).max(tick * 10.0);

        let best_bid = self.mid - tick / 2.0;
        let best_ask = self.mid + tick / 2.0;
        let mut bids = Vec::with_capacity(self.config.levels);
        let mut asks = Vec::with_capacity(self.config.levels);
        for i in 0..self.config.levels {
            let offset = i as f64 * tick;
            let bid_qty: f64 = self.rng.gen_range(0.01..5.0);
            let ask_qty: f64 = self.rng.gen_range(0.01..5.0);
            bids.push([format!("{:.2}", best_bid - offset), format!("{:.4}", bid_qty)]);
            asks.push([format!("{:.2}", best_ask + offset), format!("{:.4}", ask_qty)]);
        }

        json!({
            "type": "snapshot",
            "data": {
                "bids": bids,
                "asks": asks,
                "timestamp": Utc::now().timestamp_millis(),
            }
        })
        .to_string()
    }
}

#[async_trait]
impl FeedConnection for MockConnection {
    async fn next_message(&mut self) -> Option<SimulatorResult<String>> {
        if let Some(limit) = self.config.messages_per_session {
            if self.sent >= limit {
                return None;
            }
        }
        self.ticker.tick().await;
        self.sent += 1;
        Some(Ok(self.next_book()))
    }

    async fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orderbook::{parse_message, FeedMessage};

    #[tokio::test(start_paused = true)]
    async fn test_mock_emits_parseable_books_then_closes() {
        let connector = MockConnector::new(MockConfig {
            levels: 5,
            messages_per_session: Some(2),
            seed: Some(7),
            ..MockConfig::default()
        });
        let mut connection = connector.connect().await.unwrap();

        for _ in 0..2 {
            let text = connection.next_message().await.unwrap().unwrap();
            let FeedMessage::Book(book) = parse_message(&text, Utc::now()).unwrap() else {
                panic!("mock should emit books");
            };
            assert_eq!(book.depth(), (5, 5));
            assert!(book.best_bid().unwrap().price < book.best_ask().unwrap().price);
        }
        assert!(connection.next_message().await.is_none());
    }
}
