// Inbound market-data message parsing
//
// Accepted shapes:
//   {"type": "snapshot" | "update", "data": {"bids": [[p, q], ...], "asks": [...], "timestamp": 1700000000000}}
//   {"exchange": "OKX", "symbol": "BTC-USDT-SWAP", "timestamp": "...", "bids": [...], "asks": [...]}
// Any other "type" is ignored. Prices and quantities may arrive as text or numbers.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{SimulatorError, SimulatorResult};
use crate::orderbook::OrderBookSnapshot;

/// Outcome of decoding one text frame
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    /// A full book to publish
    Book(OrderBookSnapshot),
    /// Valid JSON we have no use for (heartbeats, acks, other channels)
    Ignored(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Number(f64),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct RawBook {
    #[serde(default)]
    bids: Vec<Vec<RawNumber>>,
    #[serde(default)]
    asks: Vec<Vec<RawNumber>>,
    #[serde(default)]
    timestamp: Option<RawTimestamp>,
}

/// Decode one text frame received at `captured_at`
pub fn parse_message(text: &str, captured_at: DateTime<Utc>) -> SimulatorResult<FeedMessage> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| SimulatorError::malformed(format!("invalid JSON: {}", e)))?;

    match value.get("type") {
        Some(Value::String(kind)) => match kind.as_str() {
            "snapshot" | "update" => {
                let data = value
                    .get("data")
                    .ok_or_else(|| SimulatorError::malformed(format!("'{}' message without data", kind)))?;
                parse_book(data, captured_at).map(FeedMessage::Book)
            }
            other => Ok(FeedMessage::Ignored(other.to_string())),
        },
        // A type we can't name is still not a book
        Some(other) => Ok(FeedMessage::Ignored(other.to_string())),
        None if value.get("bids").is_some() || value.get("asks").is_some() => {
            parse_book(&value, captured_at).map(FeedMessage::Book)
        }
        None => Ok(FeedMessage::Ignored("untyped".to_string())),
    }
}

fn parse_book(data: &Value, captured_at: DateTime<Utc>) -> SimulatorResult<OrderBookSnapshot> {
    let raw: RawBook = RawBook::deserialize(data)
        .map_err(|e| SimulatorError::malformed(format!("unexpected book layout: {}", e)))?;

    let bids = parse_levels(&raw.bids, "bid")?;
    let asks = parse_levels(&raw.asks, "ask")?;
    let timestamp = match raw.timestamp {
        Some(ts) => parse_timestamp(&ts)?,
        None => captured_at,
    };

    OrderBookSnapshot::from_levels(bids, asks, timestamp)
}

fn parse_levels(levels: &[Vec<RawNumber>], side: &str) -> SimulatorResult<Vec<(f64, f64)>> {
    levels
        .iter()
        .map(|level| match level.as_slice() {
            // Some venues append order counts after price and size
            [price, quantity, ..] => Ok((
                parse_number(price, side, "price")?,
                parse_number(quantity, side, "quantity")?,
            )),
            _ => Err(SimulatorError::malformed(format!(
                "{} level needs price and quantity, got {} field(s)",
                side,
                level.len()
            ))),
        })
        .collect()
}

fn parse_number(raw: &RawNumber, side: &str, field: &str) -> SimulatorResult<f64> {
    match raw {
        RawNumber::Number(n) => Ok(*n),
        RawNumber::Text(text) => text.trim().parse::<f64>().map_err(|_| {
            SimulatorError::malformed(format!("{} {} '{}' is not a number", side, field, text))
        }),
    }
}

fn parse_timestamp(raw: &RawTimestamp) -> SimulatorResult<DateTime<Utc>> {
    let from_millis = |millis: f64| {
        Utc.timestamp_millis_opt(millis as i64)
            .single()
            .ok_or_else(|| SimulatorError::malformed(format!("timestamp {} out of range", millis)))
    };

    match raw {
        RawTimestamp::Millis(millis) if millis.is_finite() => from_millis(*millis),
        RawTimestamp::Millis(millis) => {
            Err(SimulatorError::malformed(format!("timestamp {} is not finite", millis)))
        }
        RawTimestamp::Text(text) => {
            if let Ok(millis) = text.trim().parse::<f64>() {
                return from_millis(millis);
            }
            DateTime::parse_from_rfc3339(text.trim())
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|_| SimulatorError::malformed(format!("unrecognized timestamp '{}'", text)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_typed_snapshot_with_text_values() {
        let text = r#"{"type":"snapshot","data":{"bids":[["19500","2.5"],["19450","3.2"]],
            "asks":[["19550","1.9"],["19600","2.8"]],"timestamp":1700000000000}}"#;
        let msg = parse_message(text, Utc::now()).unwrap();
        let FeedMessage::Book(book) = msg else { panic!("expected a book") };
        assert_eq!(book.best_bid().unwrap().price, 19500.0);
        assert_eq!(book.best_ask().unwrap().quantity, 1.9);
        assert_eq!(book.timestamp().timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_parses_flat_gateway_message() {
        let text = r#"{"timestamp":"2025-05-04T10:39:13Z","exchange":"OKX","symbol":"BTC-USDT-SWAP",
            "asks":[["95445.5","9.06"],["95448","2.05"]],"bids":[["95445.4","1104.23"]]}"#;
        let msg = parse_message(text, Utc::now()).unwrap();
        let FeedMessage::Book(book) = msg else { panic!("expected a book") };
        assert_eq!(book.depth(), (1, 2));
        assert_eq!(book.timestamp().to_rfc3339(), "2025-05-04T10:39:13+00:00");
    }

    #[test]
    fn test_numeric_values_and_extra_fields() {
        let text = r#"{"type":"update","data":{"bids":[[100.5, 2, "0", "4"]],"asks":[]}}"#;
        let captured = Utc::now();
        let FeedMessage::Book(book) = parse_message(text, captured).unwrap() else {
            panic!("expected a book")
        };
        assert_eq!(book.best_bid().unwrap().quantity, 2.0);
        assert!(book.asks().is_empty());
        assert_eq!(book.timestamp(), captured);
    }

    #[test]
    fn test_other_types_are_ignored() {
        let msg = parse_message(r#"{"type":"heartbeat"}"#, Utc::now()).unwrap();
        assert_eq!(msg, FeedMessage::Ignored("heartbeat".to_string()));
        let msg = parse_message(r#"{"event":"subscribe"}"#, Utc::now()).unwrap();
        assert!(matches!(msg, FeedMessage::Ignored(_)));
    }

    #[test]
    fn test_non_string_type_is_ignored() {
        let msg = parse_message(r#"{"type":7,"data":{}}"#, Utc::now()).unwrap();
        assert_eq!(msg, FeedMessage::Ignored("7".to_string()));
        let msg = parse_message(r#"{"type":null,"bids":[["1","1"]]}"#, Utc::now()).unwrap();
        assert!(matches!(msg, FeedMessage::Ignored(_)));
    }

    #[test]
    fn test_non_numeric_price_is_malformed() {
        let text = r#"{"type":"snapshot","data":{"bids":[["abc","1.0"]],"asks":[]}}"#;
        let err = parse_message(text, Utc::now()).unwrap_err();
        assert!(matches!(err, SimulatorError::MalformedTick(ref m) if m.contains("abc")));
    }

    #[test]
    fn test_short_level_and_bad_json_are_malformed() {
        let text = r#"{"type":"snapshot","data":{"bids":[["100"]],"asks":[]}}"#;
        assert!(parse_message(text, Utc::now()).is_err());
        assert!(parse_message("not json", Utc::now()).is_err());
        assert!(parse_message(r#"{"type":"snapshot"}"#, Utc::now()).is_err());
    }
}
