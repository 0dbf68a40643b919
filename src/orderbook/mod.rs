// Order book model and market-data decoding

pub mod snapshot;
pub mod message;

pub use snapshot::{OrderBookSnapshot, OrderedFloat, PriceLevel};
pub use message::{parse_message, FeedMessage};
