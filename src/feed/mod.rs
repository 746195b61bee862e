//! Streaming price feed module
//!
//! Live last-trade prices from the Binance combined miniTicker stream. Ticks
//! drive stop-loss/take-profit checks between analysis cycles.

mod binance;
mod stream;
mod types;

pub use binance::{BinanceTickerFeed, BINANCE_STREAM_URL};
pub use stream::{StreamClient, StreamConfig, StreamEvent};
pub use types::{FeedError, PriceTick};

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Trait for price feed implementations
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Subscribe to price updates
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<PriceTick>>;
}
