//! Market data module
//!
//! Price points, bounded per-symbol history and the collaborator traits the
//! pipeline pulls snapshots and candles through.

mod binance;
mod series;

pub use binance::{BinanceClient, BinanceConfig, BINANCE_REST_URL};
pub use series::{PricePoint, PriceSeries, SeriesError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Latest market state for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    /// Last traded price
    pub price: Decimal,
    /// Rolling 24h base volume
    pub volume: Decimal,
    pub high_24h: Decimal,
    pub low_24h: Decimal,
    /// 24h change as a fraction (0.05 = +5%)
    pub change_24h: Decimal,
    pub timestamp: DateTime<Utc>,
    /// Which provider produced the snapshot
    pub source: String,
}

/// Source of current market snapshots
///
/// Symbols the provider could not serve are simply missing from the map.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch(&self, symbols: &[String]) -> anyhow::Result<HashMap<String, MarketSnapshot>>;
}

/// Source of historical candles, oldest first
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn fetch_series(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<PricePoint>>;
}
