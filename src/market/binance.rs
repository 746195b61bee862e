//! Binance REST client
//!
//! Serves snapshots from the 24h ticker endpoint and history from klines.

use super::{HistoryProvider, MarketDataProvider, MarketSnapshot, PricePoint};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Binance spot REST base URL
pub const BINANCE_REST_URL: &str = "https://api.binance.com";

const SOURCE_TAG: &str = "binance";

/// Configuration for the Binance client
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: BINANCE_REST_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// 24h ticker entry
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    symbol: String,
    last_price: String,
    price_change_percent: String,
    high_price: String,
    low_price: String,
    volume: String,
    close_time: i64,
}

/// Client for Binance spot market data
pub struct BinanceClient {
    config: BinanceConfig,
    client: Client,
}

impl BinanceClient {
    /// Create a client against the public endpoint
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(BinanceConfig::default())
    }

    pub fn with_config(config: BinanceConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self { config, client })
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<String> {
        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!(url = %url, "Binance request");

        let response = self.client.get(&url).query(query).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance API error: {} - {}", status, body);
        }
        Ok(response.text().await?)
    }

    /// Parse a 24h ticker array, skipping malformed entries
    fn parse_tickers(body: &str) -> anyhow::Result<HashMap<String, MarketSnapshot>> {
        let tickers: Vec<Ticker24h> = serde_json::from_str(body)?;
        let mut snapshots = HashMap::with_capacity(tickers.len());

        for ticker in tickers {
            match Self::convert_ticker(&ticker) {
                Some(snapshot) => {
                    snapshots.insert(snapshot.symbol.clone(), snapshot);
                }
                None => tracing::warn!(symbol = %ticker.symbol, "Malformed ticker skipped"),
            }
        }
        Ok(snapshots)
    }

    fn convert_ticker(ticker: &Ticker24h) -> Option<MarketSnapshot> {
        let percent = Decimal::from_str(&ticker.price_change_percent).ok()?;
        Some(MarketSnapshot {
            symbol: ticker.symbol.clone(),
            price: Decimal::from_str(&ticker.last_price).ok()?,
            volume: Decimal::from_str(&ticker.volume).ok()?,
            high_24h: Decimal::from_str(&ticker.high_price).ok()?,
            low_24h: Decimal::from_str(&ticker.low_price).ok()?,
            change_24h: percent / Decimal::ONE_HUNDRED,
            timestamp: Utc.timestamp_millis_opt(ticker.close_time).single()?,
            source: SOURCE_TAG.to_string(),
        })
    }

    /// Parse a klines payload into close/volume points
    ///
    /// Each row is `[openTime, open, high, low, close, volume, ...]`.
    fn parse_klines(symbol: &str, body: &str) -> anyhow::Result<Vec<PricePoint>> {
        let rows: Vec<Vec<Value>> = serde_json::from_str(body)?;
        let mut points = Vec::with_capacity(rows.len());

        for row in rows {
            let open_time = row
                .first()
                .and_then(Value::as_i64)
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
            let close = decimal_field(&row, 4);
            let volume = decimal_field(&row, 5);

            let (Some(timestamp), Some(close), Some(volume)) = (open_time, close, volume) else {
                anyhow::bail!("malformed kline row for {symbol}");
            };
            points.push(PricePoint::new(symbol, timestamp, close, volume)?);
        }
        Ok(points)
    }
}

fn decimal_field(row: &[Value], index: usize) -> Option<Decimal> {
    row.get(index)?.as_str().and_then(|s| Decimal::from_str(s).ok())
}

#[async_trait]
impl MarketDataProvider for BinanceClient {
    async fn fetch(&self, symbols: &[String]) -> anyhow::Result<HashMap<String, MarketSnapshot>> {
        let symbols_param = serde_json::to_string(symbols)?;
        let body = self
            .get("/api/v3/ticker/24hr", &[("symbols", symbols_param)])
            .await?;
        let snapshots = Self::parse_tickers(&body)?;

        tracing::debug!(
            requested = symbols.len(),
            received = snapshots.len(),
            "Fetched Binance snapshots"
        );
        Ok(snapshots)
    }
}

#[async_trait]
impl HistoryProvider for BinanceClient {
    async fn fetch_series(
        &self,
        symbol: &str,
        interval: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<PricePoint>> {
        let body = self
            .get(
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", interval.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Self::parse_klines(symbol, &body)
    }
}
