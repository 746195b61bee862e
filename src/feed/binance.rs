//! Binance combined miniTicker stream

use super::stream::{StreamClient, StreamConfig, StreamEvent};
use super::{PriceFeed, PriceTick};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tokio::sync::mpsc;

/// Binance combined stream endpoint
pub const BINANCE_STREAM_URL: &str = "wss://stream.binance.com:9443/stream";

/// Combined stream envelope
#[derive(Debug, Deserialize)]
struct StreamEnvelope {
    #[allow(dead_code)]
    stream: String,
    data: MiniTicker,
}

/// 24hr rolling mini ticker payload
#[derive(Debug, Deserialize)]
struct MiniTicker {
    /// Event type
    #[serde(rename = "e")]
    event_type: String,
    /// Event time (milliseconds)
    #[serde(rename = "E")]
    event_time: i64,
    #[serde(rename = "s")]
    symbol: String,
    /// Close (last) price
    #[serde(rename = "c")]
    close: String,
}

/// Live last prices for a fixed symbol set
pub struct BinanceTickerFeed {
    base_url: String,
    symbols: Vec<String>,
}

impl BinanceTickerFeed {
    pub fn new(base_url: impl Into<String>, symbols: &[String]) -> Self {
        Self {
            base_url: base_url.into(),
            symbols: symbols.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    /// Combined stream URL, e.g. `.../stream?streams=btcusdt@miniTicker/ethusdt@miniTicker`
    fn build_url(&self) -> String {
        let streams: Vec<String> = self
            .symbols
            .iter()
            .map(|s| format!("{s}@miniTicker"))
            .collect();
        format!("{}?streams={}", self.base_url, streams.join("/"))
    }

    fn parse_message(msg: &str) -> Option<PriceTick> {
        let envelope: StreamEnvelope = serde_json::from_str(msg).ok()?;
        let ticker = envelope.data;
        if ticker.event_type != "24hrMiniTicker" {
            return None;
        }

        let price = Decimal::from_str(&ticker.close).ok()?;
        if price <= Decimal::ZERO {
            return None;
        }

        Some(PriceTick {
            symbol: ticker.symbol,
            price,
            timestamp: Utc::now(),
            exchange_ts: Utc.timestamp_millis_opt(ticker.event_time).single()?,
        })
    }

    async fn run_message_loop(
        mut events: mpsc::Receiver<StreamEvent>,
        tick_tx: mpsc::Sender<PriceTick>,
    ) {
        while let Some(event) = events.recv().await {
            match event {
                StreamEvent::Text(text) => {
                    let Some(tick) = Self::parse_message(&text) else {
                        tracing::trace!("Ignoring non-ticker message");
                        continue;
                    };
                    if tick_tx.send(tick).await.is_err() {
                        tracing::debug!("Tick receiver dropped, stopping feed");
                        break;
                    }
                }
                StreamEvent::Connected => tracing::info!("Ticker stream connected"),
                StreamEvent::Reconnecting { attempt } => {
                    tracing::warn!(attempt, "Ticker stream reconnecting")
                }
                StreamEvent::Disconnected => {
                    tracing::warn!("Ticker stream disconnected");
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl PriceFeed for BinanceTickerFeed {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<PriceTick>> {
        if self.symbols.is_empty() {
            anyhow::bail!("no symbols to subscribe to");
        }

        let url = self.build_url();
        tracing::info!(symbols = self.symbols.len(), url = %url, "Subscribing to ticker stream");

        let client = StreamClient::new(StreamConfig::new(url));
        let events = client.connect();

        let (tick_tx, tick_rx) = mpsc::channel(1024);
        tokio::spawn(Self::run_message_loop(events, tick_tx));
        Ok(tick_rx)
    }
}
