//! Receive-only WebSocket stream with reconnection

use super::types::FeedError;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Stream connection settings
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub url: String,
    /// Give up after this many consecutive failures (0 = never)
    pub max_reconnect_attempts: u32,
    pub initial_reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
    pub ping_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_reconnect_attempts: 10,
            initial_reconnect_delay: Duration::from_secs(1),
            max_reconnect_delay: Duration::from_secs(60),
            ping_interval: Duration::from_secs(30),
        }
    }
}

impl StreamConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn max_reconnects(mut self, n: u32) -> Self {
        self.max_reconnect_attempts = n;
        self
    }

    pub fn initial_delay(mut self, d: Duration) -> Self {
        self.initial_reconnect_delay = d;
        self
    }

    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_reconnect_delay = d;
        self
    }
}

/// Events surfaced to the stream consumer
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Text(String),
    Connected,
    Disconnected,
    Reconnecting { attempt: u32 },
}

/// WebSocket client that reconnects with exponential backoff
pub struct StreamClient {
    config: StreamConfig,
}

impl StreamClient {
    pub fn new(config: StreamConfig) -> Self {
        Self { config }
    }

    /// Spawn the connection task and return its event channel
    pub fn connect(&self) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(1024);
        let config = self.config.clone();

        tokio::spawn(async move {
            if let Err(e) = Self::run_connection_loop(config, tx).await {
                tracing::error!(error = %e, "Stream connection loop failed");
            }
        });

        rx
    }

    async fn run_connection_loop(
        config: StreamConfig,
        tx: mpsc::Sender<StreamEvent>,
    ) -> Result<(), FeedError> {
        let mut attempts = 0;
        let mut delay = config.initial_reconnect_delay;

        loop {
            match Self::connect_and_stream(&config, &tx, &mut attempts).await {
                Ok(()) => {
                    tracing::info!("Stream closed cleanly");
                    let _ = tx.send(StreamEvent::Disconnected).await;
                    return Ok(());
                }
                Err(e) => {
                    attempts += 1;
                    tracing::warn!(error = %e, attempt = attempts, "Stream error, reconnecting");

                    if config.max_reconnect_attempts > 0 && attempts >= config.max_reconnect_attempts
                    {
                        let _ = tx.send(StreamEvent::Disconnected).await;
                        return Err(FeedError::MaxReconnectsExceeded);
                    }
                    if tx.is_closed() {
                        return Ok(());
                    }

                    let _ = tx.send(StreamEvent::Reconnecting { attempt: attempts }).await;
                    sleep(delay).await;
                    delay = next_delay(delay, config.max_reconnect_delay);
                }
            }
        }
    }

    async fn connect_and_stream(
        config: &StreamConfig,
        tx: &mpsc::Sender<StreamEvent>,
        attempts: &mut u32,
    ) -> Result<(), FeedError> {
        let (ws, _response) = connect_async(&config.url)
            .await
            .map_err(|e| FeedError::ConnectionFailed(e.to_string()))?;
        let (mut write, mut read) = ws.split();

        tracing::info!(url = %config.url, "Stream connected");
        *attempts = 0;
        if tx.send(StreamEvent::Connected).await.is_err() {
            return Ok(());
        }

        let mut ping = tokio::time::interval(config.ping_interval);
        ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        if tx.send(StreamEvent::Text(text)).await.is_err() {
                            return Ok(());
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await
                            .map_err(|e| FeedError::SendFailed(e.to_string()))?;
                    }
                    Some(Ok(Message::Close(_))) => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(FeedError::ConnectionFailed(e.to_string())),
                    None => {
                        return Err(FeedError::ConnectionFailed("stream ended unexpectedly".into()))
                    }
                },
                _ = ping.tick() => {
                    write.send(Message::Ping(Vec::new())).await
                        .map_err(|e| FeedError::SendFailed(e.to_string()))?;
                }
            }
        }
    }
}

/// Double the delay, capped
fn next_delay(current: Duration, max: Duration) -> Duration {
    (current * 2).min(max)
}
