//! Bounded rolling price history

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Errors raised when building price history
#[derive(Debug, Error, PartialEq)]
pub enum SeriesError {
    #[error("negative price {price} for {symbol}")]
    NegativePrice { symbol: String, price: Decimal },
    #[error("negative volume {volume} for {symbol}")]
    NegativeVolume { symbol: String, volume: Decimal },
    #[error("point for {got} pushed into {expected} series")]
    SymbolMismatch { expected: String, got: String },
    #[error("out of order point at {at}, series ends at {last}")]
    OutOfOrder {
        at: DateTime<Utc>,
        last: DateTime<Utc>,
    },
}

/// One sampled observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
    pub volume: Decimal,
}

impl PricePoint {
    /// Create a point, rejecting negative price or volume
    pub fn new(
        symbol: impl Into<String>,
        timestamp: DateTime<Utc>,
        price: Decimal,
        volume: Decimal,
    ) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        if price.is_sign_negative() && !price.is_zero() {
            return Err(SeriesError::NegativePrice { symbol, price });
        }
        if volume.is_sign_negative() && !volume.is_zero() {
            return Err(SeriesError::NegativeVolume { symbol, volume });
        }
        Ok(Self {
            symbol,
            timestamp,
            price,
            volume,
        })
    }
}

/// Fixed-capacity, time-ordered history for one symbol
///
/// The oldest point is evicted once capacity is reached. A point with the
/// same timestamp as the newest one replaces it (a still-open candle being
/// refreshed).
#[derive(Debug, Clone)]
pub struct PriceSeries {
    symbol: String,
    capacity: usize,
    points: VecDeque<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            symbol: symbol.into(),
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    /// Build a series from points, keeping the newest `capacity`
    pub fn from_points(
        symbol: impl Into<String>,
        capacity: usize,
        points: impl IntoIterator<Item = PricePoint>,
    ) -> Result<Self, SeriesError> {
        let mut series = Self::new(symbol, capacity);
        for point in points {
            series.push(point)?;
        }
        Ok(series)
    }

    /// Append a point
    pub fn push(&mut self, point: PricePoint) -> Result<(), SeriesError> {
        if point.symbol != self.symbol {
            return Err(SeriesError::SymbolMismatch {
                expected: self.symbol.clone(),
                got: point.symbol,
            });
        }

        if let Some(last) = self.points.back_mut() {
            if point.timestamp < last.timestamp {
                return Err(SeriesError::OutOfOrder {
                    at: point.timestamp,
                    last: last.timestamp,
                });
            }
            if point.timestamp == last.timestamp {
                *last = point;
                return Ok(());
            }
        }

        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
        Ok(())
    }

    /// Merge freshly fetched points, skipping any older than the newest held
    ///
    /// Returns the number of points appended or replaced.
    pub fn merge(&mut self, points: impl IntoIterator<Item = PricePoint>) -> usize {
        let mut merged = 0;
        for point in points {
            let stale = self
                .points
                .back()
                .is_some_and(|last| point.timestamp < last.timestamp);
            if stale {
                continue;
            }
            if self.push(point).is_ok() {
                merged += 1;
            }
        }
        merged
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.back()
    }

    pub fn prices(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn volumes(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.volume).collect()
    }

    /// Close prices as `f64` for indicator math
    pub fn closes(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| p.price.to_f64().unwrap_or(0.0))
            .collect()
    }

    /// Copy of this series without its newest point
    pub fn without_last(&self) -> Self {
        let mut copy = self.clone();
        copy.points.pop_back();
        copy
    }
}
