//! Rule-based signal generation
//!
//! Each defined indicator may cast one weighted vote. The side with the larger
//! summed weight wins; an exact tie, including no votes at all, is WAIT.

use super::types::{Action, Indicator, IndicatorVote, RuleSignal};
use crate::config::{IndicatorConfig, SignalConfig};
use crate::indicators::IndicatorSet;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Converts an indicator set into a directional rule signal
#[derive(Debug, Clone)]
pub struct RuleSignalGenerator {
    rsi_oversold: f64,
    rsi_overbought: f64,
    weights: SignalConfig,
}

impl RuleSignalGenerator {
    pub fn new(indicators: &IndicatorConfig, weights: SignalConfig) -> Self {
        Self {
            rsi_oversold: indicators.rsi_oversold,
            rsi_overbought: indicators.rsi_overbought,
            weights,
        }
    }

    /// Score one symbol's indicators against its current price
    pub fn generate(&self, symbol: &str, price: Decimal, set: &IndicatorSet) -> RuleSignal {
        let votes = self.votes(price, set);

        let total = |side: Action| -> Decimal {
            votes
                .iter()
                .filter(|v| v.action == side)
                .map(|v| v.weight)
                .sum()
        };
        let buy = total(Action::Buy);
        let sell = total(Action::Sell);

        let (action, confidence) = if buy > sell {
            (Action::Buy, buy.min(Decimal::ONE))
        } else if sell > buy {
            (Action::Sell, sell.min(Decimal::ONE))
        } else {
            (Action::Wait, Decimal::ZERO)
        };

        tracing::debug!(
            symbol,
            %action,
            %confidence,
            %buy,
            %sell,
            votes = votes.len(),
            "Rule signal"
        );

        RuleSignal {
            symbol: symbol.to_string(),
            action,
            confidence,
            votes,
            price,
        }
    }

    fn votes(&self, price: Decimal, set: &IndicatorSet) -> Vec<IndicatorVote> {
        let w = &self.weights;
        let mut votes = Vec::with_capacity(3);

        if let Some(rsi) = set.rsi {
            if rsi < self.rsi_oversold {
                votes.push(vote(Indicator::Rsi, Action::Buy, w.rsi_weight, rsi));
            } else if rsi > self.rsi_overbought {
                votes.push(vote(Indicator::Rsi, Action::Sell, w.rsi_weight, rsi));
            }
        }

        if let Some(macd) = set.macd {
            if macd.histogram > 0.0 {
                votes.push(vote(Indicator::Macd, Action::Buy, w.macd_weight, macd.histogram));
            } else if macd.histogram < 0.0 {
                votes.push(vote(Indicator::Macd, Action::Sell, w.macd_weight, macd.histogram));
            }
        }

        if let (Some(bands), Some(p)) = (set.bollinger, price.to_f64()) {
            if p <= bands.lower {
                votes.push(vote(Indicator::Bollinger, Action::Buy, w.bollinger_weight, bands.lower));
            } else if p >= bands.upper {
                votes.push(vote(Indicator::Bollinger, Action::Sell, w.bollinger_weight, bands.upper));
            }
        }

        votes
    }
}

fn vote(indicator: Indicator, action: Action, weight: Decimal, value: f64) -> IndicatorVote {
    IndicatorVote {
        indicator,
        action,
        weight,
        value,
    }
}
