//! Confidence-weighted consensus
//!
//! Every source scores `confidence * weight` for the action it votes. The
//! highest total wins; a tie at the top between different actions falls back
//! to WAIT. Ballots are sorted by (source, action, confidence, rationale)
//! before any arithmetic or text assembly so the result does not depend on
//! input order.

use super::types::AggregatedSignal;
use crate::config::ConsensusConfig;
use crate::signal::{Action, AiSignal, RuleSignal, RULE_SOURCE};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
struct Ballot {
    source: String,
    action: Action,
    confidence: Decimal,
    weight: Decimal,
    rationale: String,
}

impl Ballot {
    fn describe(&self) -> String {
        if self.rationale.is_empty() {
            format!("{} {} {}", self.source, self.action, self.confidence)
        } else {
            format!(
                "{} {} {} ({})",
                self.source, self.action, self.confidence, self.rationale
            )
        }
    }
}

/// Merges the rule signal with model opinions
#[derive(Debug, Clone)]
pub struct ConsensusAggregator {
    config: ConsensusConfig,
}

impl ConsensusAggregator {
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    /// Aggregate all opinions about `symbol`
    ///
    /// Opinions about other symbols are ignored. Returns `None` when nothing
    /// remains to aggregate.
    pub fn aggregate(
        &self,
        symbol: &str,
        rule: Option<&RuleSignal>,
        opinions: &[AiSignal],
    ) -> Option<AggregatedSignal> {
        let rule = rule.filter(|r| r.symbol == symbol);
        let opinions: Vec<&AiSignal> = opinions.iter().filter(|o| o.symbol == symbol).collect();

        if opinions.is_empty() {
            return rule.map(|r| AggregatedSignal {
                symbol: symbol.to_string(),
                action: r.action,
                confidence: r.confidence,
                agreeing_sources: 1,
                sources: vec![RULE_SOURCE.to_string()],
                scores: BTreeMap::from([(r.action, r.confidence)]),
                rationale: format!("{RULE_SOURCE} {} {} ({})", r.action, r.confidence, r.rationale()),
            });
        }

        let mut ballots: Vec<Ballot> = rule
            .map(|r| Ballot {
                source: RULE_SOURCE.to_string(),
                action: r.action,
                confidence: r.confidence,
                weight: self.config.rule_weight,
                rationale: r.rationale(),
            })
            .into_iter()
            .chain(opinions.iter().map(|o| Ballot {
                source: o.source.clone(),
                action: o.action,
                confidence: o.confidence.clamp(Decimal::ZERO, Decimal::ONE),
                weight: self.config.model_weight,
                rationale: o.rationale.trim().to_string(),
            }))
            .collect();
        ballots.sort_by(|a, b| {
            (&a.source, a.action, a.confidence, &a.rationale)
                .cmp(&(&b.source, b.action, b.confidence, &b.rationale))
        });

        let mut scores: BTreeMap<Action, Decimal> = BTreeMap::new();
        for ballot in &ballots {
            *scores.entry(ballot.action).or_default() += ballot.confidence * ballot.weight;
        }

        let top = scores.values().copied().max().unwrap_or_default();
        let leaders: Vec<Action> = scores
            .iter()
            .filter(|(_, score)| **score == top)
            .map(|(action, _)| *action)
            .collect();

        let sources: Vec<String> = ballots
            .iter()
            .map(|b| b.source.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let (action, confidence, agreeing_sources) = match leaders.as_slice() {
            [winner] => {
                let voters: Vec<&Ballot> = ballots.iter().filter(|b| b.action == *winner).collect();
                let agreeing = voters
                    .iter()
                    .map(|b| b.source.as_str())
                    .collect::<BTreeSet<_>>()
                    .len();

                let mut confidence = weighted_mean(&voters);
                if agreeing >= 2 {
                    confidence += self.config.agreement_bonus;
                }
                (*winner, confidence.min(Decimal::ONE), agreeing)
            }
            _ => {
                let tied: Vec<&Ballot> = ballots
                    .iter()
                    .filter(|b| leaders.contains(&b.action))
                    .collect();
                let confidence = (mean(&tied) - self.config.disagreement_penalty).max(Decimal::ZERO);
                tracing::debug!(symbol, ?leaders, "Sources split evenly, falling back to WAIT");
                (Action::Wait, confidence, 0)
            }
        };

        let rationale = ballots
            .iter()
            .map(Ballot::describe)
            .collect::<Vec<_>>()
            .join("; ");

        Some(AggregatedSignal {
            symbol: symbol.to_string(),
            action,
            confidence,
            agreeing_sources,
            sources,
            scores,
            rationale,
        })
    }
}

fn mean(ballots: &[&Ballot]) -> Decimal {
    if ballots.is_empty() {
        return Decimal::ZERO;
    }
    let total: Decimal = ballots.iter().map(|b| b.confidence).sum();
    total / Decimal::from(ballots.len())
}

/// Weight-averaged confidence; plain mean when all weights are zero
fn weighted_mean(ballots: &[&Ballot]) -> Decimal {
    let weight: Decimal = ballots.iter().map(|b| b.weight).sum();
    if weight.is_zero() {
        return mean(ballots);
    }
    let weighted: Decimal = ballots.iter().map(|b| b.confidence * b.weight).sum();
    weighted / weight
}
