//! Signal generation module
//!
//! Turns indicator readings into weighted-vote rule signals and defines the
//! opinion types the consensus stage consumes.

mod rules;
mod types;

pub use rules::RuleSignalGenerator;
pub use types::{Action, AiSignal, Indicator, IndicatorVote, RuleSignal, RULE_SOURCE};
