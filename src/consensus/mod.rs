//! Consensus module
//!
//! Fuses the rule signal with model opinions into one aggregated signal, and
//! collects those opinions from external sources under a per-call timeout.

mod aggregator;
mod source;
mod types;

pub use aggregator::ConsensusAggregator;
pub use source::{collect_opinions, ModelSignalSource};
pub use types::AggregatedSignal;
