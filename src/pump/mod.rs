//! Pump detection module
//!
//! Flags abnormally fast, volume-confirmed price rises over short windows,
//! independently of the indicator path. Each symbol fires at most once per
//! cooldown window.

mod detector;
mod store;
mod types;

pub use detector::PumpDetector;
pub use store::PumpHistoryStore;
pub use types::{PumpClass, PumpEvent, PumpMetrics, PumpStatistics, RiskFlag, VolumeTrend};
