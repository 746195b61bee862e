//! Trading session context
//!
//! Maps a UTC instant to the active market session and the risk multiplier
//! the pipeline may scale confidence by.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Market session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Session {
    /// 00:00-08:00 UTC
    Asia,
    /// 08:00-17:00 UTC outside the overlap
    Europe,
    /// 13:00-16:00 UTC, Europe and US both open
    Overlap,
    /// 17:00-24:00 UTC
    Us,
    Weekend,
}

/// Active session and its risk multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session: Session,
    pub risk_multiplier: Decimal,
}

/// Read-only view of the current trading session
pub trait SessionContext: Send + Sync {
    fn current(&self, now: DateTime<Utc>) -> SessionInfo;
}

/// Fixed UTC-hour session calendar
#[derive(Debug, Clone, Copy, Default)]
pub struct UtcSessionCalendar;

impl UtcSessionCalendar {
    pub fn session_at(now: DateTime<Utc>) -> Session {
        if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
            return Session::Weekend;
        }
        match now.hour() {
            0..=7 => Session::Asia,
            13..=15 => Session::Overlap,
            8..=16 => Session::Europe,
            _ => Session::Us,
        }
    }

    pub fn multiplier(session: Session) -> Decimal {
        match session {
            Session::Asia => dec!(1.0),
            Session::Europe => dec!(1.2),
            Session::Overlap => dec!(1.5),
            Session::Us => dec!(1.3),
            Session::Weekend => dec!(0.5),
        }
    }
}

impl SessionContext for UtcSessionCalendar {
    fn current(&self, now: DateTime<Utc>) -> SessionInfo {
        let session = Self::session_at(now);
        SessionInfo {
            session,
            risk_multiplier: Self::multiplier(session),
        }
    }
}
