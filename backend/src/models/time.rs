//! Club-local time handling.
//!
//! The booking rules are all expressed in the club's wall-clock time. Nothing in
//! the core reads the system clock; callers obtain "now" from a [`Clock`] and
//! convert it with the configured [`ClubTimezone`].

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant. Used by tests and replay tooling.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Fixed UTC offset of the club's location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubTimezone {
    /// Minutes east of UTC (Kampala is +180)
    pub utc_offset_minutes: i32,
}

impl Default for ClubTimezone {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 180,
        }
    }
}

impl ClubTimezone {
    pub fn new(utc_offset_minutes: i32) -> Self {
        Self { utc_offset_minutes }
    }

    /// Club-local wall-clock time for an instant.
    ///
    /// Offsets outside ±24h are clamped to UTC.
    pub fn local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        let offset = FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or(Utc.fix());
        instant.with_timezone(&offset).naive_local()
    }

    /// Today's date at the club.
    pub fn today(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.local(instant).date()
    }
}

/// Serde helpers rendering [`NaiveTime`] as `"HH:MM"`.
///
/// Deserialization also accepts `"HH:MM:SS"`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_hhmm(&raw).map_err(serde::de::Error::custom)
    }
}

/// Parse `"HH:MM"` or `"HH:MM:SS"`.
pub fn parse_hhmm(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{}', expected HH:MM", raw))
}
