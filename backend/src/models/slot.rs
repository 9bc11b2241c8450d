//! The fixed daily slot grid and derived availability types.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::time::hhmm;
use crate::api::CourtId;

/// Length of every slot (and therefore of every booking), in minutes.
pub const SLOT_MINUTES: i64 = 60;

/// Half-open hour range `[start_hour, end_hour)` with prime-time pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimeWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl PrimeWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }
}

/// One hour-long slot of the daily grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    pub is_prime_time: bool,
}

impl TimeSlot {
    pub fn hour(&self) -> u32 {
        self.start.hour()
    }

    /// End of the slot. Wraps past midnight for a 23:00 slot.
    pub fn end(&self) -> NaiveTime {
        self.start + Duration::minutes(SLOT_MINUTES)
    }

    /// Club-local instant at which this slot starts on `date`.
    pub fn starts_at(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.start)
    }

    /// Twelve-hour label such as `"3:00 PM"`.
    pub fn label(&self) -> String {
        self.start.format("%-I:%M %p").to_string()
    }
}

/// Operating hours and prime-time windows.
///
/// Slots start on every full hour from `opening_hour` up to, but not including,
/// `closing_hour`. The prime-time flag depends on the start hour only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotGrid {
    #[serde(default = "default_opening_hour")]
    pub opening_hour: u32,
    #[serde(default = "default_closing_hour")]
    pub closing_hour: u32,
    #[serde(default = "default_prime_windows")]
    pub prime_windows: Vec<PrimeWindow>,
}

fn default_opening_hour() -> u32 {
    8
}

fn default_closing_hour() -> u32 {
    22
}

fn default_prime_windows() -> Vec<PrimeWindow> {
    vec![PrimeWindow::new(8, 12), PrimeWindow::new(15, 18)]
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self {
            opening_hour: default_opening_hour(),
            closing_hour: default_closing_hour(),
            prime_windows: default_prime_windows(),
        }
    }
}

impl SlotGrid {
    /// Whether a slot starting at `hour` is prime time.
    pub fn is_prime(&self, hour: u32) -> bool {
        self.prime_windows.iter().any(|w| w.contains(hour))
    }

    /// All slots of a day, in chronological order.
    pub fn slots(&self) -> Vec<TimeSlot> {
        (self.opening_hour..self.closing_hour.min(24))
            .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
            .map(|start| TimeSlot {
                start,
                is_prime_time: self.is_prime(start.hour()),
            })
            .collect()
    }

    /// The grid slot starting exactly at `start`, if any.
    pub fn slot_at(&self, start: NaiveTime) -> Option<TimeSlot> {
        if start.minute() != 0 || start.second() != 0 || start.nanosecond() != 0 {
            return None;
        }
        let hour = start.hour();
        if hour < self.opening_hour || hour >= self.closing_hour {
            return None;
        }
        Some(TimeSlot {
            start,
            is_prime_time: self.is_prime(hour),
        })
    }

    pub fn len(&self) -> usize {
        self.closing_hour.min(24).saturating_sub(self.opening_hour) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Classification of a slot for one court and date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Available,
    Booked,
    Past,
}

impl SlotState {
    pub fn is_selectable(&self) -> bool {
        matches!(self, SlotState::Available)
    }
}

/// One row of the availability view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    pub state: SlotState,
    pub is_prime_time: bool,
}

/// Availability of every grid slot for one (court, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityView {
    pub court_id: CourtId,
    pub date: NaiveDate,
    pub slots: Vec<SlotView>,
}

impl AvailabilityView {
    /// State of the slot starting at `start`, if it is on the grid.
    pub fn state_of(&self, start: NaiveTime) -> Option<SlotState> {
        self.slots
            .iter()
            .find(|s| s.start_time == start)
            .map(|s| s.state)
    }

    pub fn count(&self, state: SlotState) -> usize {
        self.slots.iter().filter(|s| s.state == state).count()
    }
}
