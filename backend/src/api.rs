//! Public API surface for the booking backend.
//!
//! This file consolidates the identifier newtypes and the domain types that are
//! serialized directly into HTTP responses.
//! All types derive Serialize/Deserialize for JSON serialization.

pub use crate::models::booking::{Booking, BookingStatus, NewBooking};
pub use crate::models::court::{Court, CourtStatus};
pub use crate::models::slot::{AvailabilityView, SlotGrid, SlotState, SlotView, TimeSlot};
pub use crate::models::user::{NewUser, Role, User};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Court identifier (database primary key).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CourtId(pub i64);

/// Booking identifier (database primary key).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BookingId(pub i64);

/// User identifier (database primary key).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl CourtId {
    pub fn new(value: i64) -> Self {
        CourtId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl BookingId {
    pub fn new(value: i64) -> Self {
        BookingId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl UserId {
    pub fn new(value: i64) -> Self {
        UserId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for CourtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_roundtrip_value() {
        assert_eq!(CourtId::new(2).value(), 2);
        assert_eq!(BookingId::new(17).value(), 17);
        assert_eq!(UserId::new(5).value(), 5);
    }

    #[test]
    fn test_ids_serialize_as_plain_numbers() {
        let json = serde_json::to_string(&BookingId::new(42)).unwrap();
        assert_eq!(json, "42");
        let id: CourtId = serde_json::from_str("1").unwrap();
        assert_eq!(id, CourtId(1));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(UserId::new(9).to_string(), "9");
    }
}
