//! Slot availability and booking rule evaluation.
//!
//! [`AvailabilityResolver`] is a pure component: every function takes the
//! relevant bookings snapshot and the club-local "now" as arguments and performs
//! no I/O. Persistence and the final uniqueness guarantee belong to the caller
//! (see [`crate::services::bookings`]).
//!
//! Classification of a slot for a (court, date):
//!
//! 1. an active booking overlaps the slot → [`SlotState::Booked`]
//! 2. the slot has started (same day, start hour ≤ current hour) or the date is
//!    already over → [`SlotState::Past`]
//! 3. otherwise → [`SlotState::Available`]
//!
//! Both `Booked` and `Past` are non-selectable, and
//! [`AvailabilityResolver::validate_booking_request`] rejects exactly the slots
//! that are not `Available`.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::api::{BookingId, CourtId, UserId};
use crate::models::{
    AvailabilityView, Booking, BookingStatus, Court, CourtStatus, InvalidTransition, NewBooking,
    SlotGrid, SlotState, SlotView, TimeSlot, SLOT_MINUTES,
};

/// Club booking policy.
///
/// The club advertises a 24 hour advance-booking rule and a 2 hour
/// cancellation window. Each rule can be switched off independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPolicy {
    #[serde(default = "default_true")]
    pub enforce_advance_notice: bool,
    #[serde(default = "default_advance_notice_hours")]
    pub advance_notice_hours: i64,
    #[serde(default = "default_true")]
    pub enforce_cancellation_window: bool,
    #[serde(default = "default_cancellation_window_hours")]
    pub cancellation_window_hours: i64,
    /// New bookings start as `confirmed` instead of `pending`
    #[serde(default)]
    pub auto_confirm: bool,
}

fn default_true() -> bool {
    true
}

fn default_advance_notice_hours() -> i64 {
    24
}

fn default_cancellation_window_hours() -> i64 {
    2
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            enforce_advance_notice: true,
            advance_notice_hours: default_advance_notice_hours(),
            enforce_cancellation_window: true,
            cancellation_window_hours: default_cancellation_window_hours(),
            auto_confirm: false,
        }
    }
}

impl BookingPolicy {
    /// Policy with both lead-time rules disabled.
    pub fn permissive() -> Self {
        Self {
            enforce_advance_notice: false,
            enforce_cancellation_window: false,
            ..Self::default()
        }
    }

    fn initial_status(&self) -> BookingStatus {
        if self.auto_confirm {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Pending
        }
    }
}

/// Domain rule violations. All are recoverable by choosing different input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("{start_time} is not a bookable slot")]
    InvalidSlot { start_time: NaiveTime },

    /// The requested court does not exist, so no slot on it is bookable.
    #[error("court {court_id} does not exist")]
    UnknownCourt { court_id: CourtId },

    #[error("the {start_time} slot on {date} has already started")]
    SlotInPast { date: NaiveDate, start_time: NaiveTime },

    #[error("court {court_id} is already booked on {date} at {start_time}")]
    SlotAlreadyBooked {
        court_id: CourtId,
        date: NaiveDate,
        start_time: NaiveTime,
    },

    #[error("bookings must be made at least {required_hours} hours in advance")]
    AdvanceNotice { required_hours: i64 },

    #[error("bookings can only be cancelled up to {required_hours} hours before the start")]
    CancellationWindow { required_hours: i64 },

    #[error("booking {booking_id} not found")]
    NotFound { booking_id: BookingId },

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("court {court_id} is not open for booking ({status})")]
    CourtUnavailable {
        court_id: CourtId,
        status: CourtStatus,
    },
}

impl BookingError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::InvalidSlot { .. } | BookingError::UnknownCourt { .. } => "INVALID_SLOT",
            BookingError::SlotInPast { .. } => "SLOT_IN_PAST",
            BookingError::SlotAlreadyBooked { .. } => "SLOT_ALREADY_BOOKED",
            BookingError::AdvanceNotice { .. } => "ADVANCE_NOTICE",
            BookingError::CancellationWindow { .. } => "CANCELLATION_WINDOW",
            BookingError::NotFound { .. } => "NOT_FOUND",
            BookingError::InvalidTransition(_) => "INVALID_TRANSITION",
            BookingError::CourtUnavailable { .. } => "COURT_UNAVAILABLE",
        }
    }
}

/// Computes slot states and evaluates booking requests against the club rules.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityResolver {
    grid: SlotGrid,
    policy: BookingPolicy,
}

impl AvailabilityResolver {
    pub fn new(grid: SlotGrid, policy: BookingPolicy) -> Self {
        Self { grid, policy }
    }

    pub fn grid(&self) -> &SlotGrid {
        &self.grid
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Availability of every grid slot for `court` on `date`.
    ///
    /// `existing` may contain bookings for other courts, dates or cancelled rows;
    /// only active bookings matching the court and date count.
    pub fn compute_availability(
        &self,
        court: CourtId,
        date: NaiveDate,
        existing: &[Booking],
        now: NaiveDateTime,
    ) -> AvailabilityView {
        let slots = self
            .grid
            .slots()
            .into_iter()
            .map(|slot| SlotView {
                start_time: slot.start,
                state: self.classify(court, date, &slot, existing, now),
                is_prime_time: slot.is_prime_time,
            })
            .collect();

        AvailabilityView {
            court_id: court,
            date,
            slots,
        }
    }

    /// State of a single slot.
    pub fn classify(
        &self,
        court: CourtId,
        date: NaiveDate,
        slot: &TimeSlot,
        existing: &[Booking],
        now: NaiveDateTime,
    ) -> SlotState {
        if is_booked(court, date, slot, existing) {
            SlotState::Booked
        } else if is_past(date, slot, now) {
            SlotState::Past
        } else {
            SlotState::Available
        }
    }

    /// Check a booking request and build the booking to persist.
    ///
    /// The result is not stored; the storage layer must still enforce slot
    /// exclusivity when committing.
    pub fn validate_booking_request(
        &self,
        court: &Court,
        date: NaiveDate,
        start_time: NaiveTime,
        requester: UserId,
        now: NaiveDateTime,
        existing: &[Booking],
    ) -> Result<NewBooking, BookingError> {
        if !court.is_bookable() {
            return Err(BookingError::CourtUnavailable {
                court_id: court.id,
                status: court.status,
            });
        }

        let slot = self
            .grid
            .slot_at(start_time)
            .ok_or(BookingError::InvalidSlot { start_time })?;

        match self.classify(court.id, date, &slot, existing, now) {
            SlotState::Booked => {
                return Err(BookingError::SlotAlreadyBooked {
                    court_id: court.id,
                    date,
                    start_time,
                })
            }
            SlotState::Past => return Err(BookingError::SlotInPast { date, start_time }),
            SlotState::Available => {}
        }

        if self.policy.enforce_advance_notice {
            let lead = slot.starts_at(date) - now;
            if lead < Duration::hours(self.policy.advance_notice_hours) {
                return Err(BookingError::AdvanceNotice {
                    required_hours: self.policy.advance_notice_hours,
                });
            }
        }

        Ok(NewBooking {
            court_id: court.id,
            user_id: requester,
            date,
            start_time: slot.start,
            duration_minutes: SLOT_MINUTES as i32,
            status: self.policy.initial_status(),
            is_prime_time: slot.is_prime_time,
        })
    }

    /// Cancel a booking on behalf of `requester`.
    ///
    /// A booking owned by someone else is reported exactly like a missing one.
    pub fn cancel_booking(
        &self,
        booking_id: BookingId,
        requester: UserId,
        now: NaiveDateTime,
        booking: Option<&Booking>,
    ) -> Result<Booking, BookingError> {
        let booking = booking
            .filter(|b| b.id == booking_id && b.user_id == requester)
            .ok_or(BookingError::NotFound { booking_id })?;

        let status = booking.status.transition(BookingStatus::Cancelled)?;

        if self.policy.enforce_cancellation_window {
            let lead = booking.starts_at() - now;
            if lead < Duration::hours(self.policy.cancellation_window_hours) {
                return Err(BookingError::CancellationWindow {
                    required_hours: self.policy.cancellation_window_hours,
                });
            }
        }

        let mut cancelled = booking.clone();
        cancelled.status = status;
        Ok(cancelled)
    }
}

fn is_booked(court: CourtId, date: NaiveDate, slot: &TimeSlot, existing: &[Booking]) -> bool {
    let slot_start = slot.starts_at(date);
    let slot_end = slot_start + Duration::minutes(SLOT_MINUTES);
    existing.iter().any(|b| {
        if !b.is_active() || b.court_id != court {
            return false;
        }
        let start = b.starts_at();
        let end = start + Duration::minutes(i64::from(b.duration_minutes.max(1)));
        start < slot_end && slot_start < end
    })
}

fn is_past(date: NaiveDate, slot: &TimeSlot, now: NaiveDateTime) -> bool {
    let today = now.date();
    if date < today {
        return true;
    }
    date == today && slot.hour() <= now.hour()
}
