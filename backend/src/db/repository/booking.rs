//! Booking repository trait.
//!
//! The resolver decides whether a slot looks free; the repository is the
//! final authority. `insert_booking` must check and insert under a single
//! lock or transaction so that two concurrent requests for the same slot can
//! never both succeed.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::api::{Booking, BookingId, BookingStatus, CourtId, NewBooking, UserId};

/// Repository trait for booking storage.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Persist a validated booking.
    ///
    /// # Arguments
    /// * `booking` - The booking produced by the resolver
    ///
    /// # Returns
    /// * `Ok(Booking)` - The stored booking with its assigned id
    /// * `Err(RepositoryError::Conflict)` - If an active booking already holds
    ///   the same court, date and start time
    async fn insert_booking(&self, booking: NewBooking) -> RepositoryResult<Booking>;

    /// Fetch a booking by id.
    ///
    /// # Returns
    /// * `Ok(Some(Booking))` - The booking if it exists
    /// * `Ok(None)` - If no booking has this id
    async fn get_booking(&self, id: BookingId) -> RepositoryResult<Option<Booking>>;

    /// All bookings made by `user`, most recent date first.
    async fn list_bookings_for_user(&self, user: UserId) -> RepositoryResult<Vec<Booking>>;

    /// Bookings that occupy their slot (any status but cancelled) for one
    /// court on one date.
    ///
    /// This is the snapshot the resolver classifies slots against.
    async fn list_active_bookings(
        &self,
        court: CourtId,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<Booking>>;

    /// Every booking on `date` across all courts, in any status.
    async fn list_bookings_on(&self, date: NaiveDate) -> RepositoryResult<Vec<Booking>>;

    /// Move a booking from `expected` to `status`.
    ///
    /// This is a compare-and-set: the write only happens if the stored status
    /// still equals `expected`, checked under the same lock or transaction as
    /// the write. When `status` occupies the slot and `expected` did not, the
    /// slot must also be free of other active bookings. Transition rules are
    /// enforced by the caller.
    ///
    /// # Returns
    /// * `Ok(Booking)` - The updated booking
    /// * `Err(RepositoryError::NotFound)` - If no booking has this id
    /// * `Err(RepositoryError::Conflict)` - If the stored status is no longer
    ///   `expected`, or another active booking holds the slot
    async fn update_booking_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        status: BookingStatus,
    ) -> RepositoryResult<Booking>;
}
