//! Booking workflows on top of the repository.
//!
//! Each function loads the snapshot the resolver needs, lets
//! [`AvailabilityResolver`] decide, and commits the outcome. The resolver's
//! answer is advisory: two requests can both see a slot as free, so the
//! repository's atomic insert is the final word and its `Conflict` is reported
//! as [`BookingError::SlotAlreadyBooked`].
//!
//! Functions are generic over `R: FullRepository + ?Sized` so they work with a
//! concrete repository in tests and with `Arc<dyn FullRepository>` in the
//! server.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, error, info, warn};

use super::availability::{AvailabilityResolver, BookingError};
use crate::api::{AvailabilityView, Booking, BookingId, BookingStatus, Court, CourtId, UserId};
use crate::db::repository::{FullRepository, RepositoryError};

/// Failure of a booking workflow: either a rule violation the caller can fix
/// or an infrastructure error.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Booking(#[from] BookingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// How often a conditional status write is retried after losing a race.
const STATUS_UPDATE_ATTEMPTS: u32 = 3;

/// Check if the storage backend is reachable.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> bool {
    match repo.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            warn!("health check failed: {}", e);
            false
        }
    }
}

pub async fn list_courts<R: FullRepository + ?Sized>(repo: &R) -> ServiceResult<Vec<Court>> {
    Ok(repo.list_courts().await?)
}

/// Availability grid for one court and day.
///
/// # Returns
/// * `Err(ServiceError::Repository(NotFound))` if the court does not exist
pub async fn availability<R: FullRepository + ?Sized>(
    repo: &R,
    resolver: &AvailabilityResolver,
    court: CourtId,
    date: NaiveDate,
    now: NaiveDateTime,
) -> ServiceResult<AvailabilityView> {
    repo.get_court(court).await?;
    let existing = repo.list_active_bookings(court, date).await?;
    Ok(resolver.compute_availability(court, date, &existing, now))
}

/// Validate and store a booking for `requester`.
pub async fn create_booking<R: FullRepository + ?Sized>(
    repo: &R,
    resolver: &AvailabilityResolver,
    court: CourtId,
    date: NaiveDate,
    start_time: NaiveTime,
    requester: UserId,
    now: NaiveDateTime,
) -> ServiceResult<Booking> {
    let court = match repo.get_court(court).await {
        Ok(found) => found,
        Err(e) if e.is_not_found() => {
            return Err(BookingError::UnknownCourt { court_id: court }.into())
        }
        Err(e) => return Err(e.into()),
    };
    let existing = repo.list_active_bookings(court.id, date).await?;

    let new_booking =
        resolver.validate_booking_request(&court, date, start_time, requester, now, &existing)?;

    match repo.insert_booking(new_booking).await {
        Ok(booking) => {
            info!(
                "booking {} created: court {} on {} at {} for user {}",
                booking.id,
                booking.court_id,
                booking.date,
                booking.start_time.format("%H:%M"),
                booking.user_id
            );
            Ok(booking)
        }
        Err(e) if e.is_conflict() => {
            debug!("lost slot race on insert: {}", e);
            Err(BookingError::SlotAlreadyBooked {
                court_id: court.id,
                date,
                start_time,
            }
            .into())
        }
        Err(e) => {
            error!("failed to store booking: {}", e);
            Err(e.into())
        }
    }
}

/// Cancel one of the requester's own bookings.
///
/// The write is conditional on the status the resolver saw. If another
/// request changed the booking in between, the rules are re-run against the
/// fresh row.
pub async fn cancel_booking<R: FullRepository + ?Sized>(
    repo: &R,
    resolver: &AvailabilityResolver,
    booking_id: BookingId,
    requester: UserId,
    now: NaiveDateTime,
) -> ServiceResult<Booking> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let current = repo.get_booking(booking_id).await?;
        let cancelled = resolver.cancel_booking(booking_id, requester, now, current.as_ref())?;
        let expected = current.map_or(cancelled.status, |b| b.status);

        match repo
            .update_booking_status(cancelled.id, expected, cancelled.status)
            .await
        {
            Ok(stored) => {
                info!("booking {} cancelled by user {}", stored.id, requester);
                return Ok(stored);
            }
            Err(e) if e.is_conflict() && attempt < STATUS_UPDATE_ATTEMPTS => {
                debug!("booking {} changed during cancel, retrying: {}", booking_id, e);
            }
            Err(e) => return Err(not_found_as_booking_error(e, booking_id)),
        }
    }
}

/// Bookings of one user, most recent first.
pub async fn list_user_bookings<R: FullRepository + ?Sized>(
    repo: &R,
    user: UserId,
) -> ServiceResult<Vec<Booking>> {
    Ok(repo.list_bookings_for_user(user).await?)
}

/// Every booking on a date, for the admin overview.
pub async fn list_bookings_on<R: FullRepository + ?Sized>(
    repo: &R,
    date: NaiveDate,
) -> ServiceResult<Vec<Booking>> {
    Ok(repo.list_bookings_on(date).await?)
}

/// Move a booking to `status` on behalf of an administrator.
///
/// Ownership and lead-time rules do not apply; the state machine does. The
/// transition is checked against the row as read and written only if the
/// row still has that status, so a concurrent cancel is never overwritten.
pub async fn set_booking_status<R: FullRepository + ?Sized>(
    repo: &R,
    booking_id: BookingId,
    status: BookingStatus,
) -> ServiceResult<Booking> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let current = repo
            .get_booking(booking_id)
            .await?
            .ok_or(BookingError::NotFound { booking_id })?;

        let next = current.status.transition(status).map_err(BookingError::from)?;

        match repo
            .update_booking_status(booking_id, current.status, next)
            .await
        {
            Ok(stored) => {
                info!(
                    "booking {} moved from {} to {} by admin",
                    booking_id, current.status, stored.status
                );
                return Ok(stored);
            }
            Err(e) if e.is_conflict() => {
                let latest = repo.get_booking(booking_id).await?;
                if latest.map(|b| b.status) == Some(current.status) {
                    // Status unchanged: another active booking holds the slot
                    return Err(BookingError::SlotAlreadyBooked {
                        court_id: current.court_id,
                        date: current.date,
                        start_time: current.start_time,
                    }
                    .into());
                }
                if attempt >= STATUS_UPDATE_ATTEMPTS {
                    return Err(e.into());
                }
                debug!("booking {} changed during status update, retrying", booking_id);
            }
            Err(e) => return Err(not_found_as_booking_error(e, booking_id)),
        }
    }
}

fn not_found_as_booking_error(err: RepositoryError, booking_id: BookingId) -> ServiceError {
    if err.is_not_found() {
        BookingError::NotFound { booking_id }.into()
    } else {
        error!("failed to update booking {}: {}", booking_id, err);
        err.into()
    }
}
