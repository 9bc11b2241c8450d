use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;

use super::schema::{bookings, courts, users};
use crate::api::{
    Booking, BookingId, BookingStatus, Court, CourtId, CourtStatus, NewBooking, NewUser, Role,
    User, UserId,
};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = courts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CourtRow {
    pub court_id: i64,
    pub name: String,
    pub surface: Option<String>,
    pub status: String,
}

impl CourtRow {
    pub fn from_court(court: &Court) -> Self {
        Self {
            court_id: court.id.value(),
            name: court.name.clone(),
            surface: court.surface.clone(),
            status: court.status.as_str().to_string(),
        }
    }

    pub fn into_court(self) -> RepositoryResult<Court> {
        let status: CourtStatus = self.status.parse().map_err(|e: String| {
            RepositoryError::internal(
                e,
                ErrorContext::new("decode_court").with_entity_id(self.court_id),
            )
        })?;
        Ok(Court {
            id: CourtId::new(self.court_id),
            name: self.name,
            surface: self.surface,
            status,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub user_id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.user_id),
            email: row.email,
            full_name: row.full_name,
            role: Role::from_stored(&row.role),
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub password_hash: String,
}

impl From<NewUser> for NewUserRow {
    fn from(user: NewUser) -> Self {
        Self {
            email: user.email.trim().to_lowercase(),
            full_name: user.full_name,
            role: user.role.as_str().to_string(),
            password_hash: user.password_hash,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BookingRow {
    pub booking_id: i64,
    pub court_id: i64,
    pub user_id: i64,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: String,
    pub is_prime_time: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRow {
    pub fn into_booking(self) -> RepositoryResult<Booking> {
        let status: BookingStatus = self.status.parse().map_err(|e: String| {
            RepositoryError::internal(
                e,
                ErrorContext::new("decode_booking").with_entity_id(self.booking_id),
            )
        })?;
        Ok(Booking {
            id: BookingId::new(self.booking_id),
            court_id: CourtId::new(self.court_id),
            user_id: UserId::new(self.user_id),
            date: self.booking_date,
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
            status,
            is_prime_time: self.is_prime_time,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct NewBookingRow {
    pub court_id: i64,
    pub user_id: i64,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: String,
    pub is_prime_time: bool,
}

impl From<NewBooking> for NewBookingRow {
    fn from(booking: NewBooking) -> Self {
        Self {
            court_id: booking.court_id.value(),
            user_id: booking.user_id.value(),
            booking_date: booking.date,
            start_time: booking.start_time,
            duration_minutes: booking.duration_minutes,
            status: booking.status.as_str().to_string(),
            is_prime_time: booking.is_prime_time,
        }
    }
}

pub fn rows_to_bookings(rows: Vec<BookingRow>) -> RepositoryResult<Vec<Booking>> {
    rows.into_iter().map(BookingRow::into_booking).collect()
}
