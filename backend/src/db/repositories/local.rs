//! In-memory local repository implementation.
//!
//! All data lives in `HashMap`s behind one `parking_lot::RwLock`, which makes
//! the repository fast, deterministic and isolated for tests and local
//! development. The slot check in `insert_booking` and the insert itself run
//! under the same write guard, so concurrent requests for one slot are
//! serialized and only the first one wins.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::{
    Booking, BookingId, BookingStatus, Court, CourtId, NewBooking, NewUser, User, UserId,
};
use crate::db::repository::*;
use crate::models::default_courts;

/// In-memory local repository.
///
/// Cloning is cheap and every clone shares the same data.
///
/// # Example
/// ```
/// use court_booking::db::repositories::LocalRepository;
/// use court_booking::db::CourtRepository;
///
/// # tokio_test_block_on(async {
/// let repo = LocalRepository::new();
/// let courts = repo.list_courts().await.unwrap();
/// assert_eq!(courts.len(), 2);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    courts: HashMap<CourtId, Court>,
    bookings: HashMap<BookingId, Booking>,
    users: HashMap<UserId, User>,

    // ID counters
    next_booking_id: i64,
    next_user_id: i64,

    // Connection health
    is_healthy: bool,
}

impl LocalData {
    fn with_courts(courts: Vec<Court>) -> Self {
        Self {
            courts: courts.into_iter().map(|c| (c.id, c)).collect(),
            bookings: HashMap::new(),
            users: HashMap::new(),
            next_booking_id: 1,
            next_user_id: 1,
            is_healthy: true,
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalRepository {
    /// Create a repository seeded with the club's two default courts.
    pub fn new() -> Self {
        Self::with_courts(default_courts())
    }

    /// Create a repository seeded with the given courts.
    pub fn with_courts(courts: Vec<Court>) -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::with_courts(courts))),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Replace or add a court. Used to put courts into maintenance in tests.
    pub fn upsert_court(&self, court: Court) {
        self.data.write().courts.insert(court.id, court);
    }

    /// Number of stored bookings in any status.
    pub fn booking_count(&self) -> usize {
        self.data.read().bookings.len()
    }

    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if self.data.read().is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection(
                "Repository is unhealthy",
                ErrorContext::new(operation),
            ))
        }
    }
}

#[async_trait]
impl CourtRepository for LocalRepository {
    async fn list_courts(&self) -> RepositoryResult<Vec<Court>> {
        self.check_health("list_courts")?;
        let data = self.data.read();
        let mut courts: Vec<Court> = data.courts.values().cloned().collect();
        courts.sort_by_key(|c| c.id);
        Ok(courts)
    }

    async fn get_court(&self, id: CourtId) -> RepositoryResult<Court> {
        self.check_health("get_court")?;
        self.data.read().courts.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found(
                format!("Court {} not found", id),
                ErrorContext::new("get_court")
                    .with_entity("court")
                    .with_entity_id(id),
            )
        })
    }
}

#[async_trait]
impl BookingRepository for LocalRepository {
    async fn insert_booking(&self, booking: NewBooking) -> RepositoryResult<Booking> {
        self.check_health("insert_booking")?;
        let mut data = self.data.write();

        let taken = data
            .bookings
            .values()
            .any(|b| b.occupies(booking.court_id, booking.date, booking.start_time));
        if taken {
            return Err(RepositoryError::conflict(
                format!(
                    "Court {} is already booked on {} at {}",
                    booking.court_id,
                    booking.date,
                    booking.start_time.format("%H:%M")
                ),
                ErrorContext::new("insert_booking").with_entity("booking"),
            ));
        }

        let id = BookingId::new(data.next_booking_id);
        data.next_booking_id += 1;

        let stored = Booking::from_new(id, booking, Utc::now());
        data.bookings.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_booking(&self, id: BookingId) -> RepositoryResult<Option<Booking>> {
        self.check_health("get_booking")?;
        Ok(self.data.read().bookings.get(&id).cloned())
    }

    async fn list_bookings_for_user(&self, user: UserId) -> RepositoryResult<Vec<Booking>> {
        self.check_health("list_bookings_for_user")?;
        let data = self.data.read();
        let mut bookings: Vec<Booking> = data
            .bookings
            .values()
            .filter(|b| b.user_id == user)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(b.start_time.cmp(&a.start_time))
                .then(a.id.cmp(&b.id))
        });
        Ok(bookings)
    }

    async fn list_active_bookings(
        &self,
        court: CourtId,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<Booking>> {
        self.check_health("list_active_bookings")?;
        let data = self.data.read();
        let mut bookings: Vec<Booking> = data
            .bookings
            .values()
            .filter(|b| b.is_active() && b.court_id == court && b.date == date)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.start_time);
        Ok(bookings)
    }

    async fn list_bookings_on(&self, date: NaiveDate) -> RepositoryResult<Vec<Booking>> {
        self.check_health("list_bookings_on")?;
        let data = self.data.read();
        let mut bookings: Vec<Booking> = data
            .bookings
            .values()
            .filter(|b| b.date == date)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.court_id, b.start_time, b.id));
        Ok(bookings)
    }

    async fn update_booking_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        status: BookingStatus,
    ) -> RepositoryResult<Booking> {
        self.check_health("update_booking_status")?;
        let mut data = self.data.write();
        let context = || {
            ErrorContext::new("update_booking_status")
                .with_entity("booking")
                .with_entity_id(id)
        };

        let current = data.bookings.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found(format!("Booking {} not found", id), context())
        })?;

        if current.status != expected {
            return Err(RepositoryError::conflict(
                format!(
                    "Booking {} is {}, expected {}",
                    id, current.status, expected
                ),
                context(),
            ));
        }

        if status.is_active() && !current.status.is_active() {
            let taken = data.bookings.values().any(|b| {
                b.id != id && b.occupies(current.court_id, current.date, current.start_time)
            });
            if taken {
                return Err(RepositoryError::conflict(
                    format!(
                        "Court {} is already booked on {} at {}",
                        current.court_id,
                        current.date,
                        current.start_time.format("%H:%M")
                    ),
                    context(),
                ));
            }
        }

        let mut updated = current;
        updated.status = status;
        updated.updated_at = Utc::now();
        data.bookings.insert(id, updated.clone());
        Ok(updated)
    }
}

#[async_trait]
impl UserRepository for LocalRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        self.check_health("create_user")?;
        let mut data = self.data.write();
        let email = user.email.trim().to_lowercase();

        if data.users.values().any(|u| u.email == email) {
            return Err(RepositoryError::conflict(
                "Email is already registered",
                ErrorContext::new("create_user").with_entity("user"),
            ));
        }

        let id = UserId::new(data.next_user_id);
        data.next_user_id += 1;

        let stored = User {
            id,
            email,
            full_name: user.full_name,
            role: user.role,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        data.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.check_health("get_user")?;
        Ok(self.data.read().users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        self.check_health("get_user_by_email")?;
        let email = email.trim().to_lowercase();
        Ok(self
            .data
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }
}
