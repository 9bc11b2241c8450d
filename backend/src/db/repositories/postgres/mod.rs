//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry with exponential backoff for transient failures
//! - Automatic migration execution
//! - Slot exclusivity enforced by the partial unique index
//!   `bookings_active_slot_key`; violations surface as
//!   [`RepositoryError::Conflict`]
//!
//! ## Configuration
//!
//! [`PostgresConfig`] is built from the `[repository]` and `[postgres]`
//! sections of the club configuration (see `db::repo_config`). The
//! `DATABASE_URL` override is applied there.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::api::{
    Booking, BookingId, BookingStatus, Court, CourtId, NewBooking, NewUser, User, UserId,
};
use crate::db::repository::{
    BookingRepository, CourtRepository, ErrorContext, RepositoryError, RepositoryResult,
    UserRepository,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
                RepositoryError::internal(
                    format!("Migration failed: {}", e),
                    ErrorContext::new("run_migrations"),
                )
            })?;
        }

        Ok(Self { pool, config })
    }

    /// Insert or update the configured courts so the table mirrors the club
    /// configuration.
    pub async fn sync_courts(&self, configured: Vec<Court>) -> RepositoryResult<usize> {
        self.with_conn(move |conn| {
            let rows: Vec<CourtRow> = configured.iter().map(CourtRow::from_court).collect();
            diesel::insert_into(courts::table)
                .values(&rows)
                .on_conflict(courts::court_id)
                .do_update()
                .set((
                    courts::name.eq(excluded(courts::name)),
                    courts::surface.eq(excluded(courts::surface)),
                    courts::status.eq(excluded(courts::status)),
                ))
                .execute(conn)
                .map_err(RepositoryError::from)
        })
        .await
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// The operation runs on the blocking pool and is retried up to
    /// `max_retries` times when the error is retryable, doubling the delay
    /// between attempts.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    log::warn!("retrying database operation (attempt {})", attempt + 1);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal(
                    "Max retries exceeded with no error captured",
                    ErrorContext::new("with_conn"),
                )
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

#[async_trait]
impl CourtRepository for PostgresRepository {
    async fn list_courts(&self) -> RepositoryResult<Vec<Court>> {
        self.with_conn(|conn| {
            let rows: Vec<CourtRow> = courts::table
                .select(CourtRow::as_select())
                .order(courts::court_id.asc())
                .load(conn)?;
            rows.into_iter().map(CourtRow::into_court).collect()
        })
        .await
        .map_err(|e| e.with_operation("list_courts"))
    }

    async fn get_court(&self, id: CourtId) -> RepositoryResult<Court> {
        self.with_conn(move |conn| {
            let row: Option<CourtRow> = courts::table
                .find(id.value())
                .select(CourtRow::as_select())
                .first(conn)
                .optional()?;
            match row {
                Some(row) => row.into_court(),
                None => Err(RepositoryError::not_found(
                    format!("Court {} not found", id),
                    ErrorContext::new("get_court")
                        .with_entity("court")
                        .with_entity_id(id),
                )),
            }
        })
        .await
    }
}

#[async_trait]
impl BookingRepository for PostgresRepository {
    async fn insert_booking(&self, booking: NewBooking) -> RepositoryResult<Booking> {
        let row = NewBookingRow::from(booking);
        self.with_conn(move |conn| {
            let stored: BookingRow = diesel::insert_into(bookings::table)
                .values(&row)
                .returning(BookingRow::as_returning())
                .get_result(conn)?;
            stored.into_booking()
        })
        .await
        .map_err(|e| e.with_operation("insert_booking"))
    }

    async fn get_booking(&self, id: BookingId) -> RepositoryResult<Option<Booking>> {
        self.with_conn(move |conn| {
            let row: Option<BookingRow> = bookings::table
                .find(id.value())
                .select(BookingRow::as_select())
                .first(conn)
                .optional()?;
            row.map(BookingRow::into_booking).transpose()
        })
        .await
    }

    async fn list_bookings_for_user(&self, user: UserId) -> RepositoryResult<Vec<Booking>> {
        self.with_conn(move |conn| {
            let rows: Vec<BookingRow> = bookings::table
                .filter(bookings::user_id.eq(user.value()))
                .order((
                    bookings::booking_date.desc(),
                    bookings::start_time.desc(),
                    bookings::booking_id.asc(),
                ))
                .select(BookingRow::as_select())
                .load(conn)?;
            rows_to_bookings(rows)
        })
        .await
    }

    async fn list_active_bookings(
        &self,
        court: CourtId,
        date: NaiveDate,
    ) -> RepositoryResult<Vec<Booking>> {
        self.with_conn(move |conn| {
            let rows: Vec<BookingRow> = bookings::table
                .filter(bookings::court_id.eq(court.value()))
                .filter(bookings::booking_date.eq(date))
                .filter(bookings::status.ne(BookingStatus::Cancelled.as_str()))
                .order(bookings::start_time.asc())
                .select(BookingRow::as_select())
                .load(conn)?;
            rows_to_bookings(rows)
        })
        .await
    }

    async fn list_bookings_on(&self, date: NaiveDate) -> RepositoryResult<Vec<Booking>> {
        self.with_conn(move |conn| {
            let rows: Vec<BookingRow> = bookings::table
                .filter(bookings::booking_date.eq(date))
                .order((
                    bookings::court_id.asc(),
                    bookings::start_time.asc(),
                    bookings::booking_id.asc(),
                ))
                .select(BookingRow::as_select())
                .load(conn)?;
            rows_to_bookings(rows)
        })
        .await
    }

    async fn update_booking_status(
        &self,
        id: BookingId,
        expected: BookingStatus,
        status: BookingStatus,
    ) -> RepositoryResult<Booking> {
        self.with_conn(move |conn| {
            let context = || {
                ErrorContext::new("update_booking_status")
                    .with_entity("booking")
                    .with_entity_id(id)
            };

            // A reactivated slot that collides with another active booking
            // fails on bookings_active_slot_key and maps to Conflict.
            let row: Option<BookingRow> = diesel::update(
                bookings::table
                    .find(id.value())
                    .filter(bookings::status.eq(expected.as_str())),
            )
            .set((
                bookings::status.eq(status.as_str()),
                bookings::updated_at.eq(Utc::now()),
            ))
            .returning(BookingRow::as_returning())
            .get_result(conn)
            .optional()?;

            if let Some(row) = row {
                return row.into_booking();
            }

            let stored: Option<String> = bookings::table
                .find(id.value())
                .select(bookings::status)
                .first(conn)
                .optional()?;
            match stored {
                Some(actual) => Err(RepositoryError::conflict(
                    format!("Booking {} is {}, expected {}", id, actual, expected),
                    context(),
                )),
                None => Err(RepositoryError::not_found(
                    format!("Booking {} not found", id),
                    context(),
                )),
            }
        })
        .await
        .map_err(|e| e.with_operation("update_booking_status"))
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        let row = NewUserRow::from(user);
        self.with_conn(move |conn| {
            let stored: UserRow = diesel::insert_into(users::table)
                .values(&row)
                .returning(UserRow::as_returning())
                .get_result(conn)?;
            Ok(User::from(stored))
        })
        .await
        .map_err(|e| e.with_operation("create_user"))
    }

    async fn get_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.with_conn(move |conn| {
            let row: Option<UserRow> = users::table
                .find(id.value())
                .select(UserRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(User::from))
        })
        .await
    }

    async fn get_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let email = email.trim().to_lowercase();
        self.with_conn(move |conn| {
            let row: Option<UserRow> = users::table
                .filter(users::email.eq(email))
                .select(UserRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(User::from))
        })
        .await
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            diesel::sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }
}
