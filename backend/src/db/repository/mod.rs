//! Repository trait definitions for database operations.
//!
//! Storage is split across focused traits so that services only depend on
//! what they use:
//!
//! - [`court`]: read access to the configured courts
//! - [`booking`]: booking persistence, including the atomic slot claim
//! - [`user`]: accounts and the connectivity probe
//! - [`error`]: error types shared by every implementation
//!
//! # Convenience Trait Bound
//!
//! Code that needs everything (the HTTP state, the factory) uses
//! [`FullRepository`]:
//!
//! ```ignore
//! async fn book<R: FullRepository + ?Sized>(repo: &R, new: NewBooking) -> RepositoryResult<Booking> {
//!     repo.get_court(new.court_id).await?;
//!     repo.insert_booking(new).await
//! }
//! ```

pub mod booking;
pub mod court;
pub mod error;
pub mod user;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use booking::BookingRepository;
pub use court::CourtRepository;
pub use user::UserRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Implemented automatically for any type that implements all three
/// repository traits.
pub trait FullRepository: CourtRepository + BookingRepository + UserRepository {}

impl<T> FullRepository for T where T: CourtRepository + BookingRepository + UserRepository {}
