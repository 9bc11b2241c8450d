//! Service layer for business logic and orchestration.
//!
//! Services sit between the HTTP handlers and the repository. The booking
//! rules themselves live in [`availability`] and are pure; [`bookings`] wires
//! them to storage.

pub mod assistant;
pub mod auth;
pub mod availability;
pub mod bookings;


pub use assistant::{
    build_system_prompt, AssistantError, AssistantSettings, ChatProxy, ClubProfile, Rate,
};
pub use auth::{AuthError, AuthService, AuthSettings, Claims};
pub use availability::{AvailabilityResolver, BookingError, BookingPolicy};
pub use bookings::{ServiceError, ServiceResult};
