//! Data Transfer Objects for the HTTP API.
//!
//! Domain types that already serialize the way clients expect (bookings,
//! courts, availability views) are returned as-is; this module only adds the
//! request shapes and small response envelopes.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub use crate::api::{AvailabilityView, Booking, BookingStatus, Court, CourtId, SlotView, User};
pub use crate::services::assistant::{ChatMessage, ChatRole};
pub use crate::services::auth::{LoginRequest, RegisterRequest, Session};
use crate::models::time::hhmm;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub court: CourtId,
    pub date: NaiveDate,
}

/// Body of `POST /v1/bookings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub court: CourtId,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
    pub total: usize,
}

impl From<Vec<Booking>> for BookingListResponse {
    fn from(bookings: Vec<Booking>) -> Self {
        let total = bookings.len();
        Self { bookings, total }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourtListResponse {
    pub courts: Vec<Court>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

/// Body of `PUT /v1/admin/bookings/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: User,
}

/// Body of `POST /v1/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}
