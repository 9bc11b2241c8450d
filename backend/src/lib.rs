//! # Court Booking Backend
//!
//! Booking engine and REST API for a tennis club's courts.
//!
//! The core is the [`services::AvailabilityResolver`]: given a court, a day,
//! the existing bookings and the current club-local time, it decides which
//! one-hour slots are available, booked or already past, and whether a
//! booking or cancellation request is allowed under the club policy.
//!
//! ## Architecture
//!
//! - [`api`]: identifier newtypes and the domain types shared across layers
//! - [`models`]: courts, bookings, users, the slot grid and time handling
//! - [`services`]: availability rules, booking workflows, accounts and the chat assistant
//! - [`db`]: repository traits with in-memory and PostgreSQL backends
//! - [`config`]: TOML club configuration with environment overrides
//! - [`http`]: axum server exposing the services over JSON
//!
//! ## Example
//!
//! ```
//! use chrono::{NaiveDate, NaiveTime};
//! use court_booking::api::CourtId;
//! use court_booking::services::{AvailabilityResolver, BookingPolicy};
//! use court_booking::models::SlotGrid;
//!
//! let resolver = AvailabilityResolver::new(SlotGrid::default(), BookingPolicy::permissive());
//! let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
//! let now = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! let view = resolver.compute_availability(CourtId::new(1), date, &[], now);
//! assert_eq!(view.slots.len(), 14);
//! assert_eq!(view.slots[0].start_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
//! ```

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
