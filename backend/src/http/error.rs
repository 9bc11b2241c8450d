//! HTTP error handling and response types.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::{AssistantError, AuthError, BookingError, ServiceError};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request (body, query or path)
    BadRequest(String),
    /// Booking rule violation
    Booking(BookingError),
    /// Storage failure
    Repository(RepositoryError),
    /// Authentication or authorization failure
    Auth(AuthError),
    /// Chat gateway failure
    Assistant(AssistantError),
}

fn booking_status(err: &BookingError) -> StatusCode {
    match err {
        BookingError::InvalidSlot { .. }
        | BookingError::UnknownCourt { .. }
        | BookingError::SlotInPast { .. }
        | BookingError::AdvanceNotice { .. } => StatusCode::BAD_REQUEST,
        BookingError::SlotAlreadyBooked { .. }
        | BookingError::InvalidTransition(_)
        | BookingError::CourtUnavailable { .. } => StatusCode::CONFLICT,
        BookingError::CancellationWindow { .. } => StatusCode::FORBIDDEN,
        BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
    }
}

fn repository_response(err: RepositoryError) -> (StatusCode, ApiError) {
    if err.is_not_found() {
        let message = match err {
            RepositoryError::NotFound { message, .. } => message,
            other => other.to_string(),
        };
        return (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message));
    }
    if err.is_conflict() {
        return (
            StatusCode::CONFLICT,
            ApiError::new("CONFLICT", "the resource already exists"),
        );
    }
    tracing::error!(error = %err, "repository failure");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ApiError::new("REPOSITORY_ERROR", "storage is temporarily unavailable"),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg)),
            AppError::Booking(e) => (booking_status(&e), ApiError::new(e.code(), e.to_string())),
            AppError::Repository(e) => repository_response(e),
            AppError::Auth(e) => match e {
                AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::InvalidToken => {
                    (StatusCode::UNAUTHORIZED, ApiError::new("UNAUTHORIZED", e.to_string()))
                }
                AuthError::Forbidden(_) => {
                    (StatusCode::FORBIDDEN, ApiError::new("FORBIDDEN", e.to_string()))
                }
                AuthError::Validation(details) => (
                    StatusCode::BAD_REQUEST,
                    ApiError::new("BAD_REQUEST", "invalid registration data").with_details(details),
                ),
                AuthError::EmailTaken => (StatusCode::CONFLICT, ApiError::new("CONFLICT", e.to_string())),
                AuthError::Repository(e) => repository_response(e),
                AuthError::Hashing(_) | AuthError::Signing(_) => {
                    tracing::error!(error = %e, "credential processing failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("INTERNAL_ERROR", "internal error"),
                    )
                }
            },
            AppError::Assistant(e) => match e {
                AssistantError::EmptyConversation => {
                    (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", e.to_string()))
                }
                AssistantError::RateLimited => (
                    StatusCode::TOO_MANY_REQUESTS,
                    ApiError::new("UPSTREAM_RATE_LIMITED", e.to_string()),
                ),
                AssistantError::PaymentRequired => (
                    StatusCode::PAYMENT_REQUIRED,
                    ApiError::new("UPSTREAM_PAYMENT_REQUIRED", e.to_string()),
                ),
                AssistantError::MissingApiKey => {
                    tracing::error!("chat requested but no assistant API key is configured");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("UPSTREAM_NOT_CONFIGURED", e.to_string()),
                    )
                }
                AssistantError::Gateway { .. } | AssistantError::Transport(_) => {
                    tracing::error!(error = %e, "chat gateway failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("UPSTREAM_ERROR", "AI gateway error"),
                    )
                }
            },
        };

        (status, Json(error)).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError::Booking(err)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Booking(e) => AppError::Booking(e),
            ServiceError::Repository(e) => AppError::Repository(e),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        AppError::Assistant(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
