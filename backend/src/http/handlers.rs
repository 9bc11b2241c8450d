//! HTTP handlers for the REST API.
//!
//! Handlers parse the request, read "now" from the state's clock and delegate
//! to the service layer. Extraction failures are turned into [`AppError`] so
//! every error response has the same JSON shape.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, rejection::PathRejection, rejection::QueryRejection},
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::auth::{AdminUser, AuthUser};
use super::dto::{
    AvailabilityQuery, BookingListResponse, ChatRequest, CourtListResponse, CreateBookingRequest,
    DateQuery, HealthResponse, LoginRequest, MeResponse, RegisterRequest, Session,
    UpdateStatusRequest,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{AvailabilityView, Booking, BookingId};
use crate::services::bookings;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = if bookings::health_check(state.repository.as_ref()).await {
        "connected"
    } else {
        "disconnected"
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    })
}

// =============================================================================
// Accounts
// =============================================================================

/// POST /v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Session>), AppError> {
    let Json(request) = payload?;
    let session = state.auth.register(state.repository.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> HandlerResult<Session> {
    let Json(request) = payload?;
    let session = state.auth.login(state.repository.as_ref(), request).await?;
    Ok(Json(session))
}

/// GET /v1/auth/me
pub async fn me(State(state): State<AppState>, user: AuthUser) -> HandlerResult<MeResponse> {
    let user = state
        .auth
        .current_user(state.repository.as_ref(), user.id)
        .await?;
    Ok(Json(MeResponse { user }))
}

// =============================================================================
// Courts & availability
// =============================================================================

/// GET /v1/courts
pub async fn list_courts(State(state): State<AppState>) -> HandlerResult<CourtListResponse> {
    let courts = bookings::list_courts(state.repository.as_ref()).await?;
    Ok(Json(CourtListResponse { courts }))
}

/// GET /v1/availability?court=&date=
///
/// Slot states for one court and day. Needs no authentication.
pub async fn get_availability(
    State(state): State<AppState>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> HandlerResult<AvailabilityView> {
    let Query(query) = query?;
    let view = bookings::availability(
        state.repository.as_ref(),
        &state.resolver,
        query.court,
        query.date,
        state.now(),
    )
    .await?;
    Ok(Json(view))
}

// =============================================================================
// Bookings
// =============================================================================

/// GET /v1/bookings
pub async fn list_my_bookings(
    State(state): State<AppState>,
    user: AuthUser,
) -> HandlerResult<BookingListResponse> {
    let mine = bookings::list_user_bookings(state.repository.as_ref(), user.id).await?;
    Ok(Json(mine.into()))
}

/// POST /v1/bookings
pub async fn create_booking(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let Json(request) = payload?;
    let booking = bookings::create_booking(
        state.repository.as_ref(),
        &state.resolver,
        request.court,
        request.date,
        request.start_time,
        user.id,
        state.now(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// DELETE /v1/bookings/{id}
///
/// Soft cancel: the booking is kept with status `cancelled`.
pub async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthUser,
    id: Result<Path<i64>, PathRejection>,
) -> HandlerResult<Booking> {
    let Path(id) = id?;
    let booking = bookings::cancel_booking(
        state.repository.as_ref(),
        &state.resolver,
        BookingId::new(id),
        user.id,
        state.now(),
    )
    .await?;
    Ok(Json(booking))
}

// =============================================================================
// Administration
// =============================================================================

/// GET /v1/admin/bookings?date=
pub async fn admin_list_bookings(
    State(state): State<AppState>,
    _admin: AdminUser,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> HandlerResult<BookingListResponse> {
    let Query(query) = query?;
    let all = bookings::list_bookings_on(state.repository.as_ref(), query.date).await?;
    Ok(Json(all.into()))
}

/// PUT /v1/admin/bookings/{id}/status
pub async fn admin_update_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> HandlerResult<Booking> {
    let Path(id) = id?;
    let Json(request) = payload?;
    tracing::info!(admin = %admin.id, booking = id, status = %request.status, "admin status change");
    let booking =
        bookings::set_booking_status(state.repository.as_ref(), BookingId::new(id), request.status)
            .await?;
    Ok(Json(booking))
}

// =============================================================================
// Assistant
// =============================================================================

/// POST /v1/chat
///
/// Streams the gateway's `text/event-stream` response back to the client.
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload?;
    let stream = state.assistant.open_stream(&request.messages).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
