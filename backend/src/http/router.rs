//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Create the main application router with all routes and middleware.
///
/// An empty `cors_origins` allows any origin.
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    let api_v1 = Router::new()
        // Accounts
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/me", get(handlers::me))
        // Courts and availability
        .route("/courts", get(handlers::list_courts))
        .route("/availability", get(handlers::get_availability))
        // Bookings
        .route(
            "/bookings",
            get(handlers::list_my_bookings).post(handlers::create_booking),
        )
        .route("/bookings/{id}", delete(handlers::cancel_booking))
        // Administration
        .route("/admin/bookings", get(handlers::admin_list_bookings))
        .route("/admin/bookings/{id}/status", put(handlers::admin_update_status))
        // Assistant
        .route("/chat", post(handlers::chat));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}
