pub mod admin;
pub mod auth;
pub mod booking;
pub mod public;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/api/admin/me", get(auth::whoami))
        .route("/api/admin/logout", post(auth::logout))
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route("/api/admin/bookings", get(admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/status",
            post(admin::update_booking_status),
        )
        .route(
            "/api/admin/blocked-dates",
            get(admin::get_blocked_dates).post(admin::add_blocked_date),
        )
        .route(
            "/api/admin/blocked-dates/:id",
            delete(admin::remove_blocked_date),
        )
        .route(
            "/api/admin/services",
            get(admin::get_services).post(admin::create_service),
        )
        .route(
            "/api/admin/services/:id",
            put(admin::update_service).delete(admin::delete_service),
        )
        .route(
            "/api/admin/settings",
            get(admin::get_settings).post(admin::update_settings),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/health", get(public::health))
        .route(
            "/booking",
            get(booking::booking_page).post(booking::submit_booking),
        )
        .route("/api/services", get(public::list_services))
        .route("/api/blocked-dates", get(public::list_blocked_dates))
        .route("/api/setup-admin", post(auth::setup_admin))
        .route("/api/admin/login", post(auth::login))
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
