//! API service routes

use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{delete, get, put},
};
use serde_json::json;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::{middleware::session_middleware, state::AppState};

pub mod account;
pub mod bookings;
pub mod facilities;
pub mod payments;
pub mod users;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let timeout = state.settings.request_timeout();

    let protected_routes = Router::new()
        .route(
            "/facilities",
            get(facilities::list_facilities).post(facilities::create_facility),
        )
        .route(
            "/facilities/:id",
            get(facilities::get_facility)
                .put(facilities::update_facility)
                .delete(facilities::delete_facility),
        )
        .route("/facilities/:id/slots", get(facilities::facility_slots))
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/bookings/:id", delete(bookings::delete_booking))
        .route("/bookings/:id/status", put(bookings::update_booking_status))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/:id", delete(users::delete_user))
        .route("/users/:id/roles", put(users::assign_role))
        .route("/roles", get(users::list_roles))
        .route(
            "/account",
            get(account::get_account).put(account::update_account),
        )
        .route("/payments", get(payments::list_payments))
        .route("/payments/:id/paid", put(payments::mark_paid))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}
