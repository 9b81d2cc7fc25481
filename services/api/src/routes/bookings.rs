//! Booking endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use booking_common::{
    models::{Booking, BookingDetails, BookingStatus, SessionProfile},
    policy::{Capability, authorize},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiResult, state::AppState};

/// Request to book a slot
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub facility_id: Uuid,
    /// UTC start of the slot
    pub date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

/// Bookings of the signed-in user
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
) -> ApiResult<Json<Vec<BookingDetails>>> {
    let bookings = state.booking_service.bookings_for_user(session.user.id).await?;
    Ok(Json(bookings))
}

pub async fn create_booking(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
    Json(request): Json<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    let booking = state
        .booking_service
        .create_booking(request.facility_id, session.user.id, request.date, Utc::now())
        .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Booking>> {
    authorize(&session.user, Capability::ManageBookings)?;

    let booking = state
        .booking_service
        .update_booking_status(id, request.status)
        .await?;

    Ok(Json(booking))
}

pub async fn delete_booking(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.booking_service.delete_booking(&session.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
