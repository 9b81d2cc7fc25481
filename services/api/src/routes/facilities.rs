//! Facility administration and slot availability

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use booking_common::{
    error::DomainError,
    models::{Facility, FacilityInput, SessionProfile},
    policy::{Capability, authorize},
    slots::{SlotAvailability, day_slots, day_window, offset_from_minutes},
    validation::validate_facility,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Query for a day's slots
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotQuery {
    pub date: NaiveDate,
    /// Viewer's offset east of UTC
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

fn validated(input: &FacilityInput) -> ApiResult<()> {
    validate_facility(&input.name, &input.kind, &input.location).map_err(|err| {
        ApiError::with_submitted(
            err,
            json!({ "name": input.name, "type": input.kind, "location": input.location }),
        )
    })
}

pub async fn list_facilities(State(state): State<AppState>) -> ApiResult<Json<Vec<Facility>>> {
    Ok(Json(state.facilities.list_facilities().await?))
}

pub async fn get_facility(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Facility>> {
    let facility = state
        .facilities
        .find_facility(id)
        .await?
        .ok_or_else(|| DomainError::not_found("Facility"))?;

    Ok(Json(facility))
}

pub async fn create_facility(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
    Json(input): Json<FacilityInput>,
) -> ApiResult<impl IntoResponse> {
    authorize(&session.user, Capability::ManageFacilities)?;
    validated(&input)?;

    let facility = state.facilities.create_facility(input).await?;
    info!("Facility {} created by {}", facility.id, session.user.id);

    Ok((StatusCode::CREATED, Json(facility)))
}

pub async fn update_facility(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
    Path(id): Path<Uuid>,
    Json(input): Json<FacilityInput>,
) -> ApiResult<Json<Facility>> {
    authorize(&session.user, Capability::ManageFacilities)?;
    validated(&input)?;

    let facility = state
        .facilities
        .update_facility(id, input)
        .await?
        .ok_or_else(|| DomainError::not_found("Facility"))?;

    Ok(Json(facility))
}

pub async fn delete_facility(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    authorize(&session.user, Capability::ManageFacilities)?;

    if !state.facilities.delete_facility(id).await? {
        return Err(DomainError::not_found("Facility").into());
    }

    info!("Facility {} deleted by {}", id, session.user.id);
    Ok(StatusCode::NO_CONTENT)
}

/// Availability of a facility's slots on one day, in the viewer's offset
pub async fn facility_slots(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> ApiResult<Json<Vec<SlotAvailability>>> {
    let offset = offset_from_minutes(query.utc_offset_minutes)?;

    if state.facilities.find_facility(id).await?.is_none() {
        return Err(DomainError::not_found("Facility").into());
    }

    let (from, until) = day_window(query.date, offset);
    let bookings = state.bookings.bookings_for_facility(id, from, until).await?;
    let slots = day_slots(query.date, offset, &bookings, id, Utc::now())?;

    Ok(Json(slots))
}
