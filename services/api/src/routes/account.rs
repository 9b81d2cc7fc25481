//! The signed-in user's own profile

use axum::{Extension, Json, extract::State};
use booking_common::{
    error::{DatabaseError, DomainError},
    models::{Profile, SessionProfile, UpdateProfile},
    repositories::USER_EMAIL_CONSTRAINT,
    validation::{FieldErrors, check_email, check_min_length, normalize_email},
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: String,
    pub email: String,
}

pub async fn get_account(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
) -> ApiResult<Json<Profile>> {
    let profile = state
        .users
        .find_profile(session.user.id)
        .await?
        .ok_or_else(|| DomainError::not_found("User"))?;

    Ok(Json(profile))
}

pub async fn update_account(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
    Json(request): Json<UpdateAccountRequest>,
) -> ApiResult<Json<Profile>> {
    let submitted = json!({ "name": request.name, "email": request.email });

    let mut errors = FieldErrors::default();
    check_min_length(&mut errors, "name", "name", &request.name, 2);
    check_email(&mut errors, &request.email);
    errors
        .into_result()
        .map_err(|err| ApiError::with_submitted(err, submitted.clone()))?;

    let changes = UpdateProfile {
        name: Some(request.name.trim().to_string()),
        email: Some(normalize_email(&request.email)),
    };

    let profile = state
        .users
        .update_profile(session.user.id, changes)
        .await
        .map_err(|err| match err {
            DatabaseError::UniqueViolation(constraint) if constraint == USER_EMAIL_CONSTRAINT => {
                ApiError::with_submitted(
                    DomainError::invalid("email", "This email is already in use"),
                    submitted,
                )
            }
            other => other.into(),
        })?
        .ok_or_else(|| DomainError::not_found("User"))?;

    Ok(Json(profile))
}
