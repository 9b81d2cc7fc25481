//! User and role administration

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use booking_common::{
    error::{DatabaseError, DomainError},
    models::{NewUser, Profile, Role, SessionProfile},
    password::hash_password_blocking,
    policy::{Capability, authorize},
    repositories::USER_EMAIL_CONSTRAINT,
    validation::{normalize_email, validate_new_user},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub role_name: String,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
) -> ApiResult<Json<Vec<Profile>>> {
    authorize(&session.user, Capability::ManageUsers)?;
    Ok(Json(state.users.list_users().await?))
}

/// Create a user holding the default role
pub async fn create_user(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    authorize(&session.user, Capability::ManageUsers)?;

    let submitted = json!({ "name": request.name, "email": request.email });
    validate_new_user(
        &request.email,
        &request.name,
        &request.password,
        &request.password_confirmation,
    )
    .map_err(|err| ApiError::with_submitted(err, submitted.clone()))?;

    let password_hash = hash_password_blocking(request.password).await?;
    let profile = state
        .users
        .create_user(NewUser {
            email: normalize_email(&request.email),
            name: request.name.trim().to_string(),
            password_hash,
        })
        .await
        .map_err(|err| match err {
            DatabaseError::UniqueViolation(constraint) if constraint == USER_EMAIL_CONSTRAINT => {
                ApiError::with_submitted(
                    DomainError::invalid("email", "An account with this email already exists"),
                    submitted,
                )
            }
            other => other.into(),
        })?;

    info!("User {} created by {}", profile.id, session.user.id);
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Delete a user together with their sessions and bookings
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    authorize(&session.user, Capability::ManageUsers)?;

    if !state.users.delete_user(id).await? {
        return Err(DomainError::not_found("User").into());
    }

    info!("User {} deleted by {}", id, session.user.id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_role(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
    Path(id): Path<Uuid>,
    Json(request): Json<AssignRoleRequest>,
) -> ApiResult<Json<Profile>> {
    authorize(&session.user, Capability::ManageUsers)?;

    if state.users.find_profile(id).await?.is_none() {
        return Err(DomainError::not_found("User").into());
    }

    let profile = state
        .users
        .assign_role(id, &request.role_name)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("Role {}", request.role_name)))?;

    info!("Role {} assigned to {}", request.role_name, id);
    Ok(Json(profile))
}

pub async fn list_roles(
    State(state): State<AppState>,
    Extension(session): Extension<SessionProfile>,
) -> ApiResult<Json<Vec<Role>>> {
    authorize(&session.user, Capability::ManageUsers)?;
    Ok(Json(state.users.list_roles().await?))
}
