//! Error responses for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use booking_common::{error::DomainError, validation::ActionFailure};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Shown for unknown emails and wrong passwords alike
pub const INVALID_CREDENTIALS: &str =
    "No user found with the provided email/password combination.";

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials { email: String },

    #[error("Too many sign-in attempts")]
    TooManyAttempts { email: String },

    /// Rejected form, re-displayed with the non-password values
    #[error("Invalid form: {source}")]
    Form {
        source: DomainError,
        submitted: serde_json::Value,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AuthError {
    /// Attach the submitted values to a validation failure
    pub fn with_submitted(err: DomainError, submitted: serde_json::Value) -> Self {
        AuthError::Form {
            source: err,
            submitted,
        }
    }
}

fn domain_response(err: DomainError, submitted: Option<serde_json::Value>) -> Response {
    let attach = |failure: ActionFailure| match &submitted {
        Some(data) => failure.with_submitted(data.clone()),
        None => failure,
    };

    let (status, failure) = match err {
        DomainError::Validation(errors) => {
            (StatusCode::UNPROCESSABLE_ENTITY, ActionFailure::fields(errors))
        }
        DomainError::Unauthenticated => (
            StatusCode::UNAUTHORIZED,
            ActionFailure::message("Unauthenticated"),
        ),
        DomainError::Forbidden(capability) => (
            StatusCode::FORBIDDEN,
            ActionFailure::message(format!("You are not allowed to perform {capability}")),
        ),
        DomainError::NotFound(what) => (
            StatusCode::NOT_FOUND,
            ActionFailure::message(format!("{what} not found")),
        ),
        DomainError::Conflict(reason) => (StatusCode::CONFLICT, ActionFailure::message(reason)),
        err @ (DomainError::Internal(_) | DomainError::Database(_)) => {
            error!("Request failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ActionFailure::message("Internal server error"),
            )
        }
    };

    (status, Json(attach(failure))).into_response()
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::InvalidCredentials { email } => (
                StatusCode::BAD_REQUEST,
                Json(ActionFailure::message(INVALID_CREDENTIALS).with_submitted(json!({ "email": email }))),
            )
                .into_response(),
            AuthError::TooManyAttempts { email } => (
                StatusCode::TOO_MANY_REQUESTS,
                Json(
                    ActionFailure::message("Too many failed sign-in attempts, try again later.")
                        .with_submitted(json!({ "email": email })),
                ),
            )
                .into_response(),
            AuthError::Form { source, submitted } => domain_response(source, Some(submitted)),
            AuthError::Domain(err) => domain_response(err, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booking_common::error::DatabaseError;

    #[test]
    fn maps_domain_errors_to_status_codes() {
        let cases = [
            (DomainError::invalid("email", "Email is required"), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (DomainError::not_found("User"), StatusCode::NOT_FOUND),
            (DomainError::Conflict("taken".to_string()), StatusCode::CONFLICT),
            (
                DomainError::Database(DatabaseError::Migration("boom".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AuthError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn credential_failures_are_bad_requests() {
        let response = AuthError::InvalidCredentials {
            email: "user@user.com".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
