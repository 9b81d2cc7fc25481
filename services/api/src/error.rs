//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use booking_common::{
    error::{DatabaseError, DomainError},
    validation::ActionFailure,
};
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// No valid session; browsers get sent to the sign-in page
    #[error("Unauthorized")]
    Unauthorized { wants_html: bool },

    /// Rejected input, re-displayed with the submitted values
    #[error("Invalid input: {source}")]
    Form {
        source: DomainError,
        submitted: serde_json::Value,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    pub fn with_submitted(err: DomainError, submitted: serde_json::Value) -> Self {
        ApiError::Form {
            source: err,
            submitted,
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Domain(err.into())
    }
}

fn failure_for(err: DomainError) -> (StatusCode, ActionFailure) {
    match err {
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
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized { wants_html: true } => Redirect::to("/signin").into_response(),
            ApiError::Unauthorized { wants_html: false } => {
                let (status, failure) = failure_for(DomainError::Unauthenticated);
                (status, Json(failure)).into_response()
            }
            ApiError::Form { source, submitted } => {
                let (status, failure) = failure_for(source);
                (status, Json(failure.with_submitted(submitted))).into_response()
            }
            ApiError::Domain(err) => {
                let (status, failure) = failure_for(err);
                (status, Json(failure)).into_response()
            }
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use booking_common::policy::Capability;

    #[test]
    fn forbidden_is_never_a_redirect() {
        let response = ApiError::from(DomainError::Forbidden(Capability::ManageFacilities))
            .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::LOCATION).is_none());
    }

    #[test]
    fn unauthenticated_browsers_are_redirected() {
        let response = ApiError::Unauthorized { wants_html: true }.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/signin");

        let response = ApiError::Unauthorized { wants_html: false }.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn database_failures_hide_details() {
        let response = ApiError::from(DatabaseError::Configuration("secret".to_string()))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
