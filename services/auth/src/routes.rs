//! Authentication service routes

use axum::{
    Form, Json, Router,
    extract::State,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use booking_common::{
    error::{DatabaseError, DomainError},
    models::{NewUser, Session, SessionProfile},
    password::{hash_password_blocking, verify_password_blocking},
    repositories::USER_EMAIL_CONSTRAINT,
    session::SESSION_COOKIE_NAME,
    validation::{FieldErrors, check_email, normalize_email, validate_new_user},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    error::AuthError,
    state::AppState,
};

/// Form for signing in
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Form for creating an account
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirmation: String,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let timeout = state.settings.request_timeout();

    Router::new()
        .route("/health", get(health_check))
        .route("/signin", post(sign_in))
        .route("/register", post(register))
        .route("/signout", post(sign_out))
        .route("/session", get(current_session))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

fn session_cookie(session: &Session, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session.id.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

async fn start_session(
    state: &AppState,
    jar: CookieJar,
    user_id: uuid::Uuid,
) -> Result<(CookieJar, Redirect), AuthError> {
    let session = state.sessions.start_session(user_id, Utc::now()).await?;
    let jar = jar.add(session_cookie(&session, state.settings.secure_cookies));
    Ok((jar, Redirect::to("/home")))
}

/// Sign in with email and password
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignInForm>,
) -> Result<(CookieJar, Redirect), AuthError> {
    let submitted = json!({ "email": form.email });

    let mut errors = FieldErrors::default();
    check_email(&mut errors, &form.email);
    if form.password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors
        .into_result()
        .map_err(|err| AuthError::with_submitted(err, submitted))?;

    if state.throttle.is_banned(&form.email).await {
        return Err(AuthError::TooManyAttempts { email: form.email });
    }

    let user = state
        .users
        .find_by_email(&normalize_email(&form.email))
        .await
        .map_err(DomainError::from)?;

    // Unknown emails and wrong passwords must be indistinguishable, in body and in cost
    let stored_hash = user.as_ref().map(|user| user.password_hash.clone());
    let verified = verify_password_blocking(stored_hash, form.password).await;
    let user = match user {
        Some(user) if verified => user,
        _ => {
            state.throttle.record_failure(&form.email).await;
            return Err(AuthError::InvalidCredentials { email: form.email });
        }
    };

    state.throttle.reset(&form.email).await;
    info!("User {} signed in", user.id);

    start_session(&state, jar, user.id).await
}

/// Create an account holding the default role and sign it in
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<(CookieJar, Redirect), AuthError> {
    let submitted = json!({ "email": form.email, "name": form.name });

    validate_new_user(&form.email, &form.name, &form.password, &form.password_confirmation)
        .map_err(|err| AuthError::with_submitted(err, submitted.clone()))?;

    let password_hash = hash_password_blocking(form.password).await?;

    let profile = state
        .users
        .create_user(NewUser {
            email: normalize_email(&form.email),
            name: form.name.trim().to_string(),
            password_hash,
        })
        .await
        .map_err(|err| match err {
            DatabaseError::UniqueViolation(constraint) if constraint == USER_EMAIL_CONSTRAINT => {
                AuthError::with_submitted(
                    DomainError::invalid("email", "An account with this email already exists"),
                    submitted,
                )
            }
            other => AuthError::Domain(other.into()),
        })?;

    info!("Registered user {}", profile.id);

    start_session(&state, jar, profile.id).await
}

/// Sign out; succeeds whether or not the session still exists
pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect), AuthError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        state.sessions.stop_session(cookie.value()).await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/"));
    Ok((jar, Redirect::to("/signin")))
}

/// Profile behind the session cookie
pub async fn current_session(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<SessionProfile>, AuthError> {
    let token = jar.get(SESSION_COOKIE_NAME).map(|cookie| cookie.value());
    let profile = state
        .sessions
        .resolve_session_or_fail(token, Utc::now())
        .await?;

    Ok(Json(profile))
}
