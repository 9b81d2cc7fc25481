//! Session middleware resolving the session cookie

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use booking_common::{error::DomainError, session::SESSION_COOKIE_NAME};
use chrono::Utc;

use crate::{error::ApiError, state::AppState};

fn wants_html(req: &Request) -> bool {
    req.headers()
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Resolve the session, renewing it when close to expiry, and expose the
/// `SessionProfile` to handlers through the request extensions
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = jar.get(SESSION_COOKIE_NAME).map(|cookie| cookie.value());

    let session = match state.sessions.resolve_session_or_fail(token, Utc::now()).await {
        Ok(session) => session,
        Err(DomainError::Unauthenticated) => {
            return Err(ApiError::Unauthorized {
                wants_html: wants_html(&req),
            });
        }
        Err(err) => return Err(err.into()),
    };

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
