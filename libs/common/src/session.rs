//! Session management backed by the session table
//!
//! The mediator turns the opaque token carried by the session cookie into a
//! [`SessionProfile`], and slides the expiry window forward for active users.

use chrono::{DateTime, Duration, Utc};
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{DomainError, DomainResult};
use crate::models::{Session, SessionProfile};
use crate::repositories::SessionStore;

pub use crate::policy::require_role;

/// Name of the HTTP-only cookie carrying the session token
pub const SESSION_COOKIE_NAME: &str = "session";

/// Lifetime and sliding-renewal rules
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub lifetime: Duration,
    /// Fraction of `lifetime` below which a session gets renewed
    pub renewal_threshold: f64,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            lifetime: Duration::hours(24),
            renewal_threshold: 0.25,
        }
    }
}

impl SessionPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            lifetime: settings.session_lifetime(),
            renewal_threshold: settings.session_renewal_threshold,
        }
    }

    /// True when less than `renewal_threshold * lifetime` remains
    pub fn needs_renewal(&self, active_until: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let threshold_ms = self.lifetime.num_milliseconds() as f64 * self.renewal_threshold;
        let remaining_ms = (active_until - now).num_milliseconds() as f64;
        remaining_ms < threshold_ms
    }
}

/// 256 random bits, lowercase hex
pub fn generate_session_token() -> String {
    let bytes: [u8; 32] = rand::random();
    bytes.iter().fold(String::with_capacity(64), |mut token, byte| {
        let _ = write!(token, "{byte:02x}");
        token
    })
}

/// Session manager for handling user sessions
#[derive(Clone)]
pub struct SessionMediator {
    store: Arc<dyn SessionStore>,
    policy: SessionPolicy,
}

impl SessionMediator {
    /// Create a new session mediator
    pub fn new(store: Arc<dyn SessionStore>, policy: SessionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Create a new session for a user
    pub async fn start_session(&self, user_id: Uuid, now: DateTime<Utc>) -> DomainResult<Session> {
        info!("Creating session for user: {}", user_id);

        let session = Session {
            id: generate_session_token(),
            user_id,
            active_from: now,
            active_until: now + self.policy.lifetime,
        };
        self.store.insert_session(&session).await?;

        Ok(session)
    }

    /// Look up an active session. Expired and unknown tokens both yield `None`.
    pub async fn resolve_session(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<SessionProfile>> {
        Ok(self.store.find_active(token, now).await?)
    }

    /// Resolve the token or fail with `Unauthenticated`, renewing the
    /// session when it is close to expiring
    pub async fn resolve_session_or_fail(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> DomainResult<SessionProfile> {
        let token = token.ok_or(DomainError::Unauthenticated)?;

        let mut session = self
            .resolve_session(token, now)
            .await?
            .ok_or(DomainError::Unauthenticated)?;

        if let Some(active_until) = self.renew_if_needed(&session, now).await? {
            session.active_until = active_until;
        }

        Ok(session)
    }

    /// Extend the session to `now + lifetime` when it is inside the renewal
    /// window. Returns the new expiry when a renewal happened.
    pub async fn renew_if_needed(
        &self,
        session: &SessionProfile,
        now: DateTime<Utc>,
    ) -> DomainResult<Option<DateTime<Utc>>> {
        if !self.policy.needs_renewal(session.active_until, now) {
            return Ok(None);
        }

        let active_until = now + self.policy.lifetime;
        debug!("Renewing session for user {} until {}", session.user.id, active_until);
        self.store.extend_session(&session.id, active_until).await?;

        Ok(Some(active_until))
    }

    /// Delete a session. Unknown tokens are not an error.
    pub async fn stop_session(&self, token: &str) -> DomainResult<()> {
        if self.store.delete_session(token).await? {
            info!("Session stopped");
        } else {
            debug!("Sign-out for a session that no longer exists");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ADMIN_ROLE, NewUser};
    use crate::repositories::{MemoryStore, UserStore};
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
    }

    async fn setup() -> (MemoryStore, SessionMediator, Uuid) {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                email: "admin@admin.com".to_string(),
                name: "Admin admin".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        store.assign_role(user.id, ADMIN_ROLE).await.unwrap();

        let mediator = SessionMediator::new(Arc::new(store.clone()), SessionPolicy::default());
        (store, mediator, user.id)
    }

    #[test]
    fn tokens_are_64_hex_characters() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(token, generate_session_token());
    }

    #[test]
    fn renewal_only_inside_the_threshold() {
        let policy = SessionPolicy::default();
        let now = noon();

        assert!(!policy.needs_renewal(now + Duration::hours(24), now));
        assert!(!policy.needs_renewal(now + Duration::hours(6), now));
        assert!(policy.needs_renewal(now + Duration::hours(6) - Duration::seconds(1), now));
        assert!(policy.needs_renewal(now + Duration::minutes(5), now));
    }

    #[tokio::test]
    async fn started_sessions_carry_the_full_lifetime() {
        let (_, mediator, user_id) = setup().await;

        let session = mediator.start_session(user_id, noon()).await.unwrap();
        assert_eq!(session.active_from, noon());
        assert_eq!(session.active_until, noon() + Duration::hours(24));

        let profile = mediator
            .resolve_session(&session.id, noon())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.user.id, user_id);
        assert!(profile.user.has_role(ADMIN_ROLE));
    }

    #[tokio::test]
    async fn sessions_resolve_strictly_before_expiry() {
        let (_, mediator, user_id) = setup().await;
        let session = mediator.start_session(user_id, noon()).await.unwrap();
        let expiry = session.active_until;

        let just_before = expiry - Duration::milliseconds(1);
        assert!(mediator.resolve_session(&session.id, just_before).await.unwrap().is_some());
        assert!(mediator.resolve_session(&session.id, expiry).await.unwrap().is_none());
        assert!(
            mediator
                .resolve_session(&session.id, expiry + Duration::hours(1))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn missing_or_expired_tokens_are_unauthenticated() {
        let (_, mediator, user_id) = setup().await;
        let session = mediator.start_session(user_id, noon()).await.unwrap();

        for (token, at) in [
            (None, noon()),
            (Some("not-a-session"), noon()),
            (Some(session.id.as_str()), session.active_until),
        ] {
            let err = mediator.resolve_session_or_fail(token, at).await.unwrap_err();
            assert!(matches!(err, DomainError::Unauthenticated));
        }
    }

    #[tokio::test]
    async fn fresh_sessions_are_not_renewed() {
        let (_, mediator, user_id) = setup().await;
        let session = mediator.start_session(user_id, noon()).await.unwrap();

        let later = noon() + Duration::hours(1);
        let profile = mediator
            .resolve_session_or_fail(Some(&session.id), later)
            .await
            .unwrap();
        assert_eq!(profile.active_until, session.active_until);
    }

    #[tokio::test]
    async fn sessions_near_expiry_slide_forward() {
        let (_, mediator, user_id) = setup().await;
        let session = mediator.start_session(user_id, noon()).await.unwrap();

        let late = session.active_until - Duration::hours(1);
        let profile = mediator
            .resolve_session_or_fail(Some(&session.id), late)
            .await
            .unwrap();
        assert_eq!(profile.active_until, late + Duration::hours(24));

        // The renewed expiry is persisted, not just reported
        let after_old_expiry = session.active_until + Duration::hours(1);
        assert!(
            mediator
                .resolve_session(&session.id, after_old_expiry)
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn stopping_twice_is_fine() {
        let (_, mediator, user_id) = setup().await;
        let session = mediator.start_session(user_id, noon()).await.unwrap();

        mediator.stop_session(&session.id).await.unwrap();
        mediator.stop_session(&session.id).await.unwrap();
        assert!(mediator.resolve_session(&session.id, noon()).await.unwrap().is_none());
    }
}
