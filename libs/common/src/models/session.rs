//! Session model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Profile;

/// Session entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Opaque token carried by the session cookie
    pub id: String,
    pub user_id: Uuid,
    pub active_from: DateTime<Utc>,
    pub active_until: DateTime<Utc>,
}

impl Session {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.active_until
    }
}

/// An active session joined with its owner's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProfile {
    pub id: String,
    pub active_until: DateTime<Utc>,
    pub user: Profile,
}
