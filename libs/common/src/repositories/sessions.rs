//! Session repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::SessionStore;
use crate::error::DatabaseResult;
use crate::models::{Profile, Role, Session, SessionProfile};

/// Session repository for database operations
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn insert_session(&self, session: &Session) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, active_from, active_until)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(session.active_from)
        .bind(session.active_until)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_active(
        &self,
        id: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<SessionProfile>> {
        let row = sqlx::query(
            r#"
            SELECT s.id, s.active_until, u.id AS user_id, u.email, u.name
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1 AND s.active_until > $2
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user_id: Uuid = row.get("user_id");
        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.name
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(SessionProfile {
            id: row.get("id"),
            active_until: row.get("active_until"),
            user: Profile {
                id: user_id,
                email: row.get("email"),
                name: row.get("name"),
                roles,
            },
        }))
    }

    async fn extend_session(&self, id: &str, active_until: DateTime<Utc>) -> DatabaseResult<()> {
        sqlx::query("UPDATE sessions SET active_until = $2 WHERE id = $1")
            .bind(id)
            .bind(active_until)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_session(&self, id: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
