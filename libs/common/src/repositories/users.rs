//! User repository for database operations

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::UserStore;
use crate::error::DatabaseResult;
use crate::models::{DEFAULT_ROLE, NewUser, Profile, Role, UpdateProfile, User};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn roles_of(&self, user_id: Uuid) -> DatabaseResult<Vec<Role>> {
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

        Ok(roles)
    }

    async fn profile_from_row(&self, row: &PgRow) -> DatabaseResult<Profile> {
        let id: Uuid = row.get("id");
        Ok(Profile {
            id,
            email: row.get("email"),
            name: row.get("name"),
            roles: self.roles_of(id).await?,
        })
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create_user(&self, new_user: NewUser) -> DatabaseResult<Profile> {
        info!("Creating new user: {}", new_user.email);

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name
            "#,
        )
        .bind(&new_user.email)
        .bind(&new_user.name)
        .bind(&new_user.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let id: Uuid = row.get("id");

        // Roles are seeded by the migrations, so the default role always exists
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT $1, id FROM roles WHERE name = $2
            RETURNING role_id AS id, $2 AS name
            "#,
        )
        .bind(id)
        .bind(DEFAULT_ROLE)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Profile {
            id,
            email: row.get("email"),
            name: row.get("name"),
            roles: role.into_iter().collect(),
        })
    }

    async fn list_users(&self) -> DatabaseResult<Vec<Profile>> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, name
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in &rows {
            users.push(self.profile_from_row(row).await?);
        }

        Ok(users)
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        info!("Finding user by email: {}", email);

        let row = sqlx::query(
            r#"
            SELECT id, email, name, password_hash
            FROM users
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let id: Uuid = row.get("id");
                Ok(Some(User {
                    id,
                    email: row.get("email"),
                    name: row.get("name"),
                    password_hash: row.get("password_hash"),
                    roles: self.roles_of(id).await?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn find_profile(&self, id: Uuid) -> DatabaseResult<Option<Profile>> {
        let row = sqlx::query("SELECT id, email, name FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.profile_from_row(&row).await?)),
            None => Ok(None),
        }
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: UpdateProfile,
    ) -> DatabaseResult<Option<Profile>> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                updated_at = now()
            WHERE id = $1
            RETURNING id, email, name
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.profile_from_row(&row).await?)),
            None => Ok(None),
        }
    }

    async fn assign_role(&self, user_id: Uuid, role_name: &str) -> DatabaseResult<Option<Profile>> {
        info!("Assigning role {} to user {}", role_name, user_id);

        let linked = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            SELECT u.id, r.id
            FROM users u, roles r
            WHERE u.id = $1 AND r.name = $2
            ON CONFLICT (user_id, role_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_name)
        .execute(&self.pool)
        .await?;

        if linked.rows_affected() == 0 {
            // Either already held, or the user/role does not exist
            let role_exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM roles WHERE name = $1)")
                    .bind(role_name)
                    .fetch_one(&self.pool)
                    .await?;
            if !role_exists {
                return Ok(None);
            }
        }

        self.find_profile(user_id).await
    }

    async fn delete_user(&self, id: Uuid) -> DatabaseResult<bool> {
        info!("Deleting user: {}", id);

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM bookings WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(deleted.rows_affected() > 0)
    }

    async fn list_roles(&self) -> DatabaseResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }
}
