//! Facility repository for database operations

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use super::FacilityStore;
use crate::error::DatabaseResult;
use crate::models::{Facility, FacilityInput};

#[derive(Clone)]
pub struct FacilityRepository {
    pool: PgPool,
}

impl FacilityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn facility_from_row(row: &PgRow) -> Facility {
    Facility {
        id: row.get("id"),
        name: row.get("name"),
        kind: row.get("type"),
        location: row.get("location"),
    }
}

#[async_trait]
impl FacilityStore for FacilityRepository {
    async fn create_facility(&self, input: FacilityInput) -> DatabaseResult<Facility> {
        let row = sqlx::query(
            r#"
            INSERT INTO facilities (name, type, location)
            VALUES ($1, $2, $3)
            RETURNING id, name, type, location
            "#,
        )
        .bind(&input.name)
        .bind(&input.kind)
        .bind(&input.location)
        .fetch_one(&self.pool)
        .await?;

        Ok(facility_from_row(&row))
    }

    async fn list_facilities(&self) -> DatabaseResult<Vec<Facility>> {
        let rows = sqlx::query("SELECT id, name, type, location FROM facilities ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(facility_from_row).collect())
    }

    async fn find_facility(&self, id: Uuid) -> DatabaseResult<Option<Facility>> {
        let row = sqlx::query("SELECT id, name, type, location FROM facilities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(facility_from_row))
    }

    async fn update_facility(
        &self,
        id: Uuid,
        input: FacilityInput,
    ) -> DatabaseResult<Option<Facility>> {
        let row = sqlx::query(
            r#"
            UPDATE facilities
            SET name = $2, type = $3, location = $4
            WHERE id = $1
            RETURNING id, name, type, location
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.kind)
        .bind(&input.location)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(facility_from_row))
    }

    async fn delete_facility(&self, id: Uuid) -> DatabaseResult<bool> {
        // bookings follow through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM facilities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
