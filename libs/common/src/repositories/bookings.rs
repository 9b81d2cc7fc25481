//! Booking repository for database operations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use super::BookingStore;
use crate::error::{DatabaseError, DatabaseResult};
use crate::models::{
    Booking, BookingDetails, BookingFacility, BookingStatus, BookingUser, NewBooking,
};

#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_from_row(row: &PgRow) -> DatabaseResult<BookingStatus> {
    let raw: String = row.get("status");
    raw.parse()
        .map_err(|e: String| DatabaseError::Query(sqlx::Error::Decode(e.into())))
}

fn booking_from_row(row: &PgRow) -> DatabaseResult<Booking> {
    Ok(Booking {
        id: row.get("id"),
        user_id: row.get("user_id"),
        facility_id: row.get("facility_id"),
        date: row.get("date"),
        status: status_from_row(row)?,
    })
}

fn details_from_row(row: &PgRow) -> DatabaseResult<BookingDetails> {
    Ok(BookingDetails {
        id: row.get("id"),
        date: row.get("date"),
        status: status_from_row(row)?,
        facility: BookingFacility {
            id: row.get("facility_id"),
            name: row.get("facility_name"),
        },
        user: BookingUser {
            id: row.get("user_id"),
            name: row.get("user_name"),
            email: row.get("user_email"),
        },
    })
}

#[async_trait]
impl BookingStore for BookingRepository {
    async fn insert_booking(&self, booking: NewBooking) -> DatabaseResult<BookingDetails> {
        info!(
            "Inserting booking for facility {} at {}",
            booking.facility_id, booking.date
        );

        // The partial unique index on (facility_id, date) makes this the
        // single arbiter between concurrent requests for one slot.
        let row = sqlx::query(
            r#"
            WITH inserted AS (
                INSERT INTO bookings (user_id, facility_id, date, status)
                VALUES ($1, $2, $3, $4)
                RETURNING id, user_id, facility_id, date, status
            )
            SELECT i.id, i.date, i.status,
                   f.id AS facility_id, f.name AS facility_name,
                   u.id AS user_id, u.name AS user_name, u.email AS user_email
            FROM inserted i
            JOIN facilities f ON f.id = i.facility_id
            JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(booking.user_id)
        .bind(booking.facility_id)
        .bind(booking.date)
        .bind(BookingStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        details_from_row(&row)
    }

    async fn bookings_for_facility(
        &self,
        facility_id: Uuid,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DatabaseResult<Vec<Booking>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, facility_id, date, status
            FROM bookings
            WHERE facility_id = $1 AND date >= $2 AND date < $3
            ORDER BY date
            "#,
        )
        .bind(facility_id)
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(booking_from_row).collect()
    }

    async fn bookings_for_user(&self, user_id: Uuid) -> DatabaseResult<Vec<BookingDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.date, b.status,
                   f.id AS facility_id, f.name AS facility_name,
                   u.id AS user_id, u.name AS user_name, u.email AS user_email
            FROM bookings b
            JOIN facilities f ON f.id = b.facility_id
            JOIN users u ON u.id = b.user_id
            WHERE b.user_id = $1
            ORDER BY b.date
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(details_from_row).collect()
    }

    async fn find_booking(&self, id: Uuid) -> DatabaseResult<Option<Booking>> {
        let row = sqlx::query(
            "SELECT id, user_id, facility_id, date, status FROM bookings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> DatabaseResult<Option<Booking>> {
        let row = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $2
            WHERE id = $1
            RETURNING id, user_id, facility_id, date, status
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(booking_from_row).transpose()
    }

    async fn delete_booking(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
